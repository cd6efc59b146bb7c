//! Nelder–Mead downhill simplex minimization.
//!
//! Standard coefficients (reflection 1, expansion 2, contraction 0.5,
//! shrink 0.5). The initial simplex displaces each coordinate of the start
//! point by 5% (or by a small absolute step when the coordinate is zero).

use crate::consts::{
    SIMPLEX_F_TOLERANCE, SIMPLEX_NONZERO_STEP, SIMPLEX_X_TOLERANCE, SIMPLEX_ZERO_STEP,
};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Outcome of a minimization. `point` is the best vertex found, whether or not
/// the tolerances were met.
#[derive(Clone, Debug)]
pub struct SimplexResult {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

/// Minimize `objective` starting from `start`, for at most `max_iterations`.
///
/// NaN objective values are treated as `+inf`.
pub fn minimize<F>(mut objective: F, start: &[f64], max_iterations: usize) -> SimplexResult
where
    F: FnMut(&[f64]) -> f64,
{
    let n = start.len();
    let mut evaluations = 0usize;
    let mut eval = |x: &[f64]| -> f64 {
        evaluations += 1;
        let v = objective(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    let mut vertices: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    vertices.push((start.to_vec(), eval(start)));
    for k in 0..n {
        let mut y = start.to_vec();
        if y[k] != 0.0 {
            y[k] *= 1.0 + SIMPLEX_NONZERO_STEP;
        } else {
            y[k] = SIMPLEX_ZERO_STEP;
        }
        let fy = eval(&y);
        vertices.push((y, fy));
    }
    sort_vertices(&mut vertices);

    let mut iterations = 1usize;
    let mut converged = false;

    while iterations < max_iterations {
        if within_tolerance(&vertices) {
            converged = true;
            break;
        }

        let worst = vertices[n].0.clone();
        let f_worst = vertices[n].1;
        let f_best = vertices[0].1;
        let f_second_worst = vertices[n - 1].1;

        let centroid = centroid_excluding_worst(&vertices);

        let reflected = affine(&centroid, &worst, 1.0 + REFLECTION, -REFLECTION);
        let f_reflected = eval(&reflected);

        let mut shrink = false;
        if f_reflected < f_best {
            let expanded = affine(
                &centroid,
                &worst,
                1.0 + REFLECTION * EXPANSION,
                -REFLECTION * EXPANSION,
            );
            let f_expanded = eval(&expanded);
            vertices[n] = if f_expanded < f_reflected {
                (expanded, f_expanded)
            } else {
                (reflected, f_reflected)
            };
        } else if f_reflected < f_second_worst {
            vertices[n] = (reflected, f_reflected);
        } else if f_reflected < f_worst {
            // Outside contraction.
            let contracted = affine(
                &centroid,
                &worst,
                1.0 + CONTRACTION * REFLECTION,
                -CONTRACTION * REFLECTION,
            );
            let f_contracted = eval(&contracted);
            if f_contracted <= f_reflected {
                vertices[n] = (contracted, f_contracted);
            } else {
                shrink = true;
            }
        } else {
            // Inside contraction.
            let contracted = affine(&centroid, &worst, 1.0 - CONTRACTION, CONTRACTION);
            let f_contracted = eval(&contracted);
            if f_contracted < f_worst {
                vertices[n] = (contracted, f_contracted);
            } else {
                shrink = true;
            }
        }

        if shrink {
            let best = vertices[0].0.clone();
            for vertex in vertices.iter_mut().skip(1) {
                let moved = affine(&best, &vertex.0, 1.0 - SHRINK, SHRINK);
                let f_moved = eval(&moved);
                *vertex = (moved, f_moved);
            }
        }

        sort_vertices(&mut vertices);
        iterations += 1;
    }

    let (point, value) = vertices.swap_remove(0);
    SimplexResult {
        point,
        value,
        iterations,
        evaluations,
        converged,
    }
}

fn sort_vertices(vertices: &mut [(Vec<f64>, f64)]) {
    vertices.sort_by(|a, b| a.1.total_cmp(&b.1));
}

fn within_tolerance(vertices: &[(Vec<f64>, f64)]) -> bool {
    let (best, f_best) = (&vertices[0].0, vertices[0].1);
    let x_spread = vertices[1..]
        .iter()
        .flat_map(|(x, _)| x.iter().zip(best.iter()).map(|(a, b)| (a - b).abs()))
        .fold(0.0f64, f64::max);
    let f_spread = vertices[1..]
        .iter()
        .map(|(_, f)| (f - f_best).abs())
        .fold(0.0f64, f64::max);

    // Infinite spread (a vertex off the domain) never counts as converged.
    x_spread <= SIMPLEX_X_TOLERANCE && f_spread <= SIMPLEX_F_TOLERANCE
}

fn centroid_excluding_worst(vertices: &[(Vec<f64>, f64)]) -> Vec<f64> {
    let n = vertices.len() - 1;
    let mut c = vec![0.0; vertices[0].0.len()];
    for (x, _) in &vertices[..n] {
        for (ci, xi) in c.iter_mut().zip(x.iter()) {
            *ci += xi;
        }
    }
    for ci in &mut c {
        *ci /= n as f64;
    }
    c
}

/// `wa * a + wb * b`, elementwise.
fn affine(a: &[f64], b: &[f64], wa: f64, wb: f64) -> Vec<f64> {
    a.iter().zip(b.iter()).map(|(x, y)| wa * x + wb * y).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_bowl() {
        let result = minimize(
            |x| (x[0] - 1.5).powi(2) + 2.0 * (x[1] + 0.75).powi(2),
            &[4.0, 3.0],
            1000,
        );
        assert!(result.converged);
        assert!((result.point[0] - 1.5).abs() < 1e-3, "{:?}", result.point);
        assert!((result.point[1] + 0.75).abs() < 1e-3, "{:?}", result.point);
    }

    #[test]
    fn test_rosenbrock() {
        let result = minimize(
            |x| 100.0 * (x[1] - x[0] * x[0]).powi(2) + (1.0 - x[0]).powi(2),
            &[-1.2, 1.0],
            1000,
        );
        assert!((result.point[0] - 1.0).abs() < 1e-2, "{:?}", result.point);
        assert!((result.point[1] - 1.0).abs() < 1e-2, "{:?}", result.point);
    }

    #[test]
    fn test_budget_exhausted_returns_best_so_far() {
        let start = [10.0, 10.0];
        let f = |x: &[f64]| x[0] * x[0] + x[1] * x[1];
        let result = minimize(f, &start, 3);
        assert!(!result.converged);
        assert_eq!(result.iterations, 3);
        assert!(result.value <= f(&start));
    }

    #[test]
    fn test_zero_start_coordinate() {
        let result = minimize(|x| (x[0] - 0.3).powi(2) + (x[1] - 0.2).powi(2), &[0.0, 0.0], 1000);
        assert!((result.point[0] - 0.3).abs() < 1e-3);
        assert!((result.point[1] - 0.2).abs() < 1e-3);
    }
}
