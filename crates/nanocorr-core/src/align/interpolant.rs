use ndarray::Array2;

use crate::consts::BICUBIC_A;

/// Bicubic convolution interpolant over a sampled surface.
///
/// Polynomial coefficients are computed for every grid cell at construction,
/// so each evaluation is a cell lookup plus a 4x4 Horner evaluation. Samples
/// beyond the edges are clamped. The domain is `[0, h-1] x [0, w-1]`.
pub struct BicubicSurface {
    height: usize,
    width: usize,
    /// Per cell, `c[n * 4 + m]` multiplies `fy^n * fx^m`.
    coeffs: Vec<[f64; 16]>,
}

impl BicubicSurface {
    /// Build the interpolant. Returns `None` when the surface has fewer than
    /// two samples along either axis.
    pub fn new(surface: &Array2<f32>) -> Option<Self> {
        let (h, w) = surface.dim();
        if h < 2 || w < 2 {
            return None;
        }

        let basis = kernel_basis(BICUBIC_A);
        let sample = |r: isize, c: isize| -> f64 {
            let rr = r.clamp(0, h as isize - 1) as usize;
            let cc = c.clamp(0, w as isize - 1) as usize;
            surface[[rr, cc]] as f64
        };

        let cells_h = h - 1;
        let cells_w = w - 1;
        let mut coeffs = Vec::with_capacity(cells_h * cells_w);

        for y0 in 0..cells_h {
            for x0 in 0..cells_w {
                let mut p = [[0.0f64; 4]; 4];
                for (j, row) in p.iter_mut().enumerate() {
                    for (i, v) in row.iter_mut().enumerate() {
                        *v = sample(y0 as isize - 1 + j as isize, x0 as isize - 1 + i as isize);
                    }
                }
                coeffs.push(cell_coefficients(&basis, &p));
            }
        }

        Some(Self {
            height: h,
            width: w,
            coeffs,
        })
    }

    /// Interpolated value at (row, col), or `None` outside the sampled grid.
    pub fn sample(&self, row: f64, col: f64) -> Option<f64> {
        let max_r = (self.height - 1) as f64;
        let max_c = (self.width - 1) as f64;
        if !(0.0..=max_r).contains(&row) || !(0.0..=max_c).contains(&col) {
            return None;
        }

        let y0 = (row.floor() as usize).min(self.height - 2);
        let x0 = (col.floor() as usize).min(self.width - 2);
        let fy = row - y0 as f64;
        let fx = col - x0 as f64;

        let c = &self.coeffs[y0 * (self.width - 1) + x0];
        let mut value = 0.0;
        for n in (0..4).rev() {
            let row_poly = ((c[n * 4 + 3] * fx + c[n * 4 + 2]) * fx + c[n * 4 + 1]) * fx + c[n * 4];
            value = value * fy + row_poly;
        }
        Some(value)
    }
}

/// Bilinear sample at (y, x); zero outside the array.
pub fn bilinear_sample(data: &Array2<f32>, y: f64, x: f64) -> f32 {
    let (h, w) = data.dim();

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let sample = |r: i64, c: i64| -> f32 {
        if r >= 0 && r < h as i64 && c >= 0 && c < w as i64 {
            data[[r as usize, c as usize]]
        } else {
            0.0
        }
    };

    let v00 = sample(y0, x0);
    let v10 = sample(y0, x1);
    let v01 = sample(y1, x0);
    let v11 = sample(y1, x1);

    v00 * (1.0 - fx) * (1.0 - fy) + v10 * fx * (1.0 - fy) + v01 * (1.0 - fx) * fy + v11 * fx * fy
}

/// `basis[m][i]`: coefficient of `f^m` in the kernel weight of tap `i`
/// (taps at offsets -1, 0, 1, 2 from the cell origin).
fn kernel_basis(a: f64) -> [[f64; 4]; 4] {
    [
        [0.0, 1.0, 0.0, 0.0],
        [a, 0.0, -a, 0.0],
        [-2.0 * a, -(a + 3.0), 2.0 * a + 3.0, a],
        [a, a + 2.0, -(a + 2.0), -a],
    ]
}

/// `C = B * P * B^T` flattened row-major, rows indexed by the power of fy.
fn cell_coefficients(basis: &[[f64; 4]; 4], p: &[[f64; 4]; 4]) -> [f64; 16] {
    // t[j][m] = sum_i p[j][i] * basis[m][i]
    let mut t = [[0.0f64; 4]; 4];
    for j in 0..4 {
        for m in 0..4 {
            t[j][m] = (0..4).map(|i| p[j][i] * basis[m][i]).sum();
        }
    }

    let mut c = [0.0f64; 16];
    for n in 0..4 {
        for m in 0..4 {
            c[n * 4 + m] = (0..4).map(|j| basis[n][j] * t[j][m]).sum();
        }
    }
    c
}
