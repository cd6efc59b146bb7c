use ndarray::Array2;
use tracing::debug;

use crate::config::LocatorConfig;
use crate::frame::SubpixelOffset;

use super::interpolant::BicubicSurface;
use super::simplex;

/// Locate the sub-pixel maximum of a similarity surface with default settings.
pub fn locate_max(surface: &Array2<f32>) -> SubpixelOffset {
    locate_max_with(surface, &LocatorConfig::default())
}

/// Locate the sub-pixel maximum of a similarity surface.
///
/// Starts from the brightest grid sample and maximizes a bicubic interpolant
/// of the surface with a Nelder–Mead simplex. The interpolant is built once
/// per call. Only the neighbourhood of the discrete maximum is explored, and
/// when the iteration budget runs out the best point so far is returned.
/// Surfaces narrower than two samples along an axis return the grid maximum.
pub fn locate_max_with(surface: &Array2<f32>, config: &LocatorConfig) -> SubpixelOffset {
    let (peak_row, peak_col, _) = find_peak(surface);
    let seed = SubpixelOffset::new(peak_row as f64, peak_col as f64);

    let Some(interp) = BicubicSurface::new(surface) else {
        return seed;
    };

    let result = simplex::minimize(
        |p| match interp.sample(p[0], p[1]) {
            Some(v) => -v,
            None => f64::INFINITY,
        },
        &[seed.row, seed.col],
        config.max_iterations,
    );

    if !result.converged {
        debug!(
            iterations = result.iterations,
            evaluations = result.evaluations,
            "Sub-pixel peak search hit its iteration budget"
        );
    }

    SubpixelOffset::new(result.point[0], result.point[1])
}

/// Find the maximum sample. Returns (row, col, value); ties resolve to the
/// first sample in row-major order and NaN samples are ignored.
pub fn find_peak(surface: &Array2<f32>) -> (usize, usize, f32) {
    let mut max_val = f32::NEG_INFINITY;
    let mut max_row = 0;
    let mut max_col = 0;

    for ((row, col), &val) in surface.indexed_iter() {
        if val > max_val {
            max_val = val;
            max_row = row;
            max_col = col;
        }
    }

    (max_row, max_col, max_val)
}
