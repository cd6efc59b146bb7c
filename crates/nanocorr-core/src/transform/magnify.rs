//! Fourier zoom: magnify an image by zero-padding its centred spectrum.
//!
//! For odd sizes and integer zoom factors the original samples are
//! reproduced exactly at every `z`-th output pixel.

use ndarray::Array2;
use num_complex::Complex;
use num_traits::Zero;
use rustfft::FftPlanner;
use tracing::debug;

use crate::error::{NanocorrError, Result};

/// Zoom `image` by `factor` (>= 1). The output is
/// `h + ceil((z-1)h/2) + floor((z-1)h/2)` rows, and likewise for columns.
pub fn fourier_zoom(image: &Array2<f32>, factor: f64) -> Result<Array2<f32>> {
    if !factor.is_finite() || factor < 1.0 {
        return Err(NanocorrError::InvalidArgument(format!(
            "zoom factor must be >= 1 (got {})",
            factor
        )));
    }

    let (h, w) = image.dim();
    let pad_rows = padding(h, factor);
    let pad_cols = padding(w, factor);
    let out_h = h + pad_rows.0 + pad_rows.1;
    let out_w = w + pad_cols.0 + pad_cols.1;
    debug!(h, w, out_h, out_w, factor, "Fourier zoom");

    let mut spectrum = image.mapv(|v| Complex::new(v as f64, 0.0));
    fft2d(&mut spectrum, false);
    let centred = fftshift(&spectrum, false);

    let mut padded = Array2::<Complex<f64>>::zeros((out_h, out_w));
    padded
        .slice_mut(ndarray::s![
            pad_rows.0..pad_rows.0 + h,
            pad_cols.0..pad_cols.0 + w
        ])
        .assign(&centred);

    let mut out = fftshift(&padded, true);
    fft2d(&mut out, true);

    // Inverse FFT normalisation by the output size, then the z^2 gain that
    // keeps sample values unchanged.
    let scale = factor * factor / (out_h * out_w) as f64;
    Ok(out.mapv(|c| (c.re * scale).clamp(f32::MIN as f64, f32::MAX as f64) as f32))
}

/// (before, after) zero padding along an axis of length `n`.
fn padding(n: usize, factor: f64) -> (usize, usize) {
    let total = (factor - 1.0) * n as f64 / 2.0;
    (total.ceil() as usize, total.floor() as usize)
}

/// In-place 2D FFT: rows, then columns. Unnormalised in both directions.
fn fft2d(data: &mut Array2<Complex<f64>>, inverse: bool) {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let (fft_row, fft_col) = if inverse {
        (planner.plan_fft_inverse(w), planner.plan_fft_inverse(h))
    } else {
        (planner.plan_fft_forward(w), planner.plan_fft_forward(h))
    };

    let mut buf = vec![Complex::zero(); w];
    for mut row in data.rows_mut() {
        buf.iter_mut().zip(row.iter()).for_each(|(b, &v)| *b = v);
        fft_row.process(&mut buf);
        row.iter_mut().zip(buf.iter()).for_each(|(v, &b)| *v = b);
    }

    let mut buf = vec![Complex::zero(); h];
    for mut col in data.columns_mut() {
        buf.iter_mut().zip(col.iter()).for_each(|(b, &v)| *b = v);
        fft_col.process(&mut buf);
        col.iter_mut().zip(buf.iter()).for_each(|(v, &b)| *v = b);
    }
}

/// Move the zero frequency to the centre (`inverse == false`) or back.
fn fftshift(data: &Array2<Complex<f64>>, inverse: bool) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let (sh, sw) = if inverse {
        (h - h / 2, w - w / 2)
    } else {
        (h / 2, w / 2)
    };
    Array2::from_shape_fn((h, w), |(r, c)| data[[(r + h - sh) % h, (c + w - sw) % w]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fftshift_round_trip_odd() {
        let data = Array2::from_shape_fn((3, 5), |(r, c)| Complex::new((r * 5 + c) as f64, 0.0));
        let back = fftshift(&fftshift(&data, false), true);
        assert_eq!(back, data);
    }

    #[test]
    fn test_fftshift_moves_origin_to_centre() {
        let mut data = Array2::<Complex<f64>>::zeros((4, 5));
        data[[0, 0]] = Complex::new(1.0, 0.0);
        let shifted = fftshift(&data, false);
        assert_eq!(shifted[[2, 2]], Complex::new(1.0, 0.0));
    }

    #[test]
    fn test_padding_split() {
        assert_eq!(padding(5, 2.0), (3, 2));
        assert_eq!(padding(4, 3.0), (4, 4));
        assert_eq!(padding(7, 1.0), (0, 0));
    }
}
