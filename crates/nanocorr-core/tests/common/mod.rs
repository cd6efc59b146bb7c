#![allow(dead_code)]

use ndarray::{Array2, Array3};

use nanocorr_core::frame::FrameStack;

/// Stack of `t` frames where pixel (r, c) of frame i is `f(i, r, c)`.
pub fn stack_from_fn<F>(t: usize, h: usize, w: usize, f: F) -> FrameStack
where
    F: Fn(usize, usize, usize) -> f32,
{
    let data = Array3::from_shape_fn((t, h, w), |(i, r, c)| f(i, r, c));
    FrameStack::new(data).expect("non-empty stack")
}

/// Stack where every pixel follows the same time series.
pub fn stack_from_series(series: &[f32], h: usize, w: usize) -> FrameStack {
    stack_from_fn(series.len(), h, w, |i, _, _| series[i])
}

/// Sampled 2D Gaussian bump.
pub fn gaussian_surface(h: usize, w: usize, cy: f64, cx: f64, sigma: f64) -> Array2<f32> {
    Array2::from_shape_fn((h, w), |(r, c)| {
        let dy = r as f64 - cy;
        let dx = c as f64 - cx;
        (-(dy * dy + dx * dx) / (2.0 * sigma * sigma)).exp() as f32
    })
}

/// Deterministic blob centres for textured test images.
pub fn blob_centres(count: usize, lo: f64, hi: f64) -> Vec<(f64, f64)> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        lo + (hi - lo) * ((state >> 11) as f64 / (1u64 << 53) as f64)
    };
    (0..count).map(|_| (next(), next())).collect()
}

/// Image of Gaussian blobs, sampled at `(r - shift_y, c - shift_x)`.
pub fn blob_image(
    h: usize,
    w: usize,
    centres: &[(f64, f64)],
    sigma: f64,
    shift_y: f64,
    shift_x: f64,
) -> Array2<f32> {
    Array2::from_shape_fn((h, w), |(r, c)| {
        let y = r as f64 - shift_y;
        let x = c as f64 - shift_x;
        centres
            .iter()
            .map(|&(cy, cx)| {
                let d2 = (y - cy).powi(2) + (x - cx).powi(2);
                (-d2 / (2.0 * sigma * sigma)).exp()
            })
            .sum::<f64>() as f32
    })
}
