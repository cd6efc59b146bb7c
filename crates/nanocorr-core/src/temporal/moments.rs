use ndarray::Array2;

use crate::frame::FrameStack;

use super::{reduce_time, series_mean};

/// Per-pixel maximum across time.
pub fn temporal_max(stack: &FrameStack) -> Array2<f32> {
    reduce_time(stack, |series| {
        series.iter().fold(f32::NEG_INFINITY, |acc, &v| acc.max(v))
    })
}

/// Per-pixel arithmetic mean across time.
///
/// Accumulated in f64, so identical frames average back to themselves exactly.
pub fn temporal_mean(stack: &FrameStack) -> Array2<f32> {
    let (h, w) = (stack.height(), stack.width());
    let n = stack.n_frames() as f64;

    let mut sum = Array2::<f64>::zeros((h, w));
    for t in 0..stack.n_frames() {
        sum.zip_mut_with(&stack.frame(t), |acc, &v| *acc += v as f64);
    }

    sum.mapv(|v| (v / n) as f32)
}

/// Per-pixel population variance (divisor T).
pub fn temporal_variance(stack: &FrameStack) -> Array2<f32> {
    reduce_time(stack, |series| {
        let mean = series_mean(series);
        let sq = series.iter().fold(0.0f32, |acc, &v| {
            let d = v - mean;
            acc + d * d
        });
        sq / series.len() as f32
    })
}

/// Lag-1 temporal auto-covariance (TAC2).
///
/// Mean over t of `(x[t] - mean) * (x[t+1] - mean)`. Zero for fewer than two frames.
pub fn tac2(stack: &FrameStack) -> Array2<f32> {
    reduce_time(stack, |series| {
        let n = series.len();
        if n < 2 {
            return 0.0;
        }
        let mean = series_mean(series);
        let sum = series
            .windows(2)
            .into_iter()
            .fold(0.0f32, |acc, pair| acc + (pair[0] - mean) * (pair[1] - mean));
        sum / (n - 1) as f32
    })
}
