use ndarray::{s, Array2};

use crate::frame::FrameStack;

use super::reduce_time;

/// Pairwise product sum of non-negative intensities.
///
/// Every pair of time points `t0 <= t1` (self-pairs included) contributes
/// `max(x[t0], 0) * max(x[t1], 0)`. A frame with no positive pixel is skipped
/// as the first member of a pair but its pairs still count in the divisor.
pub fn pairwise_product_sum(stack: &FrameStack) -> Array2<f32> {
    let n = stack.n_frames();

    let active: Vec<bool> = (0..n)
        .map(|t| stack.frame(t).iter().any(|&v| v > 0.0))
        .collect();

    // Skipped frames still count, so every pair t0 <= t1 is in the divisor.
    let pairs = n * (n + 1) / 2;
    let divisor = pairs.max(1) as f32;

    reduce_time(stack, |series| {
        let mut pps = 0.0f32;
        for (t0, _) in active.iter().enumerate().filter(|&(_, &a)| a) {
            let r0 = series[t0].max(0.0);
            for &v in series.slice(s![t0..]).iter() {
                pps += r0 * v.max(0.0);
            }
        }
        pps / divisor
    })
}
