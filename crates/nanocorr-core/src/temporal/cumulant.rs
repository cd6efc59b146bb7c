//! Auto-cumulants of order 2 to 4 along the time axis.
//!
//! Each window of `order` consecutive mean-centred samples `a, b, c, d`
//! (at t, t+1, t+2, t+3) adds to a set of running sums:
//!
//! - order 2: `|Σ a·b| / T`
//! - order 3: `|Σ (a·b + c)| / T`
//! - order 4: `|abcd − ab·cd − ac·bd − ad·bc| / T` over the running sums
//!
//! The order-3 sum is `a·b + c`, not the triple product.
//!
//! With lag-time integration the series is re-binned after every pass and the
//! accumulation repeated on the coarser series until no more than `order`
//! effective time points remain. Binning happens on a per-pixel copy.

use ndarray::{Array2, ArrayView1};

use crate::consts::MAX_CUMULANT_ORDER;
use crate::frame::FrameStack;

use super::{reduce_time, series_mean};

/// Auto-cumulant map of the given order (2, 3 or 4).
pub fn auto_cumulant(stack: &FrameStack, order: usize, integrate_lag_times: bool) -> Array2<f32> {
    debug_assert!((2..=MAX_CUMULANT_ORDER).contains(&order));

    if integrate_lag_times {
        reduce_time(stack, |series| lag_integrated_series(series, order))
    } else {
        reduce_time(stack, |series| cumulant_series(series, order))
    }
}

/// Running sums of centred products.
#[derive(Default)]
struct Accumulator {
    ab: f32,
    abc: f32,
    abcd: f32,
    cd: f32,
    ac: f32,
    bd: f32,
    ad: f32,
    bc: f32,
}

impl Accumulator {
    /// Add the window starting at `t`. Requires `t + order <= series.len()`.
    fn add<S>(&mut self, series: &S, t: usize, mean: f32, order: usize)
    where
        S: std::ops::Index<usize, Output = f32> + ?Sized,
    {
        let a = series[t] - mean;
        let b = series[t + 1] - mean;
        self.ab += a * b;

        match order {
            3 => {
                let c = series[t + 2] - mean;
                self.abc = self.abc + a * b + c;
            }
            4 => {
                let c = series[t + 2] - mean;
                let d = series[t + 3] - mean;
                self.abcd += a * b * c * d;
                self.cd += c * d;
                self.ac += a * c;
                self.bd += b * d;
                self.ad += a * d;
                self.bc += b * c;
            }
            _ => {}
        }
    }

    fn value(&self, order: usize, n: f32) -> f32 {
        match order {
            3 => self.abc.abs() / n,
            4 => {
                (self.abcd - self.ab * self.cd - self.ac * self.bd - self.ad * self.bc).abs() / n
            }
            _ => self.ab.abs() / n,
        }
    }
}

fn cumulant_series(series: ArrayView1<'_, f32>, order: usize) -> f32 {
    let n = series.len();
    let mean = series_mean(series);

    let mut acc = Accumulator::default();
    let mut t = 0;
    while t + order < n {
        acc.add(&series, t, mean, order);
        t += 1;
    }

    acc.value(order, n as f32)
}

fn lag_integrated_series(series: ArrayView1<'_, f32>, order: usize) -> f32 {
    let mean = series_mean(series);
    let mut work = series.to_vec();

    let order_f = order as f64;
    let bin_weight = order as f32;

    let mut acc = Accumulator::default();
    let mut out = 0.0f32;
    let mut n_binned = work.len() as f64;

    while n_binned > order_f {
        // Only the lag-1 sum restarts each pass.
        acc.ab = 0.0;

        let mut t = 0usize;
        while (t as f64) < n_binned - order_f {
            acc.add(work.as_slice(), t, mean, order);

            let tbin = t * order;
            work[t] = 0.0;
            if (tbin as f64) < n_binned {
                for k in 0..order - 1 {
                    // Bin sources past the end of the series contribute nothing.
                    if let Some(&v) = work.get(tbin + k) {
                        work[t] += v / bin_weight;
                    }
                }
            }
            t += 1;
        }

        out = acc.value(order, n_binned as f32);
        n_binned /= order_f;
    }

    out
}
