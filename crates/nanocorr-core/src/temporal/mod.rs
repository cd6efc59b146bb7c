//! Temporal correlation engine.
//!
//! Reduces a [`FrameStack`] along its time axis into a single map. Two
//! families of statistics are supported:
//!
//! - **SRRF**: indexed by an integer order (max, mean, pairwise product sum,
//!   auto-cumulants of order 2 to 4, optionally integrated over lag times).
//! - **eSRRF**: named correlations (average, variance, lag-1 auto-covariance).

pub mod cumulant;
pub mod moments;
pub mod pairwise;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{s, Array2, Array3, ArrayView1, Axis, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::consts::{PARALLEL_PIXEL_THRESHOLD, PARALLEL_WINDOW_THRESHOLD};
use crate::error::{NanocorrError, Result};
use crate::frame::FrameStack;

/// Which temporal statistic to compute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrelationKind {
    Max,
    Mean,
    PairwiseProductSum,
    #[default]
    Cumulant2,
    Cumulant3,
    Cumulant4,
    Avg,
    Var,
    Tac2,
}

/// The two statistic families the engine implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrelationFamily {
    Srrf,
    Esrrf,
}

impl CorrelationKind {
    pub const ALL: [CorrelationKind; 9] = [
        CorrelationKind::Max,
        CorrelationKind::Mean,
        CorrelationKind::PairwiseProductSum,
        CorrelationKind::Cumulant2,
        CorrelationKind::Cumulant3,
        CorrelationKind::Cumulant4,
        CorrelationKind::Avg,
        CorrelationKind::Var,
        CorrelationKind::Tac2,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CorrelationKind::Max => "MAX",
            CorrelationKind::Mean => "MEAN",
            CorrelationKind::PairwiseProductSum => "PAIRWISE_PRODUCT_SUM",
            CorrelationKind::Cumulant2 => "CUMULANT2",
            CorrelationKind::Cumulant3 => "CUMULANT3",
            CorrelationKind::Cumulant4 => "CUMULANT4",
            CorrelationKind::Avg => "AVG",
            CorrelationKind::Var => "VAR",
            CorrelationKind::Tac2 => "TAC2",
        }
    }

    pub fn family(&self) -> CorrelationFamily {
        match self {
            CorrelationKind::Avg | CorrelationKind::Var | CorrelationKind::Tac2 => {
                CorrelationFamily::Esrrf
            }
            _ => CorrelationFamily::Srrf,
        }
    }

    /// Cumulant order for the CUMULANT kinds, `None` otherwise.
    pub fn cumulant_order(&self) -> Option<usize> {
        match self {
            CorrelationKind::Cumulant2 => Some(2),
            CorrelationKind::Cumulant3 => Some(3),
            CorrelationKind::Cumulant4 => Some(4),
            _ => None,
        }
    }

    /// Map an SRRF integer order to its kind.
    ///
    /// 0 is the temporal maximum, 1 the mean, -1 the pairwise product sum
    /// and 2..=4 the auto-cumulants.
    pub fn from_srrf_order(order: i32) -> Result<Self> {
        match order {
            0 => Ok(CorrelationKind::Max),
            1 => Ok(CorrelationKind::Mean),
            -1 => Ok(CorrelationKind::PairwiseProductSum),
            2 => Ok(CorrelationKind::Cumulant2),
            3 => Ok(CorrelationKind::Cumulant3),
            4 => Ok(CorrelationKind::Cumulant4),
            other => Err(NanocorrError::InvalidArgument(format!(
                "SRRF order must be one of -1, 0, 1, 2, 3, 4 (got {})",
                other
            ))),
        }
    }

    fn allowed_names() -> String {
        Self::ALL
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CorrelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CorrelationKind {
    type Err = NanocorrError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                NanocorrError::InvalidArgument(format!(
                    "unknown correlation kind '{}', expected one of: {}",
                    s,
                    Self::allowed_names()
                ))
            })
    }
}

/// Reduce `stack` along time into a single map.
///
/// `integrate_lag_times` only affects the CUMULANT kinds. Stacks with too few
/// frames for the requested order produce zeros rather than an error.
pub fn compute(stack: &FrameStack, kind: CorrelationKind, integrate_lag_times: bool) -> Array2<f32> {
    debug!(
        kind = %kind,
        frames = stack.n_frames(),
        height = stack.height(),
        width = stack.width(),
        integrate_lag_times,
        "Computing temporal correlation"
    );

    match kind {
        CorrelationKind::Max => moments::temporal_max(stack),
        CorrelationKind::Mean | CorrelationKind::Avg => moments::temporal_mean(stack),
        CorrelationKind::Var => moments::temporal_variance(stack),
        CorrelationKind::Tac2 => moments::tac2(stack),
        CorrelationKind::PairwiseProductSum => pairwise::pairwise_product_sum(stack),
        CorrelationKind::Cumulant2 => cumulant::auto_cumulant(stack, 2, integrate_lag_times),
        CorrelationKind::Cumulant3 => cumulant::auto_cumulant(stack, 3, integrate_lag_times),
        CorrelationKind::Cumulant4 => cumulant::auto_cumulant(stack, 4, integrate_lag_times),
    }
}

/// Compute one map per consecutive window of `frames_per_window` frames.
///
/// Returns shape (n_windows, height, width). A trailing partial window is
/// dropped unless the stack is shorter than one window, in which case the
/// whole stack forms a single window.
pub fn compute_windowed(
    stack: &FrameStack,
    kind: CorrelationKind,
    integrate_lag_times: bool,
    frames_per_window: usize,
) -> Result<Array3<f32>> {
    compute_windowed_with_progress(stack, kind, integrate_lag_times, frames_per_window, |_| {})
}

/// Like [`compute_windowed`], calling `on_window` with the number of finished windows.
pub fn compute_windowed_with_progress<F>(
    stack: &FrameStack,
    kind: CorrelationKind,
    integrate_lag_times: bool,
    frames_per_window: usize,
    on_window: F,
) -> Result<Array3<f32>>
where
    F: Fn(usize) + Send + Sync,
{
    let ranges = window_ranges(stack.n_frames(), frames_per_window)?;
    info!(
        windows = ranges.len(),
        frames_per_window,
        kind = %kind,
        "Computing windowed temporal correlation"
    );

    let done = AtomicUsize::new(0);
    let run = |&(start, end): &(usize, usize)| -> Result<Array2<f32>> {
        let window = FrameStack::new(stack.data().slice(s![start..end, .., ..]).to_owned())?;
        let map = compute(&window, kind, integrate_lag_times);
        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
        on_window(finished);
        Ok(map)
    };

    let maps: Vec<Array2<f32>> = if ranges.len() >= PARALLEL_WINDOW_THRESHOLD {
        ranges.par_iter().map(run).collect::<Result<_>>()?
    } else {
        ranges.iter().map(run).collect::<Result<_>>()?
    };

    let views: Vec<_> = maps.iter().map(|m| m.view()).collect();
    ndarray::stack(Axis(0), &views).map_err(|e| NanocorrError::DimensionMismatch {
        expected: format!("{}x{}", stack.width(), stack.height()),
        found: e.to_string(),
    })
}

fn window_ranges(n_frames: usize, frames_per_window: usize) -> Result<Vec<(usize, usize)>> {
    if frames_per_window == 0 {
        return Err(NanocorrError::InvalidArgument(
            "frames per window must be at least 1".into(),
        ));
    }

    let n_windows = n_frames / frames_per_window;
    if n_windows == 0 {
        return Ok(vec![(0, n_frames)]);
    }

    Ok((0..n_windows)
        .map(|i| (i * frames_per_window, (i + 1) * frames_per_window))
        .collect())
}

/// Apply `f` to every pixel's time series, producing an (h, w) map.
///
/// Parallel over pixels for large frames.
pub(crate) fn reduce_time<F>(stack: &FrameStack, f: F) -> Array2<f32>
where
    F: Fn(ArrayView1<'_, f32>) -> f32 + Send + Sync,
{
    let data = stack.data();
    let (h, w) = (stack.height(), stack.width());
    let mut out = Array2::<f32>::zeros((h, w));

    let zip = Zip::from(&mut out).and(data.lanes(Axis(0)));
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        zip.par_for_each(|o, series| *o = f(series));
    } else {
        zip.for_each(|o, series| *o = f(series));
    }

    out
}

/// Mean of a time series, accumulated in f64.
pub(crate) fn series_mean(series: ArrayView1<'_, f32>) -> f32 {
    let n = series.len();
    if n == 0 {
        return 0.0;
    }
    let sum = series.iter().fold(0.0f64, |acc, &v| acc + v as f64);
    (sum / n as f64) as f32
}
