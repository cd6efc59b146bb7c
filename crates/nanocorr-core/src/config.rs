use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_BLOCKS_PER_AXIS, DEFAULT_LOCATOR_MAX_ITERATIONS, DEFAULT_MAX_SHIFT,
    DEFAULT_MIN_SIMILARITY,
};
use crate::temporal::CorrelationKind;

/// A temporal-correlation reconstruction run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    /// Directory of frames, read in file-name order.
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub correlation: CorrelationKind,
    #[serde(default)]
    pub integrate_lag_times: bool,
    /// Split the series into windows of this many frames, one map per window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames_per_window: Option<usize>,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("frames"),
            output: PathBuf::from("correlation.tiff"),
            correlation: CorrelationKind::default(),
            integrate_lag_times: false,
            frames_per_window: None,
        }
    }
}

impl fmt::Display for ReconstructionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.correlation)?;
        if self.integrate_lag_times && self.correlation.cumulant_order().is_some() {
            write!(f, " (lag-integrated)")?;
        }
        if let Some(n) = self.frames_per_window {
            write!(f, ", {} frames/window", n)?;
        }
        Ok(())
    }
}

/// Settings for the sub-pixel peak optimizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    pub max_iterations: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_LOCATOR_MAX_ITERATIONS,
        }
    }
}

/// Block-wise channel alignment settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Largest shift (pixels) searched along each axis.
    pub max_shift: usize,
    pub blocks_per_axis: usize,
    /// Blocks whose best similarity falls below this keep a zero translation.
    pub min_similarity: f32,
    #[serde(default)]
    pub locator: LocatorConfig,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            max_shift: DEFAULT_MAX_SHIFT,
            blocks_per_axis: DEFAULT_BLOCKS_PER_AXIS,
            min_similarity: DEFAULT_MIN_SIMILARITY,
            locator: LocatorConfig::default(),
        }
    }
}
