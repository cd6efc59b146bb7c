/// Minimum pixel count (h*w) to use pixel-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum window count to compute frame windows in parallel.
pub const PARALLEL_WINDOW_THRESHOLD: usize = 2;

/// Highest cumulant order supported by the temporal engine.
pub const MAX_CUMULANT_ORDER: usize = 4;

/// Default iteration budget of the sub-pixel peak optimizer.
pub const DEFAULT_LOCATOR_MAX_ITERATIONS: usize = 1000;

/// Absolute tolerance on simplex vertex spread (both coordinates).
pub const SIMPLEX_X_TOLERANCE: f64 = 1e-4;

/// Absolute tolerance on simplex objective spread.
pub const SIMPLEX_F_TOLERANCE: f64 = 1e-4;

/// Relative step used to build the initial simplex around a non-zero coordinate.
pub const SIMPLEX_NONZERO_STEP: f64 = 0.05;

/// Absolute step used to build the initial simplex around a zero coordinate.
pub const SIMPLEX_ZERO_STEP: f64 = 0.00025;

/// Catmull-Rom parameter of the bicubic convolution kernel.
pub const BICUBIC_A: f64 = -0.5;

/// Default maximum shift (pixels) searched by the block correlator.
pub const DEFAULT_MAX_SHIFT: usize = 10;

/// Default number of alignment blocks along each image axis.
pub const DEFAULT_BLOCKS_PER_AXIS: usize = 4;

/// Default minimum peak similarity for a block translation to be kept.
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.5;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-12;
