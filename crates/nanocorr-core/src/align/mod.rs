pub mod block;
pub mod channel;
pub mod interpolant;
pub mod peak;
pub mod simplex;

pub use block::{BlockCorrelator, BlockRegion, NccBlockCorrelator};
pub use channel::{apply_translation_masks, ChannelAlignment, ChannelAlignmentEstimator};
pub use peak::{find_peak, locate_max, locate_max_with};
