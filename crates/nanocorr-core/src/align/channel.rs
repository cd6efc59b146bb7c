//! Block-wise channel alignment.
//!
//! Each non-reference channel is split into a grid of blocks. For every
//! block a [`BlockCorrelator`] produces a similarity surface over candidate
//! shifts, and [`locate_max_with`] refines its peak to a sub-pixel
//! translation. Results are returned as per-pixel translation masks plus the
//! tiled similarity surfaces of every channel.

use ndarray::{s, Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::AlignmentConfig;
use crate::error::{NanocorrError, Result};

use super::block::{BlockCorrelator, BlockRegion, NccBlockCorrelator};
use super::interpolant::bilinear_sample;
use super::peak::{find_peak, locate_max_with};

/// Translation estimated for one block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockShift {
    pub region: BlockRegion,
    /// Row shift: `moving[r + dy]` matches `reference[r]`.
    pub dy: f64,
    /// Column shift: `moving[c + dx]` matches `reference[c]`.
    pub dx: f64,
    /// Best grid similarity of the block's surface.
    pub similarity: f32,
}

/// Translation masks and similarity maps for a channel stack.
#[derive(Clone, Debug)]
pub struct ChannelAlignment {
    /// Shape (channels, h, 2w): column shifts in the left half, row shifts
    /// in the right half. The reference channel is all zeros.
    pub translation_masks: Array3<f32>,
    /// Shape (channels, blocks * surface, blocks * surface): each channel's
    /// block surfaces tiled in block order. The reference channel is zeros.
    pub ccms: Array3<f32>,
    /// Per channel, per block shifts. Empty for the reference channel.
    pub block_shifts: Vec<Vec<BlockShift>>,
}

pub struct ChannelAlignmentEstimator<C: BlockCorrelator = NccBlockCorrelator> {
    config: AlignmentConfig,
    correlator: C,
}

impl ChannelAlignmentEstimator<NccBlockCorrelator> {
    pub fn new(config: AlignmentConfig) -> Self {
        Self::with_correlator(config, NccBlockCorrelator)
    }
}

impl<C: BlockCorrelator> ChannelAlignmentEstimator<C> {
    pub fn with_correlator(config: AlignmentConfig, correlator: C) -> Self {
        Self { config, correlator }
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Estimate translation masks aligning every channel to `ref_channel`.
    ///
    /// `channels` has shape (channels, h, w).
    pub fn estimate(&self, channels: &Array3<f32>, ref_channel: usize) -> Result<ChannelAlignment> {
        self.estimate_with_progress(channels, ref_channel, |_| {})
    }

    /// Like [`estimate`](Self::estimate), calling `on_channel` after each
    /// aligned channel with the number of channels finished.
    pub fn estimate_with_progress<F>(
        &self,
        channels: &Array3<f32>,
        ref_channel: usize,
        on_channel: F,
    ) -> Result<ChannelAlignment>
    where
        F: Fn(usize),
    {
        let (n_channels, h, w) = channels.dim();
        if n_channels == 0 {
            return Err(NanocorrError::EmptySequence);
        }
        if ref_channel >= n_channels {
            return Err(NanocorrError::InvalidArgument(format!(
                "reference channel {} out of range ({} channels)",
                ref_channel, n_channels
            )));
        }
        self.validate_grid(h, w)?;

        let bpa = self.config.blocks_per_axis;
        let surface_size = 2 * self.config.max_shift + 1;
        let mut translation_masks = Array3::<f32>::zeros((n_channels, h, 2 * w));
        let mut ccms = Array3::<f32>::zeros((n_channels, bpa * surface_size, bpa * surface_size));
        let mut block_shifts = vec![Vec::new(); n_channels];

        info!(
            channels = n_channels,
            ref_channel,
            correlator = self.correlator.name(),
            blocks_per_axis = bpa,
            max_shift = self.config.max_shift,
            "Estimating channel alignment"
        );

        let reference = channels.index_axis(Axis(0), ref_channel).to_owned();
        let mut finished = 0;
        for channel in (0..n_channels).filter(|&c| c != ref_channel) {
            let moving = channels.index_axis(Axis(0), channel).to_owned();
            let (mask, ccm, shifts) = self.translation_mask(&moving, &reference)?;

            translation_masks.index_axis_mut(Axis(0), channel).assign(&mask);
            ccms.index_axis_mut(Axis(0), channel).assign(&ccm);

            let kept = shifts
                .iter()
                .filter(|s| s.similarity >= self.config.min_similarity)
                .count();
            info!(channel, blocks = shifts.len(), kept, "Channel aligned");
            block_shifts[channel] = shifts;

            finished += 1;
            on_channel(finished);
        }

        Ok(ChannelAlignment {
            translation_masks,
            ccms,
            block_shifts,
        })
    }

    /// Translation mask, tiled similarity map and block shifts of one channel
    /// against a reference of the same size.
    pub fn translation_mask(
        &self,
        moving: &Array2<f32>,
        reference: &Array2<f32>,
    ) -> Result<(Array2<f32>, Array2<f32>, Vec<BlockShift>)> {
        let (h, w) = reference.dim();
        if moving.dim() != (h, w) {
            return Err(NanocorrError::DimensionMismatch {
                expected: format!("{}x{}", w, h),
                found: format!("{}x{}", moving.ncols(), moving.nrows()),
            });
        }
        self.validate_grid(h, w)?;

        let bpa = self.config.blocks_per_axis;
        let max_shift = self.config.max_shift;
        let surface_size = 2 * max_shift + 1;
        let blocks = BlockRegion::grid(h, w, bpa);

        let results: Vec<(BlockShift, Array2<f32>)> = blocks
            .par_iter()
            .map(|&region| {
                let surface = self
                    .correlator
                    .correlate(reference, moving, region, max_shift);
                let shift = self.block_shift(region, &surface);
                (shift, surface)
            })
            .collect();

        let mut mask = Array2::<f32>::zeros((h, 2 * w));
        let mut ccm = Array2::<f32>::zeros((bpa * surface_size, bpa * surface_size));
        let mut shifts = Vec::with_capacity(results.len());

        for (index, (shift, surface)) in results.into_iter().enumerate() {
            let r = shift.region;
            mask.slice_mut(s![r.row..r.row + r.height, r.col..r.col + r.width])
                .fill(shift.dx as f32);
            mask.slice_mut(s![r.row..r.row + r.height, w + r.col..w + r.col + r.width])
                .fill(shift.dy as f32);

            let tile_row = (index / bpa) * surface_size;
            let tile_col = (index % bpa) * surface_size;
            ccm.slice_mut(s![
                tile_row..tile_row + surface_size,
                tile_col..tile_col + surface_size
            ])
            .assign(&surface);

            shifts.push(shift);
        }

        Ok((mask, ccm, shifts))
    }

    fn block_shift(&self, region: BlockRegion, surface: &Array2<f32>) -> BlockShift {
        let (_, _, similarity) = find_peak(surface);
        let max_shift = self.config.max_shift as f64;

        if similarity < self.config.min_similarity {
            debug!(
                row = region.row,
                col = region.col,
                similarity,
                "Block below similarity threshold, keeping zero shift"
            );
            return BlockShift {
                region,
                dy: 0.0,
                dx: 0.0,
                similarity,
            };
        }

        let peak = locate_max_with(surface, &self.config.locator);
        BlockShift {
            region,
            dy: peak.row - max_shift,
            dx: peak.col - max_shift,
            similarity,
        }
    }

    fn validate_grid(&self, h: usize, w: usize) -> Result<()> {
        let bpa = self.config.blocks_per_axis;
        if bpa == 0 || bpa > h || bpa > w {
            return Err(NanocorrError::InvalidArgument(format!(
                "blocks per axis must be between 1 and {} for a {}x{} image (got {})",
                h.min(w),
                w,
                h,
                bpa
            )));
        }
        Ok(())
    }
}

/// Resample every channel by its translation mask.
///
/// `masks` must have shape (channels, h, 2w) as produced by
/// [`ChannelAlignmentEstimator::estimate`].
pub fn apply_translation_masks(channels: &Array3<f32>, masks: &Array3<f32>) -> Result<Array3<f32>> {
    let (n, h, w) = channels.dim();
    if masks.dim() != (n, h, 2 * w) {
        let (mn, mh, mw) = masks.dim();
        return Err(NanocorrError::DimensionMismatch {
            expected: format!("{}x{}x{}", n, h, 2 * w),
            found: format!("{}x{}x{}", mn, mh, mw),
        });
    }

    let mut corrected = Array3::<f32>::zeros((n, h, w));
    corrected
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(ch, mut out)| {
            let channel = channels.index_axis(Axis(0), ch).to_owned();
            let mask = masks.index_axis(Axis(0), ch);
            shift_by_mask(&channel, mask, &mut out);
        });

    Ok(corrected)
}

fn shift_by_mask(
    channel: &Array2<f32>,
    mask: ArrayView2<'_, f32>,
    out: &mut ndarray::ArrayViewMut2<'_, f32>,
) {
    let (h, w) = channel.dim();
    for row in 0..h {
        for col in 0..w {
            let dx = mask[[row, col]] as f64;
            let dy = mask[[row, w + col]] as f64;
            out[[row, col]] = bilinear_sample(channel, row as f64 + dy, col as f64 + dx);
        }
    }
}
