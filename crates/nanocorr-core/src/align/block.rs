use ndarray::Array2;

use crate::consts::EPSILON;

/// Rectangular region of an image, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRegion {
    pub row: usize,
    pub col: usize,
    pub height: usize,
    pub width: usize,
}

impl BlockRegion {
    /// Split an `h x w` image into `blocks_per_axis^2` blocks in row-major order.
    ///
    /// The last block along each axis absorbs the remainder.
    pub fn grid(h: usize, w: usize, blocks_per_axis: usize) -> Vec<BlockRegion> {
        let bh = h / blocks_per_axis;
        let bw = w / blocks_per_axis;
        let mut blocks = Vec::with_capacity(blocks_per_axis * blocks_per_axis);

        for by in 0..blocks_per_axis {
            for bx in 0..blocks_per_axis {
                let row = by * bh;
                let col = bx * bw;
                let height = if by + 1 == blocks_per_axis { h - row } else { bh };
                let width = if bx + 1 == blocks_per_axis { w - col } else { bw };
                blocks.push(BlockRegion {
                    row,
                    col,
                    height,
                    width,
                });
            }
        }

        blocks
    }
}

/// Produces a similarity surface for one block.
///
/// Entry `[i, j]` scores the candidate shift `(i - max_shift, j - max_shift)`:
/// how well `moving[r + dy, c + dx]` matches `reference[r, c]` over the block.
/// Surfaces are `(2 * max_shift + 1)` square.
pub trait BlockCorrelator: Send + Sync {
    fn name(&self) -> &str;

    fn correlate(
        &self,
        reference: &Array2<f32>,
        moving: &Array2<f32>,
        block: BlockRegion,
        max_shift: usize,
    ) -> Array2<f32>;
}

/// Zero-mean normalized cross-correlation evaluated directly at every
/// integer shift. Scores lie in [-1, 1]; shifts with no overlap or a flat
/// patch score 0.
pub struct NccBlockCorrelator;

impl BlockCorrelator for NccBlockCorrelator {
    fn name(&self) -> &str {
        "NCC"
    }

    fn correlate(
        &self,
        reference: &Array2<f32>,
        moving: &Array2<f32>,
        block: BlockRegion,
        max_shift: usize,
    ) -> Array2<f32> {
        let size = 2 * max_shift + 1;
        let s = max_shift as isize;
        Array2::from_shape_fn((size, size), |(i, j)| {
            ncc_at_shift(reference, moving, block, i as isize - s, j as isize - s)
        })
    }
}

fn ncc_at_shift(
    reference: &Array2<f32>,
    moving: &Array2<f32>,
    block: BlockRegion,
    dy: isize,
    dx: isize,
) -> f32 {
    let (mh, mw) = moving.dim();
    let in_moving = |r: usize, c: usize| -> Option<(usize, usize)> {
        let mr = r as isize + dy;
        let mc = c as isize + dx;
        if mr >= 0 && mr < mh as isize && mc >= 0 && mc < mw as isize {
            Some((mr as usize, mc as usize))
        } else {
            None
        }
    };

    let rows = block.row..block.row + block.height;
    let cols = block.col..block.col + block.width;

    let mut n = 0usize;
    let mut sum_a = 0.0f64;
    let mut sum_b = 0.0f64;
    for r in rows.clone() {
        for c in cols.clone() {
            if let Some((mr, mc)) = in_moving(r, c) {
                sum_a += reference[[r, c]] as f64;
                sum_b += moving[[mr, mc]] as f64;
                n += 1;
            }
        }
    }
    if n == 0 {
        return 0.0;
    }
    let mean_a = sum_a / n as f64;
    let mean_b = sum_b / n as f64;

    let mut cross = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for r in rows {
        for c in cols.clone() {
            if let Some((mr, mc)) = in_moving(r, c) {
                let a = reference[[r, c]] as f64 - mean_a;
                let b = moving[[mr, mc]] as f64 - mean_b;
                cross += a * b;
                var_a += a * a;
                var_b += b * b;
            }
        }
    }

    let denom = (var_a * var_b).sqrt();
    if denom < EPSILON {
        0.0
    } else {
        (cross / denom) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_covers_image() {
        let blocks = BlockRegion::grid(10, 7, 3);
        assert_eq!(blocks.len(), 9);
        let area: usize = blocks.iter().map(|b| b.height * b.width).sum();
        assert_eq!(area, 70);
        assert_eq!(blocks[8].height, 4);
        assert_eq!(blocks[8].width, 3);
    }

    #[test]
    fn test_identical_images_peak_at_center() {
        let img = Array2::from_shape_fn((16, 16), |(r, c)| ((r * 13 + c * 7) % 11) as f32);
        let block = BlockRegion {
            row: 4,
            col: 4,
            height: 8,
            width: 8,
        };
        let surface = NccBlockCorrelator.correlate(&img, &img, block, 2);
        assert_eq!(surface.dim(), (5, 5));
        assert!((surface[[2, 2]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_flat_patch_scores_zero() {
        let img = Array2::<f32>::ones((8, 8));
        let block = BlockRegion {
            row: 0,
            col: 0,
            height: 8,
            width: 8,
        };
        let surface = NccBlockCorrelator.correlate(&img, &img, block, 1);
        assert!(surface.iter().all(|&v| v == 0.0));
    }
}
