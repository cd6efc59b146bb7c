use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::error::{NanocorrError, Result};

/// A time series of same-sized grayscale frames.
///
/// Shape = (time, height, width). The engine never mutates it.
#[derive(Clone, Debug)]
pub struct FrameStack {
    data: Array3<f32>,
}

impl FrameStack {
    /// Wrap an existing (time, height, width) array.
    pub fn new(data: Array3<f32>) -> Result<Self> {
        let (t, h, w) = data.dim();
        if t == 0 {
            return Err(NanocorrError::EmptySequence);
        }
        if h == 0 || w == 0 {
            return Err(NanocorrError::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        Ok(Self { data })
    }

    /// Build a stack from individual frames, which must all share one size.
    pub fn from_frames(frames: &[Array2<f32>]) -> Result<Self> {
        let first = frames.first().ok_or(NanocorrError::EmptySequence)?;
        let (h, w) = first.dim();

        let mut data = Array3::<f32>::zeros((frames.len(), h, w));
        for (i, frame) in frames.iter().enumerate() {
            if frame.dim() != (h, w) {
                return Err(NanocorrError::DimensionMismatch {
                    expected: format!("{}x{}", w, h),
                    found: format!("{}x{} (frame {})", frame.ncols(), frame.nrows(), i),
                });
            }
            data.index_axis_mut(Axis(0), i).assign(frame);
        }

        Self::new(data)
    }

    pub fn n_frames(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn frame(&self, t: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), t)
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }
}

/// Sub-pixel location of a surface maximum, in the surface's index coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SubpixelOffset {
    pub row: f64,
    pub col: f64,
}

impl SubpixelOffset {
    pub fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }
}

impl From<SubpixelOffset> for (f64, f64) {
    fn from(offset: SubpixelOffset) -> Self {
        (offset.row, offset.col)
    }
}
