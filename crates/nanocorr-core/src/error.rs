use thiserror::Error;

#[derive(Error, Debug)]
pub enum NanocorrError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: String, found: String },

    #[error("Empty frame sequence")]
    EmptySequence,
}

pub type Result<T> = std::result::Result<T, NanocorrError>;
