//! Error types for array summaries and raster output.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Requested {requested} components but the array depth is {depth}")]
    TooManyComponents { requested: usize, depth: usize },

    #[error("Need at least 2 spatial samples, got {0}")]
    InsufficientSamples(usize),

    #[error("Shape mismatch: expected {expected}, got {actual:?}")]
    ShapeMismatch { expected: String, actual: Vec<usize> },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    pub fn shape_mismatch(expected: impl Into<String>, actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.to_vec(),
        }
    }
}
