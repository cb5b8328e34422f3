//! Error types for geometry and resampling operations.

use thiserror::Error;

/// Errors raised by image geometry and resampling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A requested grid size cannot define a spacing.
    #[error("Invalid size: axis {axis} has {count} voxels, need at least 2")]
    InvalidSize { axis: usize, count: usize },

    /// The direction cosine matrix has no inverse.
    #[error("Singular direction matrix: {0}")]
    SingularDirection(String),

    /// Spacing is zero, negative or not finite.
    #[error("Invalid spacing: {0}")]
    InvalidSpacing(String),

    /// Tensor shape does not match what the operation expects.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Unknown interpolation kernel '{0}', expected nearest, linear or bspline")]
    UnknownKernel(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn singular_direction(msg: impl Into<String>) -> Self {
        Self::SingularDirection(msg.into())
    }

    pub fn invalid_spacing(msg: impl Into<String>) -> Self {
        Self::InvalidSpacing(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_size_display() {
        let err = CoreError::InvalidSize { axis: 2, count: 1 };
        assert_eq!(
            err.to_string(),
            "Invalid size: axis 2 has 1 voxels, need at least 2"
        );
    }

    #[test]
    fn test_shape_mismatch_display() {
        let err = CoreError::ShapeMismatch {
            expected: vec![4, 4],
            actual: vec![4, 5],
        };
        let msg = err.to_string();
        assert!(msg.contains("expected"));
        assert!(msg.contains("got"));
    }
}
