//! Transform types and operations.
//!
//! This module provides the transform trait and the affine, translation and
//! chained transforms the reference-grid resampler is built from.

pub mod trait_;
pub mod translation;
pub mod affine;
pub mod chained;

pub use trait_::Transform;
pub use translation::TranslationTransform;
pub use affine::AffineTransform;
pub use chained::ChainedTransform;
