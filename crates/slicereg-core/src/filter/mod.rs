//! Image filters.
//!
//! [`ResampleImageFilter`] is the general transform-plus-interpolator
//! resampler; [`reference_grid`] builds on it to put images onto a
//! centered reference grid of a requested voxel count.

pub mod resample;
pub mod reference_grid;

pub use resample::ResampleImageFilter;
pub use reference_grid::{resize_image, resize_image_with_extent, ReferenceExtent, ReferenceGrid};
