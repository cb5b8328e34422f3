//! Images with physical geometry, spatial transforms, interpolation kernels
//! and reference-grid resampling on top of Burn tensors.

pub mod error;
pub mod image;
pub mod spatial;
pub mod transform;
pub mod interpolation;
pub mod filter;

pub use error::{CoreError, Result};
pub use image::{Image, ImageMetadata};
pub use spatial::{Point, Vector, Spacing, Direction};
pub use interpolation::InterpolationKernel;
pub use filter::{resize_image, resize_image_with_extent, ReferenceExtent, ReferenceGrid};
