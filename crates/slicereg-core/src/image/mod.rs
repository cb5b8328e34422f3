//! Image types and operations.
//!
//! This module provides the Image type and the geometry it carries.

pub mod image;
pub mod metadata;
pub mod grid;

pub use image::Image;
pub use metadata::ImageMetadata;
pub use grid::generate_grid;
