//! Resampling onto a zero-origin, identity-direction reference grid.
//!
//! The reference grid has a caller-chosen voxel count and covers the physical
//! extent of the source image, or a larger extent accumulated across several
//! images. The source is positioned so that both physical centers coincide.

use burn::tensor::backend::Backend;
use tracing::debug;
use crate::error::{CoreError, Result};
use crate::image::{Image, ImageMetadata};
use crate::interpolation::InterpolationKernel;
use crate::spatial::{Direction, Point, Spacing, Vector};
use crate::transform::{AffineTransform, ChainedTransform, TranslationTransform};
use super::resample::ResampleImageFilter;

/// Running per-axis maximum of physical extents.
///
/// Start from [`ReferenceExtent::new`] (all zeros) and pass the same value to
/// successive [`resize_image_with_extent`] calls to put every image on a
/// grid large enough for all of them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceExtent<const D: usize> {
    extent: Vector<D>,
}

impl<const D: usize> ReferenceExtent<D> {
    pub fn new() -> Self {
        Self {
            extent: Vector::zeros(),
        }
    }

    /// Fold in another extent and return the updated maximum.
    pub fn update(&mut self, extent: &Vector<D>) -> Vector<D> {
        self.extent = self.extent.sup(extent);
        self.extent
    }

    pub fn extent(&self) -> &Vector<D> {
        &self.extent
    }
}

impl<const D: usize> Default for ReferenceExtent<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Geometry of the grid an image is resampled onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceGrid<const D: usize> {
    size: [usize; D],
    metadata: ImageMetadata<D>,
}

impl<const D: usize> ReferenceGrid<D> {
    /// `size` is in physical axis order and must be at least 2 on every axis.
    /// Every axis of `extent` must be positive, otherwise the grid collapses
    /// onto a single plane.
    pub fn new(size: [usize; D], extent: &Vector<D>) -> Result<Self> {
        validate_size(size)?;
        let spacing = Spacing::from_extent(extent, size);
        if !spacing.is_valid() {
            return Err(CoreError::invalid_spacing(format!(
                "extent {:?} gives spacing {:?}",
                extent.to_vec(),
                spacing.to_vec()
            )));
        }
        let metadata = ImageMetadata::new(Point::origin(), spacing, Direction::identity());
        Ok(Self { size, metadata })
    }

    pub fn size(&self) -> [usize; D] {
        self.size
    }

    pub fn metadata(&self) -> &ImageMetadata<D> {
        &self.metadata
    }

    pub fn spacing(&self) -> &Spacing<D> {
        self.metadata.spacing()
    }

    pub fn physical_center(&self) -> Point<D> {
        self.metadata.physical_center(self.size)
    }
}

fn validate_size<const D: usize>(size: [usize; D]) -> Result<()> {
    match size.iter().position(|&count| count < 2) {
        Some(axis) => Err(CoreError::InvalidSize {
            axis,
            count: size[axis],
        }),
        None => Ok(()),
    }
}

/// Resample `image` onto a reference grid of `size` voxels covering its own extent.
///
/// `size` is in physical axis order. Use [`InterpolationKernel::Nearest`] for
/// label images.
pub fn resize_image<B: Backend, const D: usize>(
    image: &Image<B, D>,
    size: [usize; D],
    kernel: InterpolationKernel,
) -> Result<Image<B, D>> {
    let mut extent = ReferenceExtent::new();
    resize_image_with_extent(image, size, kernel, &mut extent)
}

/// Like [`resize_image`], but the grid covers `max(extent, image extent)`
/// per axis and `extent` is updated to that maximum.
pub fn resize_image_with_extent<B: Backend, const D: usize>(
    image: &Image<B, D>,
    size: [usize; D],
    kernel: InterpolationKernel,
    extent: &mut ReferenceExtent<D>,
) -> Result<Image<B, D>> {
    validate_size(size)?;
    image.validate_geometry()?;

    let device = image.data().device();
    let reference_extent = extent.update(&image.physical_extent());
    let grid = ReferenceGrid::new(size, &reference_extent)?;
    debug!(
        source_size = ?image.size(),
        target_size = ?size,
        extent = ?reference_extent.to_vec(),
        spacing = ?grid.spacing().to_vec(),
        "Building reference grid"
    );

    // reference frame -> source frame
    let origin_offset = *image.origin() - *grid.metadata().origin();
    let affine = AffineTransform::<B, D>::from_direction(image.direction(), &origin_offset, &device);

    let source_center = image.physical_center();
    let grid_center = grid.physical_center();
    let mapped_center = affine
        .inverse_transform_point(&source_center)
        .ok_or_else(|| CoreError::singular_direction("source direction is not invertible"))?;
    let centering = TranslationTransform::<B, D>::from_vector(&(mapped_center - grid_center), &device);

    let transform = ChainedTransform::new(centering, affine);
    let filter = ResampleImageFilter::new(size, *grid.metadata(), transform, kernel);
    Ok(filter.apply(image))
}
