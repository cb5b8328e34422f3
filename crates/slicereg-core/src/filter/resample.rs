//! Resample image filter.
//!
//! This module provides ResampleImageFilter which resamples an image
//! into a new coordinate system using a transform and an interpolator.

use std::marker::PhantomData;
use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor};
use crate::image::{generate_grid, Image, ImageMetadata};
use crate::interpolation::trait_::Interpolator;
use crate::transform::trait_::Transform;

/// Resample image filter.
///
/// Resamples an image by applying a transform to map points from the
/// output image space to the input image space, and then interpolating values.
///
/// The transform maps from Output Physical Space -> Input Physical Space.
///
/// # Type Parameters
/// * `B` - The Burn backend
/// * `T` - The transform type
/// * `I` - The interpolator type
/// * `D` - The dimensionality (2 or 3)
pub struct ResampleImageFilter<B, T, I, const D: usize>
where
    B: Backend,
    T: Transform<B, D>,
    I: Interpolator<B>,
{
    size: [usize; D],
    metadata: ImageMetadata<D>,
    transform: T,
    interpolator: I,
    _phantom: PhantomData<B>,
}

impl<B, T, I, const D: usize> ResampleImageFilter<B, T, I, D>
where
    B: Backend,
    T: Transform<B, D>,
    I: Interpolator<B>,
{
    /// Create a new resample filter.
    ///
    /// # Arguments
    /// * `size` - Output image size in physical axis order
    /// * `metadata` - Output origin, spacing and direction
    /// * `transform` - Transform from output space to input space
    /// * `interpolator` - Interpolator for input image sampling
    pub fn new(size: [usize; D], metadata: ImageMetadata<D>, transform: T, interpolator: I) -> Self {
        Self {
            size,
            metadata,
            transform,
            interpolator,
            _phantom: PhantomData,
        }
    }

    /// Apply filter to an input image.
    pub fn apply(&self, input: &Image<B, D>) -> Image<B, D> {
        let device = input.data().device();
        let mut shape = self.size;
        shape.reverse();

        // 1. Continuous indices of every output voxel
        let output_indices = generate_grid::<B, D>(shape, &device);

        // 2. Output indices -> output physical points
        let output_points = self.metadata.index_to_world_tensor(output_indices);

        // 3. Output physical points -> input physical points
        let input_points = self.transform.transform_points(output_points);

        // 4. Input physical points -> input continuous indices
        let input_indices = input.world_to_index_tensor(input_points);

        // 5. Sample, then zero everything outside the input buffer
        let outside = outside_mask(&input_indices, input.size());
        let values = self
            .interpolator
            .interpolate(input.data(), input_indices)
            .mask_fill(outside, 0.0);

        // 6. Reshape to output size
        let output_data = values.reshape(Shape::new(shape));

        Image::new(
            output_data,
            *self.metadata.origin(),
            *self.metadata.spacing(),
            *self.metadata.direction(),
        )
    }
}

/// True where a continuous index lies outside `[-0.5, size - 0.5)` on any axis.
fn outside_mask<B: Backend, const D: usize>(
    indices: &Tensor<B, 2>,
    size: [usize; D],
) -> Tensor<B, 1, burn::tensor::Bool> {
    let [n, _] = indices.dims();
    let mut inside = Tensor::<B, 1>::ones([n], &indices.device());
    for (axis, &len) in size.iter().enumerate() {
        let coord = indices.clone().narrow(1, axis, 1).reshape([n]);
        let lower = coord.clone().greater_equal_elem(-0.5).float();
        let upper = coord.lower_elem(len as f32 - 0.5).float();
        inside = inside * lower * upper;
    }
    inside.lower_elem(0.5)
}
