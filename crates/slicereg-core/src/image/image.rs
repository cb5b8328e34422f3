//! Image type with physical metadata and coordinate transformations.
//!
//! Tensor axes are stored slowest-first (`[z, y, x]` for volumes) while every
//! geometric quantity (size, spacing, origin, index columns) is expressed in
//! physical axis order (`x, y, z`).

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use crate::error::{CoreError, Result};
use crate::image::metadata::ImageMetadata;
use crate::spatial::{Direction, Point, Spacing, Vector};

/// Medical image with physical metadata.
///
/// # Type Parameters
/// * `B` - The backend (CPU or GPU) for tensor operations
/// * `D` - The dimensionality of the image (2 or 3)
///
/// # Examples
/// ```rust
/// use slicereg_core::Image;
/// use slicereg_core::spatial::{Point3, Spacing3, Direction3};
/// use burn::tensor::Tensor;
/// use burn_ndarray::NdArray;
///
/// type Backend = NdArray<f32>;
///
/// let device = Default::default();
/// let data = Tensor::<Backend, 3>::zeros([4, 6, 8], &device);
/// let image = Image::new(data, Point3::origin(), Spacing3::uniform(1.0), Direction3::identity());
/// assert_eq!(image.size(), [8, 6, 4]);
/// ```
#[derive(Debug, Clone)]
pub struct Image<B: Backend, const D: usize> {
    data: Tensor<B, D>,
    origin: Point<D>,
    spacing: Spacing<D>,
    direction: Direction<D>,
}

impl<B: Backend, const D: usize> Image<B, D> {
    pub fn new(
        data: Tensor<B, D>,
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Self {
        Self {
            data,
            origin,
            spacing,
            direction,
        }
    }

    /// Build an image from a flat, row-major buffer.
    ///
    /// `shape` is in tensor order (slowest axis first).
    pub fn from_vec(
        values: Vec<f32>,
        shape: [usize; D],
        metadata: &ImageMetadata<D>,
        device: &B::Device,
    ) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(CoreError::ShapeMismatch {
                expected: shape.to_vec(),
                actual: vec![values.len()],
            });
        }
        let data = Tensor::<B, D>::from_data(TensorData::new(values, Shape::new(shape)), device);
        Ok(Self::new(
            data,
            *metadata.origin(),
            *metadata.spacing(),
            *metadata.direction(),
        ))
    }

    pub fn data(&self) -> &Tensor<B, D> {
        &self.data
    }

    pub fn into_data(self) -> Tensor<B, D> {
        self.data
    }

    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    /// Geometry of this image without its voxel data.
    pub fn metadata(&self) -> ImageMetadata<D> {
        ImageMetadata::new(self.origin, self.spacing, self.direction)
    }

    /// Tensor shape, slowest axis first.
    pub fn shape(&self) -> [usize; D] {
        self.data.shape().dims.try_into().expect("Tensor rank mismatch")
    }

    /// Voxel counts in physical axis order (x first).
    pub fn size(&self) -> [usize; D] {
        let mut size = self.shape();
        size.reverse();
        size
    }

    pub fn num_voxels(&self) -> usize {
        self.shape().iter().product()
    }

    /// Voxel values in row-major tensor order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.to_data().iter::<f32>().collect()
    }

    /// Replace the voxel data, keeping the geometry.
    pub fn with_data(&self, data: Tensor<B, D>) -> Self {
        Self::new(data, self.origin, self.spacing, self.direction)
    }

    /// Physical distance from the first to the last voxel center per axis.
    pub fn physical_extent(&self) -> Vector<D> {
        self.metadata().physical_extent(self.size())
    }

    /// Physical location of the continuous index `size / 2`.
    pub fn physical_center(&self) -> Point<D> {
        self.metadata().physical_center(self.size())
    }

    /// Check that spacing is usable and the direction is invertible.
    pub fn validate_geometry(&self) -> Result<()> {
        self.metadata().validate()
    }

    /// Convert a continuous physical point to a continuous index.
    ///
    /// `index = (Direction^-1 * (point - origin)) / spacing`
    ///
    /// Panics when the direction matrix is singular; call
    /// [`validate_geometry`](Self::validate_geometry) first for untrusted input.
    pub fn transform_physical_point_to_continuous_index(&self, point: &Point<D>) -> Point<D> {
        let diff = *point - self.origin;
        let inv_dir = self.direction.try_inverse().expect("Direction matrix must be invertible");
        let rotated = inv_dir * diff;

        let mut index = Point::<D>::origin();
        for i in 0..D {
            index[i] = rotated[i] / self.spacing[i];
        }
        index
    }

    /// Convert a continuous index to a physical point.
    ///
    /// `point = origin + Direction * (index * spacing)`
    pub fn transform_continuous_index_to_physical_point(&self, index: &Point<D>) -> Point<D> {
        self.metadata().index_to_physical(index)
    }

    /// Batch version of
    /// [`transform_physical_point_to_continuous_index`](Self::transform_physical_point_to_continuous_index).
    ///
    /// # Arguments
    /// * `points` - Tensor of shape `[Batch, D]` holding physical points
    ///
    /// # Returns
    /// Tensor of shape `[Batch, D]` holding continuous indices
    pub fn world_to_index_tensor(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();
        let origin_tensor = Tensor::<B, 1>::from_data(
            TensorData::new(self.origin.to_f32_vec(), Shape::new([D])),
            &device,
        )
        .reshape([1, D]);

        // I = (P - O) @ T with T[r, c] = (D^-1)[c, r] / S[c]
        let inv_dir = self.direction.try_inverse().expect("Direction matrix must be invertible");
        let mut t_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                t_data.push((inv_dir[(c, r)] / self.spacing[c]) as f32);
            }
        }
        let t_tensor = Tensor::<B, 2>::from_data(TensorData::new(t_data, Shape::new([D, D])), &device);

        (points - origin_tensor).matmul(t_tensor)
    }

    /// Batch version of
    /// [`transform_continuous_index_to_physical_point`](Self::transform_continuous_index_to_physical_point).
    pub fn index_to_world_tensor(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        self.metadata().index_to_world_tensor(indices)
    }
}
