//! Image geometry independent of voxel data.
//!
//! [`ImageMetadata`] carries origin, spacing and direction. Together with a
//! size it fully describes a sampling grid, which is what the reference-grid
//! resampler builds before any voxel exists.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use serde::{Deserialize, Serialize};
use crate::error::{CoreError, Result};
use crate::spatial::{Direction, Point, Spacing, Vector};

/// Physical-space description of an image grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata<const D: usize> {
    origin: Point<D>,
    spacing: Spacing<D>,
    direction: Direction<D>,
}

impl<const D: usize> ImageMetadata<D> {
    pub fn new(origin: Point<D>, spacing: Spacing<D>, direction: Direction<D>) -> Self {
        Self {
            origin,
            spacing,
            direction,
        }
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

    pub fn validate(&self) -> Result<()> {
        if !self.spacing.is_valid() {
            return Err(CoreError::invalid_spacing(format!("{:?}", self.spacing.to_vec())));
        }
        if self.direction.try_inverse().is_none() {
            return Err(CoreError::singular_direction(format!("{:?}", self.direction.0)));
        }
        Ok(())
    }

    /// `(size - 1) * spacing` per axis; `size` is in physical axis order.
    pub fn physical_extent(&self, size: [usize; D]) -> Vector<D> {
        let mut extent = Vector::zeros();
        for i in 0..D {
            extent[i] = size[i].saturating_sub(1) as f64 * self.spacing[i];
        }
        extent
    }

    /// Physical point of the continuous index `size / 2`.
    pub fn physical_center(&self, size: [usize; D]) -> Point<D> {
        let mut index = Point::origin();
        for i in 0..D {
            index[i] = size[i] as f64 / 2.0;
        }
        self.index_to_physical(&index)
    }

    /// `point = origin + Direction * (index * spacing)`
    pub fn index_to_physical(&self, index: &Point<D>) -> Point<D> {
        let scaled = index.coords().component_mul(&self.spacing);
        self.origin + self.direction * scaled
    }

    /// Map a `[Batch, D]` tensor of continuous indices to physical points.
    pub fn index_to_world_tensor<B: Backend>(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = indices.device();
        let origin_tensor = Tensor::<B, 1>::from_data(
            TensorData::new(self.origin.to_f32_vec(), Shape::new([D])),
            &device,
        )
        .reshape([1, D]);

        // P = O + I @ M with M[r, c] = S[r] * Dir[c, r]
        let mut m_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                m_data.push((self.spacing[r] * self.direction[(c, r)]) as f32);
            }
        }
        let m_tensor = Tensor::<B, 2>::from_data(TensorData::new(m_data, Shape::new([D, D])), &device);

        indices.matmul(m_tensor) + origin_tensor
    }
}

impl<const D: usize> Default for ImageMetadata<D> {
    /// Zero origin, unit spacing, identity direction.
    fn default() -> Self {
        Self {
            origin: Point::origin(),
            spacing: Spacing::uniform(1.0),
            direction: Direction::identity(),
        }
    }
}
