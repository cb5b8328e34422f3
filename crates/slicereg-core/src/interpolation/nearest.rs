//! Nearest neighbor interpolation.
//!
//! The kernel to use for label and segmentation images: every output value
//! is copied from some input voxel, so no new labels appear.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use super::trait_::{axis_layout, Interpolator};

/// Rounds each continuous index to the nearest voxel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborInterpolator;

impl NearestNeighborInterpolator {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Interpolator<B> for NearestNeighborInterpolator {
    fn interpolate<const D: usize>(&self, data: &Tensor<B, D>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let dims = data.dims();
        let [n, rank] = indices.dims();
        assert_eq!(rank, D, "Index rank must match data dimensionality");

        let total: usize = dims.iter().product();
        let flat_data = data.clone().reshape([total]);

        let mut flat_idx = Tensor::<B, 1, Int>::zeros([n], &indices.device());
        for (axis, (size, stride)) in axis_layout(&dims).into_iter().enumerate() {
            let coord = indices.clone().narrow(1, axis, 1).reshape([n]);
            let index = coord.round().clamp(0.0, (size - 1) as f64).int();
            flat_idx = flat_idx + index * stride as i32;
        }

        flat_data.gather(0, flat_idx)
    }
}
