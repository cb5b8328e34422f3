use burn::{
    module::Module,
    tensor::{backend::Backend, Tensor},
};
use std::marker::PhantomData;
use crate::interpolation::bilinear_interpolation;

/// Warps an image by a dense displacement field given in voxels.
#[derive(Module, Debug)]
pub struct SpatialTransformer<B: Backend> {
    phantom: PhantomData<B>,
}

impl<B: Backend> SpatialTransformer<B> {
    pub fn new() -> Self {
        Self { phantom: PhantomData }
    }

    /// # Arguments
    /// * `image` - [B, C, H, W]
    /// * `flow` - [B, 2, H, W], channel 0 is the row offset and channel 1 the column offset
    pub fn forward(&self, image: Tensor<B, 4>, flow: Tensor<B, 4>) -> Tensor<B, 4> {
        let [b, _c, h, w] = flow.dims();
        let device = flow.device();

        let flow_h = flow.clone().slice([0..b, 0..1, 0..h, 0..w]);
        let flow_w = flow.slice([0..b, 1..2, 0..h, 0..w]);

        // Broadcastable coordinate ramps instead of a full identity grid
        let h_range = Tensor::arange(0..h as i64, &device).float().reshape([1, 1, h, 1]);
        let w_range = Tensor::arange(0..w as i64, &device).float().reshape([1, 1, 1, w]);

        let sampling_grid = Tensor::cat(vec![flow_h + h_range, flow_w + w_range], 1);
        bilinear_interpolation(image, sampling_grid)
    }
}

impl<B: Backend> Default for SpatialTransformer<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Distribution;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_zero_flow_is_identity() {
        let device = Default::default();
        let image = Tensor::<TestBackend, 4>::random([1, 2, 5, 7], Distribution::Normal(0.0, 1.0), &device);
        let flow = Tensor::<TestBackend, 4>::zeros([1, 2, 5, 7], &device);

        let warped = SpatialTransformer::new().forward(image.clone(), flow);
        let a: Vec<f32> = image.into_data().iter::<f32>().collect();
        let b: Vec<f32> = warped.into_data().iter::<f32>().collect();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_unit_column_shift() {
        let device = Default::default();
        let image = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], &device)
            .reshape([1, 1, 2, 3]);
        let rows = Tensor::<TestBackend, 4>::zeros([1, 1, 2, 3], &device);
        let cols = Tensor::<TestBackend, 4>::ones([1, 1, 2, 3], &device);
        let flow = Tensor::cat(vec![rows, cols], 1);

        let warped: Vec<f32> = SpatialTransformer::new()
            .forward(image, flow)
            .into_data()
            .iter::<f32>()
            .collect();
        assert_eq!(warped, vec![2.0, 3.0, 0.0, 5.0, 6.0, 0.0]);
    }
}
