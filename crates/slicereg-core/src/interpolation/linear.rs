//! Linear interpolation (bilinear in 2D, trilinear in 3D).

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use serde::{Deserialize, Serialize};
use super::trait_::{axis_layout, Interpolator};

/// Multilinear interpolation over the `2^D` surrounding voxels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LinearInterpolator;

impl LinearInterpolator {
    pub fn new() -> Self {
        Self
    }
}

struct AxisSamples<B: Backend> {
    lower: Tensor<B, 1, Int>,
    upper: Tensor<B, 1, Int>,
    weight: Tensor<B, 1>,
    stride: i32,
}

impl<B: Backend> Interpolator<B> for LinearInterpolator {
    fn interpolate<const D: usize>(&self, data: &Tensor<B, D>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let dims = data.dims();
        let [n, rank] = indices.dims();
        assert_eq!(rank, D, "Index rank must match data dimensionality");

        let total: usize = dims.iter().product();
        let flat_data = data.clone().reshape([total]);

        let axes: Vec<AxisSamples<B>> = axis_layout(&dims)
            .into_iter()
            .enumerate()
            .map(|(axis, (size, stride))| {
                let coord = indices.clone().narrow(1, axis, 1).reshape([n]);
                let floor = coord.clone().floor();
                let max = (size - 1) as f64;
                AxisSamples {
                    weight: coord - floor.clone(),
                    upper: (floor.clone() + 1.0).clamp(0.0, max).int(),
                    lower: floor.clamp(0.0, max).int(),
                    stride: stride as i32,
                }
            })
            .collect();

        let mut result = Tensor::<B, 1>::zeros([n], &indices.device());
        for corner in 0..(1usize << D) {
            let mut flat_idx = Tensor::<B, 1, Int>::zeros([n], &indices.device());
            let mut weight = Tensor::<B, 1>::ones([n], &indices.device());
            for (axis, samples) in axes.iter().enumerate() {
                if corner & (1 << axis) != 0 {
                    flat_idx = flat_idx + samples.upper.clone() * samples.stride;
                    weight = weight * samples.weight.clone();
                } else {
                    flat_idx = flat_idx + samples.lower.clone() * samples.stride;
                    weight = weight * (samples.weight.clone().neg() + 1.0);
                }
            }
            result = result + flat_data.clone().gather(0, flat_idx) * weight;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn sample<const D: usize>(data: Tensor<TestBackend, D>, indices: Tensor<TestBackend, 2>) -> Vec<f32> {
        LinearInterpolator::new()
            .interpolate(&data, indices)
            .into_data()
            .iter::<f32>()
            .collect()
    }

    #[test]
    fn test_linear_1d() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 1>::from_floats([0.0, 10.0, 20.0], &device);
        let indices = Tensor::<TestBackend, 2>::from_floats([[0.5], [1.25], [2.0]], &device);
        let out = sample(data, indices);
        assert!((out[0] - 5.0).abs() < 1e-5);
        assert!((out[1] - 12.5).abs() < 1e-5);
        assert!((out[2] - 20.0).abs() < 1e-5);
    }

    #[test]
    fn test_bilinear_center() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 2>::from_floats([[0.0, 1.0], [2.0, 3.0]], &device);
        let indices = Tensor::<TestBackend, 2>::from_floats([[0.5, 0.5], [1.0, 0.0], [0.0, 1.0]], &device);
        let out = sample(data, indices);
        assert!((out[0] - 1.5).abs() < 1e-5);
        assert!((out[1] - 1.0).abs() < 1e-5);
        assert!((out[2] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_trilinear_matches_linear_ramp() {
        let device = Default::default();
        // value = x + 10 y + 100 z on a [2, 3, 4] grid
        let mut values = Vec::new();
        for z in 0..2 {
            for y in 0..3 {
                for x in 0..4 {
                    values.push((x + 10 * y + 100 * z) as f32);
                }
            }
        }
        let data = Tensor::<TestBackend, 1>::from_floats(values.as_slice(), &device).reshape([2, 3, 4]);
        let indices = Tensor::<TestBackend, 2>::from_floats([[1.5, 0.25, 0.5]], &device);
        let out = sample(data, indices);
        assert!((out[0] - (1.5 + 2.5 + 50.0)).abs() < 1e-4);
    }

    #[test]
    fn test_integer_indices_are_exact() {
        let device = Default::default();
        let data = Tensor::<TestBackend, 2>::from_floats([[7.0, 8.0, 9.0], [4.0, 5.0, 6.0]], &device);
        let indices = Tensor::<TestBackend, 2>::from_floats([[2.0, 1.0], [0.0, 0.0]], &device);
        assert_eq!(sample(data, indices), vec![6.0, 7.0]);
    }
}
