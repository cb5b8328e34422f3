use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};

/// Continuous indices of every voxel of a grid with tensor shape `shape`.
///
/// Rows follow row-major tensor order (last tensor axis fastest). Columns
/// are in physical axis order, so column 0 is the fastest-varying index.
///
/// # Returns
/// Tensor of shape `[N, D]` where N is the number of voxels
pub fn generate_grid<B, const D: usize>(shape: [usize; D], device: &B::Device) -> Tensor<B, 2>
where
    B: Backend,
{
    let total: usize = shape.iter().product();
    let mut grid = Vec::with_capacity(total * D);
    let mut counter = [0usize; D];

    for _ in 0..total {
        // counter is in tensor order; emit it reversed
        for axis in (0..D).rev() {
            grid.push(counter[axis] as f32);
        }
        for axis in (0..D).rev() {
            counter[axis] += 1;
            if counter[axis] < shape[axis] {
                break;
            }
            counter[axis] = 0;
        }
    }

    Tensor::<B, 1>::from_data(TensorData::new(grid, Shape::new([total * D])), device)
        .reshape([total, D])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_grid_2d_order() {
        let device = Default::default();
        let grid = generate_grid::<TestBackend, 2>([2, 3], &device);
        assert_eq!(grid.dims(), [6, 2]);
        let values: Vec<f32> = grid.into_data().iter::<f32>().collect();
        // (x, y) pairs with x fastest
        assert_eq!(
            values,
            vec![0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0]
        );
    }

    #[test]
    fn test_grid_3d_last_row() {
        let device = Default::default();
        let grid = generate_grid::<TestBackend, 3>([2, 3, 4], &device);
        assert_eq!(grid.dims(), [24, 3]);
        let values: Vec<f32> = grid.into_data().iter::<f32>().collect();
        assert_eq!(&values[69..72], &[3.0, 2.0, 1.0]);
    }
}
