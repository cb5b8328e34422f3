//! Interpolator trait for sampling values at continuous coordinates.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Samples a tensor at continuous (non-integer) indices.
///
/// Implementations clamp to the nearest edge voxel; callers that need a
/// fill value outside the buffer mask the result themselves.
///
/// # Type Parameters
/// * `B` - The Burn backend
pub trait Interpolator<B: Backend> {
    /// Interpolate values from a tensor at given continuous indices.
    ///
    /// # Arguments
    /// * `data` - Source tensor, slowest axis first (`[D, H, W]` or `[H, W]`)
    /// * `indices` - `[Batch, Rank]` continuous indices in physical axis
    ///   order (column 0 indexes the last tensor axis)
    ///
    /// # Returns
    /// Tensor of sampled values `[Batch]`
    fn interpolate<const D: usize>(&self, data: &Tensor<B, D>, indices: Tensor<B, 2>) -> Tensor<B, 1>;
}

/// Per physical axis: `(size, stride)` into the flattened tensor.
pub(crate) fn axis_layout(dims: &[usize]) -> Vec<(usize, usize)> {
    let rank = dims.len();
    (0..rank)
        .map(|axis| {
            let tensor_axis = rank - 1 - axis;
            let stride: usize = dims[tensor_axis + 1..].iter().product();
            (dims[tensor_axis], stride)
        })
        .collect()
}
