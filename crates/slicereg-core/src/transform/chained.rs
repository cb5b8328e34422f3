//! Composition of two transforms: T(x) = second(first(x)).

use std::marker::PhantomData;
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use super::trait_::Transform;

/// Applies `first`, then `second`.
///
/// The reference-grid resampler chains its centering translation (first)
/// with the direction/origin affine (second).
#[derive(Module, Debug)]
pub struct ChainedTransform<B: Backend, T1, T2, const D: usize> {
    pub first: T1,
    pub second: T2,
    pub _phantom: PhantomData<B>,
}

impl<B: Backend, T1, T2, const D: usize> ChainedTransform<B, T1, T2, D> {
    pub fn new(first: T1, second: T2) -> Self {
        Self {
            first,
            second,
            _phantom: PhantomData,
        }
    }
}

impl<B: Backend, T1, T2, const D: usize> Transform<B, D> for ChainedTransform<B, T1, T2, D>
where
    T1: Transform<B, D> + Module<B>,
    T2: Transform<B, D> + Module<B>,
{
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        self.second.transform_points(self.first.transform_points(points))
    }
}
