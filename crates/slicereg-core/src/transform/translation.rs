//! Translation transform implementation.

use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use super::trait_::Transform;
use crate::spatial::Vector;

/// Translates points by a fixed offset: T(x) = x + t.
#[derive(Module, Debug)]
pub struct TranslationTransform<B: Backend, const D: usize> {
    translation: Param<Tensor<B, 1>>,
}

impl<B: Backend, const D: usize> TranslationTransform<B, D> {
    /// # Arguments
    /// * `translation` - Tensor of shape `[D]`
    pub fn new(translation: Tensor<B, 1>) -> Self {
        Self {
            translation: Param::from_tensor(translation),
        }
    }

    pub fn from_vector(offset: &Vector<D>, device: &B::Device) -> Self {
        Self::new(Tensor::<B, 1>::from_data(
            TensorData::new(offset.to_f32_vec(), Shape::new([D])),
            device,
        ))
    }

    pub fn translation(&self) -> Tensor<B, 1> {
        self.translation.val()
    }
}

impl<B: Backend, const D: usize> Transform<B, D> for TranslationTransform<B, D> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        points + self.translation.val().reshape([1, D])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_translation_transform() {
        let device = Default::default();
        let transform = TranslationTransform::<TestBackend, 3>::from_vector(&Vector::new([1.0, 2.0, 3.0]), &device);
        let points = Tensor::<TestBackend, 2>::from_floats([[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]], &device);

        let out: Vec<f32> = transform.transform_points(points).into_data().iter::<f32>().collect();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 2.0, 3.0, 4.0]);
    }
}
