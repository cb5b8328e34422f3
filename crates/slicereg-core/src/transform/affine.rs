//! Affine transform implementation.

use burn::module::{Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use nalgebra::{SMatrix, SVector};
use super::trait_::Transform;
use crate::spatial::{Direction, Point, Vector};

/// Affine Transform (linear map + translation) about a fixed center:
///
/// T(x) = A(x - c) + c + t
///
/// * A is a D×D matrix (rotation, scale, shear)
/// * t is the translation
/// * c is the fixed center
#[derive(Module, Debug)]
pub struct AffineTransform<B: Backend, const D: usize> {
    matrix: Param<Tensor<B, 2>>,
    translation: Param<Tensor<B, 1>>,
    center: Tensor<B, 1>,
}

impl<B: Backend, const D: usize> AffineTransform<B, D> {
    /// # Arguments
    /// * `matrix` - Tensor of shape `[D, D]`, row-major `A`
    /// * `translation` - Tensor of shape `[D]`
    /// * `center` - Tensor of shape `[D]`
    pub fn new(matrix: Tensor<B, 2>, translation: Tensor<B, 1>, center: Tensor<B, 1>) -> Self {
        Self {
            matrix: Param::from_tensor(matrix),
            translation: Param::from_tensor(translation),
            center,
        }
    }

    /// Affine whose linear part is an image direction matrix, centered at the origin.
    ///
    /// This is the map from a zero-origin, identity-direction grid into the
    /// physical frame of an image with `direction` and origin offset `translation`.
    pub fn from_direction(direction: &Direction<D>, translation: &Vector<D>, device: &B::Device) -> Self {
        let matrix = Tensor::<B, 2>::from_data(
            TensorData::new(direction.to_f32_row_major(), Shape::new([D, D])),
            device,
        );
        let translation = Tensor::<B, 1>::from_data(
            TensorData::new(translation.to_f32_vec(), Shape::new([D])),
            device,
        );
        Self::new(matrix, translation, Tensor::zeros([D], device))
    }

    pub fn matrix(&self) -> Tensor<B, 2> {
        self.matrix.val()
    }

    pub fn translation(&self) -> Tensor<B, 1> {
        self.translation.val()
    }

    pub fn center(&self) -> Tensor<B, 1> {
        self.center.clone()
    }

    fn host_parameters(&self) -> (SMatrix<f64, D, D>, SVector<f64, D>, SVector<f64, D>) {
        let matrix: Vec<f64> = self.matrix.val().into_data().iter::<f64>().collect();
        let translation: Vec<f64> = self.translation.val().into_data().iter::<f64>().collect();
        let center: Vec<f64> = self.center.clone().into_data().iter::<f64>().collect();
        (
            SMatrix::from_row_slice(&matrix),
            SVector::from_column_slice(&translation),
            SVector::from_column_slice(&center),
        )
    }

    /// Apply the transform to a single host-side point.
    pub fn transform_point(&self, point: &Point<D>) -> Point<D> {
        let (a, t, c) = self.host_parameters();
        let y = a * (point.0.coords - c) + c + t;
        Point(y.into())
    }

    /// Apply the inverse transform to a single host-side point.
    ///
    /// x = A^-1 (y - c - t) + c. Returns `None` for a singular matrix.
    pub fn inverse_transform_point(&self, point: &Point<D>) -> Option<Point<D>> {
        let (a, t, c) = self.host_parameters();
        let a_inv = a.try_inverse()?;
        let x = a_inv * (point.0.coords - c - t) + c;
        Some(Point(x.into()))
    }
}

impl<B: Backend, const D: usize> Transform<B, D> for AffineTransform<B, D> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        // Row-vector form: y = (x - c) @ A^T + c + t
        let c = self.center.clone().reshape([1, D]);
        let t = self.translation.val().reshape([1, D]);
        let a = self.matrix.val();

        let centered = points - c.clone();
        centered.matmul(a.transpose()) + c + t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn values(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().iter::<f32>().collect()
    }

    #[test]
    fn test_affine_identity() {
        let device = Default::default();
        let transform = AffineTransform::<TestBackend, 3>::new(
            Tensor::eye(3, &device),
            Tensor::zeros([3], &device),
            Tensor::zeros([3], &device),
        );
        let points = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], &device);
        assert_eq!(values(transform.transform_points(points)), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_affine_scale_with_center() {
        let device = Default::default();
        let matrix = Tensor::<TestBackend, 2>::eye(2, &device) * 2.0;
        let translation = Tensor::<TestBackend, 1>::zeros([2], &device);
        let center = Tensor::<TestBackend, 1>::from_floats([1.0, 1.0], &device);
        let transform = AffineTransform::<TestBackend, 2>::new(matrix, translation, center);

        // (2,1) is one unit right of center -> two units right of center
        let out = values(transform.transform_points(Tensor::from_floats([[2.0, 1.0]], &device)));
        assert!((out[0] - 3.0).abs() < 1e-6);
        assert!((out[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_direction_rotates_then_translates() {
        let device = Default::default();
        let direction = Direction::<2>::from_row_slice(&[0.0, -1.0, 1.0, 0.0]);
        let transform = AffineTransform::<TestBackend, 2>::from_direction(
            &direction,
            &Vector::new([10.0, 20.0]),
            &device,
        );
        let out = values(transform.transform_points(Tensor::from_floats([[1.0, 0.0]], &device)));
        assert!((out[0] - 10.0).abs() < 1e-6);
        assert!((out[1] - 21.0).abs() < 1e-6);

        let host = transform.transform_point(&Point::new([1.0, 0.0]));
        assert!((host[0] - 10.0).abs() < 1e-9);
        assert!((host[1] - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverse_point_roundtrip() {
        let device = Default::default();
        let direction = Direction::<3>::from_row_slice(&[
            0.0, -1.0, 0.0,
            1.0, 0.0, 0.0,
            0.0, 0.0, 1.0,
        ]);
        let transform = AffineTransform::<TestBackend, 3>::from_direction(
            &direction,
            &Vector::new([1.0, -2.0, 3.0]),
            &device,
        );
        let p = Point::new([4.0, 5.0, 6.0]);
        let back = transform.inverse_transform_point(&transform.transform_point(&p)).unwrap();
        for i in 0..3 {
            assert!((back[i] - p[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        let device = Default::default();
        let matrix = Tensor::<TestBackend, 2>::zeros([2, 2], &device);
        let transform = AffineTransform::<TestBackend, 2>::new(
            matrix,
            Tensor::zeros([2], &device),
            Tensor::zeros([2], &device),
        );
        assert!(transform.inverse_transform_point(&Point::origin()).is_none());
    }
}
