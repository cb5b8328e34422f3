//! Direction cosine matrix describing image orientation.

use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};
use super::Vector;

/// Orientation of the image axes in physical space.
///
/// Column `i` is the unit direction of image axis `i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction<const D: usize>(pub SMatrix<f64, D, D>);

impl<const D: usize> Direction<D> {
    pub fn identity() -> Self {
        Self(SMatrix::identity())
    }

    pub fn zeros() -> Self {
        Self(SMatrix::zeros())
    }

    /// Build from `D * D` values in row-major order.
    pub fn from_row_slice(values: &[f64]) -> Self {
        assert!(values.len() == D * D, "Direction needs D*D values");
        Self(SMatrix::from_row_slice(values))
    }

    /// Row-major `f32` values, ready for tensor construction.
    pub fn to_f32_row_major(&self) -> Vec<f32> {
        let mut values = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                values.push(self.0[(r, c)] as f32);
            }
        }
        values
    }

    pub fn is_identity(&self) -> bool {
        (self.0 - SMatrix::<f64, D, D>::identity()).abs().max() < 1e-9
    }

    pub fn try_inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }
}

impl<const D: usize> std::ops::Index<(usize, usize)> for Direction<D> {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::IndexMut<(usize, usize)> for Direction<D> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const D: usize> std::ops::Mul for Direction<D> {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        Self(self.0 * other.0)
    }
}

impl<const D: usize> std::ops::Mul<Vector<D>> for Direction<D> {
    type Output = Vector<D>;

    fn mul(self, vector: Vector<D>) -> Self::Output {
        Vector(self.0 * vector.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Direction3 = Direction<3>;
    type Vector3 = Vector<3>;

    fn rotation_z_90() -> Direction3 {
        Direction3::from_row_slice(&[
            0.0, -1.0, 0.0,
            1.0, 0.0, 0.0,
            0.0, 0.0, 1.0,
        ])
    }

    #[test]
    fn test_direction_identity() {
        let d = Direction3::identity();
        assert!(d.is_identity());
        assert!(d.try_inverse().unwrap().is_identity());
    }

    #[test]
    fn test_rotation_properties() {
        let rot = rotation_z_90();
        assert!(!rot.is_identity());
        // image axis 0 maps onto +y
        assert_eq!(rot * Vector3::new([1.0, 0.0, 0.0]), Vector3::new([0.0, 1.0, 0.0]));

        let inv = rot.try_inverse().unwrap();
        assert!((inv * rot).is_identity());
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert!(Direction3::zeros().try_inverse().is_none());
    }

    #[test]
    fn test_row_major_export() {
        let values = rotation_z_90().to_f32_row_major();
        assert_eq!(values, vec![0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }
}
