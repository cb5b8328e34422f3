//! Vector type for displacements, offsets and per-axis quantities.

use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// A vector in D-dimensional space.
///
/// Also backs [`Spacing`](super::Spacing) and physical extents, both of
/// which are per-axis quantities in physical axis order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector<const D: usize>(pub SVector<f64, D>);

impl<const D: usize> Vector<D> {
    pub fn new(components: [f64; D]) -> Self {
        Self(SVector::from(components))
    }

    pub fn zeros() -> Self {
        Self(SVector::zeros())
    }

    /// Create a vector from a slice whose length must equal `D`.
    pub fn from_slice(components: &[f64]) -> Self {
        assert!(components.len() == D, "Component slice length must match dimension");
        Self(SVector::from_column_slice(components))
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.iter().copied().collect()
    }

    /// Components narrowed to `f32`, ready for tensor construction.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.0.iter().map(|&c| c as f32).collect()
    }

    /// Component-wise maximum of two vectors.
    pub fn sup(&self, other: &Self) -> Self {
        Self(self.0.sup(&other.0))
    }

    /// Component-wise product.
    pub fn component_mul(&self, other: &Self) -> Self {
        Self(self.0.component_mul(&other.0))
    }

    pub fn inner(&self) -> &SVector<f64, D> {
        &self.0
    }
}

impl<const D: usize> std::ops::Index<usize> for Vector<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Vector<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const D: usize> std::ops::Add for Vector<D> {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

impl<const D: usize> std::ops::Sub for Vector<D> {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self(self.0 - other.0)
    }
}

impl<const D: usize> std::ops::Mul<f64> for Vector<D> {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self(self.0 * scalar)
    }
}

impl<const D: usize> std::ops::Div<f64> for Vector<D> {
    type Output = Self;

    fn div(self, scalar: f64) -> Self::Output {
        Self(self.0 / scalar)
    }
}

impl<const D: usize> std::ops::Neg for Vector<D> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Vector3 = Vector<3>;

    #[test]
    fn test_vector_arithmetic() {
        let v1 = Vector3::new([1.0, 2.0, 3.0]);
        let v2 = Vector3::new([4.0, 5.0, 6.0]);

        assert_eq!(v1 + v2, Vector3::new([5.0, 7.0, 9.0]));
        assert_eq!(v2 - v1, Vector3::new([3.0, 3.0, 3.0]));
        assert_eq!(v1 * 2.0, Vector3::new([2.0, 4.0, 6.0]));
        assert_eq!(v2 / 2.0, Vector3::new([2.0, 2.5, 3.0]));
        assert_eq!(-v1, Vector3::new([-1.0, -2.0, -3.0]));
    }

    #[test]
    fn test_vector_sup() {
        let a = Vector3::new([1.0, 7.0, 3.0]);
        let b = Vector3::new([4.0, 2.0, 3.0]);
        assert_eq!(a.sup(&b), Vector3::new([4.0, 7.0, 3.0]));
    }

    #[test]
    fn test_vector_component_mul() {
        let a = Vector3::new([1.0, 2.0, 3.0]);
        let b = Vector3::new([0.5, 0.5, 2.0]);
        assert_eq!(a.component_mul(&b), Vector3::new([0.5, 1.0, 6.0]));
    }

    #[test]
    fn test_vector_from_slice() {
        let v = Vector3::from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(v.to_vec(), vec![1.0, 2.0, 3.0]);
    }
}
