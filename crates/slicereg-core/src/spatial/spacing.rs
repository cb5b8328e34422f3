//! Spacing between adjacent voxels along each physical axis.

use super::Vector;

/// Per-axis physical distance between adjacent voxels.
pub type Spacing<const D: usize> = Vector<D>;

impl<const D: usize> Spacing<D> {
    /// Same spacing along every axis.
    pub fn uniform(value: f64) -> Self {
        Self::new([value; D])
    }

    /// Spacing that makes `size` voxels span `extent` from first to last
    /// voxel center, i.e. `extent / (size - 1)` per axis.
    ///
    /// Callers guarantee `size[i] >= 2`.
    pub fn from_extent(extent: &Vector<D>, size: [usize; D]) -> Self {
        let mut spacing = Self::zeros();
        for i in 0..D {
            spacing[i] = extent[i] / (size[i] - 1) as f64;
        }
        spacing
    }

    pub fn is_uniform(&self) -> bool {
        if D == 0 {
            return true;
        }
        let first = self[0];
        (1..D).all(|i| (self[i] - first).abs() < 1e-9)
    }

    /// True when every component is strictly positive and finite.
    pub fn is_valid(&self) -> bool {
        (0..D).all(|i| self[i].is_finite() && self[i] > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Spacing3 = Spacing<3>;

    #[test]
    fn test_spacing_uniform() {
        let s = Spacing3::uniform(1.5);
        assert_eq!(s, Spacing3::new([1.5, 1.5, 1.5]));
        assert!(s.is_uniform());
        assert!(!Spacing3::new([1.0, 2.0, 3.0]).is_uniform());
    }

    #[test]
    fn test_spacing_from_extent() {
        let extent = Vector::new([3.0, 3.0, 6.0]);
        let s = Spacing3::from_extent(&extent, [8, 8, 4]);
        assert!((s[0] - 3.0 / 7.0).abs() < 1e-12);
        assert!((s[1] - 3.0 / 7.0).abs() < 1e-12);
        assert!((s[2] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_spacing_validity() {
        assert!(Spacing3::uniform(0.5).is_valid());
        assert!(!Spacing3::new([1.0, 0.0, 1.0]).is_valid());
        assert!(!Spacing3::new([1.0, f64::NAN, 1.0]).is_valid());
    }
}
