//! Principal-component summary of a channel stack.
//!
//! A `rows x cols x depth` array is treated as `rows * cols` samples of a
//! `depth`-dimensional signal. Channels are standardized, so the matrix
//! analysed is the channel correlation matrix and its trace is `depth`.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array, ArrayView, ArrayView3, Axis, Dimension, Zip};
use tracing::debug;
use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone)]
pub struct PcaSummary {
    /// Eigenvalues of the correlation matrix, largest first.
    pub eigenvalues: Vec<f64>,
    /// `depth x depth` standardized covariance (correlation) matrix.
    pub covariance: DMatrix<f64>,
    /// `depth` minus the sum of the leading `n_components` eigenvalues.
    pub residual: f64,
}

impl PcaSummary {
    /// Fraction of total variance held by the leading `k` components.
    pub fn explained_ratio(&self, k: usize) -> f64 {
        let total: f64 = self.eigenvalues.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.eigenvalues.iter().take(k).sum::<f64>() / total
    }
}

/// Eigen-summary of the channel correlation of `array`.
///
/// Constant channels are treated as unit-variance and uncorrelated with
/// the others: their row and column of the matrix are zero apart from a 1
/// on the diagonal.
pub fn summarize(array: &ArrayView3<f64>, n_components: usize) -> Result<PcaSummary> {
    let (rows, cols, depth) = array.dim();
    if n_components > depth {
        return Err(AnalysisError::TooManyComponents {
            requested: n_components,
            depth,
        });
    }
    let samples = rows * cols;
    if samples < 2 {
        return Err(AnalysisError::InsufficientSamples(samples));
    }

    let denom = (samples - 1) as f64;
    let channels: Vec<Vec<f64>> = (0..depth)
        .map(|d| array.index_axis(Axis(2), d).iter().copied().collect())
        .collect();
    let means: Vec<f64> = channels.iter().map(|c| c.iter().sum::<f64>() / samples as f64).collect();
    let stds: Vec<f64> = channels
        .iter()
        .zip(&means)
        .map(|(c, m)| (c.iter().map(|v| (v - m).powi(2)).sum::<f64>() / denom).sqrt())
        .collect();

    // the std of a constant channel may round to a tiny nonzero value
    let constant: Vec<bool> = channels.iter().map(|c| c.iter().all(|&v| v == c[0])).collect();

    let mut covariance = DMatrix::<f64>::zeros(depth, depth);
    for i in 0..depth {
        if constant[i] {
            covariance[(i, i)] = 1.0;
            continue;
        }
        for j in i..depth {
            if constant[j] {
                continue;
            }
            let cross: f64 = channels[i]
                .iter()
                .zip(&channels[j])
                .map(|(a, b)| (a - means[i]) * (b - means[j]))
                .sum();
            let value = cross / (denom * stds[i] * stds[j]);
            covariance[(i, j)] = value;
            covariance[(j, i)] = value;
        }
    }

    let mut eigenvalues: Vec<f64> = SymmetricEigen::new(covariance.clone()).eigenvalues.iter().copied().collect();
    eigenvalues.sort_by(|a, b| b.total_cmp(a));
    let residual = depth as f64 - eigenvalues.iter().take(n_components).sum::<f64>();

    debug!(rows, cols, depth, n_components, residual, "PCA summary");
    Ok(PcaSummary {
        eigenvalues,
        covariance,
        residual,
    })
}

/// Element-wise `(b - a) / a * 100`.
pub fn percentage_change<D: Dimension>(a: &ArrayView<f64, D>, b: &ArrayView<f64, D>) -> Result<Array<f64, D>> {
    if a.shape() != b.shape() {
        return Err(AnalysisError::shape_mismatch(format!("{:?}", a.shape()), b.shape()));
    }
    Ok(Zip::from(a).and(b).map_collect(|&x, &y| (y - x) / x * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array3};

    #[test]
    fn test_constant_array_has_no_residual() {
        let array = Array3::<f64>::from_elem((10, 10, 3), 4.2);
        let summary = summarize(&array.view(), 3).unwrap();
        assert_eq!(summary.eigenvalues.len(), 3);
        for value in &summary.eigenvalues {
            assert!((value - 1.0).abs() < 1e-12);
        }
        assert!(summary.residual.abs() < 1e-12);
    }

    #[test]
    fn test_constant_channels_stay_uncorrelated() {
        // 4.2 is not exactly representable, so the sample std is not exactly 0
        let array = Array3::<f64>::from_elem((10, 10, 3), 4.2);
        let summary = summarize(&array.view(), 1).unwrap();
        for value in &summary.eigenvalues {
            assert!((value - 1.0).abs() < 1e-12);
        }
        assert!((summary.residual - 2.0).abs() < 1e-12);
        assert_eq!(summary.covariance[(0, 1)], 0.0);
    }

    #[test]
    fn test_correlated_channels() {
        // channel 1 = 2 * channel 0, so all variance sits on one component
        let array = Array3::from_shape_fn((4, 5, 2), |(r, c, d)| ((r * 5 + c) as f64) * (d as f64 + 1.0));
        let summary = summarize(&array.view(), 1).unwrap();
        assert!((summary.eigenvalues[0] - 2.0).abs() < 1e-9);
        assert!(summary.eigenvalues[1].abs() < 1e-9);
        assert!(summary.residual.abs() < 1e-9);
        assert!((summary.covariance[(0, 1)] - 1.0).abs() < 1e-9);
        assert!((summary.explained_ratio(1) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_channel_is_isolated() {
        let array = Array3::from_shape_fn((3, 3, 2), |(r, c, d)| if d == 0 { (r + c) as f64 } else { 7.0 });
        let summary = summarize(&array.view(), 2).unwrap();
        assert_eq!(summary.covariance[(0, 1)], 0.0);
        assert_eq!(summary.covariance[(1, 1)], 1.0);
        assert!((summary.covariance[(0, 0)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_too_many_components() {
        let array = Array3::<f64>::zeros((4, 4, 2));
        let err = summarize(&array.view(), 3).unwrap_err();
        assert!(matches!(err, AnalysisError::TooManyComponents { requested: 3, depth: 2 }));
    }

    #[test]
    fn test_insufficient_samples() {
        let array = Array3::<f64>::zeros((1, 1, 3));
        let err = summarize(&array.view(), 1).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientSamples(1)));
    }

    #[test]
    fn test_percentage_change() {
        let a = arr1(&[10.0, 4.0, -2.0]);
        let b = arr1(&[15.0, 2.0, -1.0]);
        let change = percentage_change(&a.view(), &b.view()).unwrap();
        assert_eq!(change.to_vec(), vec![50.0, -50.0, -50.0]);

        let c = arr1(&[1.0]);
        assert!(percentage_change(&a.view(), &c.view()).is_err());
    }
}
