//! Cubic B-Spline interpolation.
//!
//! Samples are first converted to B-spline coefficients with the recursive
//! prefilter of Unser et al., so the spline passes through every voxel value.
//! Evaluation then blends the `4^D` coefficients around each point. Borders
//! use mirror-symmetric extension.
//!
//! The work happens on the host: coefficients are computed once per call and
//! the result is uploaded back to the backend as a single tensor.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use serde::{Deserialize, Serialize};
use super::trait_::Interpolator;

/// Pole of the cubic B-spline prefilter, `sqrt(3) - 2`.
const POLE: f64 = -0.267_949_192_431_122_7;

/// Truncation tolerance for the causal initialisation sum.
const TOLERANCE: f64 = 1e-10;

/// Cubic B-Spline interpolator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BSplineInterpolator;

impl BSplineInterpolator {
    pub fn new() -> Self {
        Self
    }
}

/// Cubic B-spline weights for the four samples at `floor(x) - 1 ..= floor(x) + 2`.
fn cubic_weights(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    let one_minus = 1.0 - t;
    [
        one_minus * one_minus * one_minus / 6.0,
        (4.0 - 6.0 * t2 + 3.0 * t3) / 6.0,
        (1.0 + 3.0 * t + 3.0 * t2 - 3.0 * t3) / 6.0,
        t3 / 6.0,
    ]
}

/// Fold an integer index into `0..len` by mirroring about the end samples.
fn mirror(index: i64, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as i64 - 1);
    let mut i = index.rem_euclid(period);
    if i >= len as i64 {
        i = period - i;
    }
    i as usize
}

/// First causal coefficient under mirror-symmetric boundaries.
fn causal_init(line: &[f64]) -> f64 {
    let n = line.len();
    let horizon = (TOLERANCE.ln() / POLE.abs().ln()).ceil() as usize;
    if horizon < n {
        let mut zn = POLE;
        let mut sum = line[0];
        for c in &line[1..horizon] {
            sum += zn * c;
            zn *= POLE;
        }
        return sum;
    }

    // short line: exact sum over the full mirrored period
    let inv = 1.0 / POLE;
    let mut zn = POLE;
    let mut z2n = POLE.powi(n as i32 - 1);
    let mut sum = line[0] + z2n * line[n - 1];
    z2n *= z2n * inv;
    for c in &line[1..n - 1] {
        sum += (zn + z2n) * c;
        zn *= POLE;
        z2n *= inv;
    }
    sum / (1.0 - zn * zn)
}

/// In-place conversion of one line of samples to cubic B-spline coefficients.
fn prefilter_line(line: &mut [f64]) {
    let n = line.len();
    if n < 2 {
        return;
    }
    let gain = (1.0 - POLE) * (1.0 - 1.0 / POLE);
    for c in line.iter_mut() {
        *c *= gain;
    }

    line[0] = causal_init(line);
    for k in 1..n {
        line[k] += POLE * line[k - 1];
    }

    line[n - 1] = (POLE / (POLE * POLE - 1.0)) * (line[n - 1] + POLE * line[n - 2]);
    for k in (0..n - 1).rev() {
        line[k] = POLE * (line[k + 1] - line[k]);
    }
}

/// Prefilter a row-major buffer along every tensor axis.
fn compute_coefficients(values: &mut [f64], dims: &[usize]) {
    for axis in 0..dims.len() {
        let len = dims[axis];
        let stride: usize = dims[axis + 1..].iter().product();
        let outer: usize = dims[..axis].iter().product();
        let mut line = vec![0.0; len];
        for o in 0..outer {
            for s in 0..stride {
                let base = o * len * stride + s;
                for (k, slot) in line.iter_mut().enumerate() {
                    *slot = values[base + k * stride];
                }
                prefilter_line(&mut line);
                for (k, value) in line.iter().enumerate() {
                    values[base + k * stride] = *value;
                }
            }
        }
    }
}

impl<B: Backend> Interpolator<B> for BSplineInterpolator {
    fn interpolate<const D: usize>(&self, data: &Tensor<B, D>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let device = indices.device();
        let dims = data.dims();
        let [n, rank] = indices.dims();
        assert_eq!(rank, D, "Index rank must match data dimensionality");

        let mut coeffs: Vec<f64> = data.to_data().iter::<f32>().map(f64::from).collect();
        compute_coefficients(&mut coeffs, &dims);

        let points: Vec<f32> = indices.into_data().iter::<f32>().collect();
        let strides: Vec<usize> = (0..D).map(|t| dims[t + 1..].iter().product()).collect();

        let mut output = Vec::with_capacity(n);
        let mut bases = [0i64; D];
        let mut weights = [[0.0f64; 4]; D];
        for p in 0..n {
            for axis in 0..D {
                let x = f64::from(points[p * D + axis]);
                let floor = x.floor();
                bases[axis] = floor as i64 - 1;
                weights[axis] = cubic_weights(x - floor);
            }

            let mut value = 0.0;
            for corner in 0..4usize.pow(D as u32) {
                let mut offset = corner;
                let mut flat = 0usize;
                let mut weight = 1.0;
                for axis in 0..D {
                    let k = offset % 4;
                    offset /= 4;
                    // physical axis `axis` is tensor axis `D - 1 - axis`
                    let tensor_axis = D - 1 - axis;
                    let idx = mirror(bases[axis] + k as i64, dims[tensor_axis]);
                    flat += idx * strides[tensor_axis];
                    weight *= weights[axis][k];
                }
                value += weight * coeffs[flat];
            }
            output.push(value as f32);
        }

        Tensor::from_data(TensorData::new(output, Shape::new([n])), &device)
    }
}
