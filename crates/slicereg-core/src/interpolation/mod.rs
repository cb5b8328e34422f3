//! Interpolation types and operations.
//!
//! This module provides interpolation traits and implementations
//! for sampling values at continuous coordinates.

pub mod trait_;
pub mod nearest;
pub mod linear;
pub mod bspline;

pub use trait_::Interpolator;
pub use nearest::NearestNeighborInterpolator;
pub use linear::LinearInterpolator;
pub use bspline::BSplineInterpolator;

use std::fmt;
use std::str::FromStr;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};
use crate::error::CoreError;

/// Runtime choice of interpolation kernel.
///
/// Use `Nearest` for label and segmentation data, `Linear` or `BSpline`
/// for intensities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationKernel {
    Nearest,
    #[default]
    Linear,
    BSpline,
}

impl<B: Backend> Interpolator<B> for InterpolationKernel {
    fn interpolate<const D: usize>(&self, data: &Tensor<B, D>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        match self {
            Self::Nearest => NearestNeighborInterpolator.interpolate(data, indices),
            Self::Linear => LinearInterpolator.interpolate(data, indices),
            Self::BSpline => BSplineInterpolator.interpolate(data, indices),
        }
    }
}

impl FromStr for InterpolationKernel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear" => Ok(Self::Linear),
            "bspline" => Ok(Self::BSpline),
            other => Err(CoreError::UnknownKernel(other.to_string())),
        }
    }
}

impl fmt::Display for InterpolationKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::BSpline => "bspline",
        };
        f.write_str(name)
    }
}
