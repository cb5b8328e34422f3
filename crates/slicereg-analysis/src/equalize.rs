//! Global histogram equalization for floating-point volumes.
//!
//! 1. Build a 256-bin histogram over `[min, max]`.
//! 2. Normalize its cumulative sum so the last bin is 1.
//! 3. Map each value through the CDF, interpolating linearly between bin
//!    centers.
//!
//! The output lies in `(0, 1]` and preserves the ordering of the input.

use ndarray::{Array, ArrayView, Dimension};

pub const NBINS: usize = 256;

/// Equalize `data` into `[0, 1]`. A constant input maps to all ones.
///
/// Non-finite values are ignored when building the histogram and map to 0.
pub fn equalize_hist<D: Dimension>(data: &ArrayView<f32, D>) -> Array<f32, D> {
    let (min, max) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if max <= min {
        return data.map(|v| if v.is_finite() { 1.0 } else { 0.0 });
    }

    let width = (max - min) / NBINS as f32;
    let bin_of = |v: f32| (((v - min) / width) as usize).min(NBINS - 1);

    let mut hist = [0u64; NBINS];
    for &v in data.iter().filter(|v| v.is_finite()) {
        hist[bin_of(v)] += 1;
    }

    let mut cdf = [0f32; NBINS];
    let mut running = 0u64;
    for (slot, count) in cdf.iter_mut().zip(hist) {
        running += count;
        *slot = running as f32;
    }
    let total = running as f32;
    for slot in cdf.iter_mut() {
        *slot /= total;
    }

    data.map(|&v| {
        if !v.is_finite() {
            return 0.0;
        }
        // position in units of bins, relative to the first bin center
        let pos = (v - min) / width - 0.5;
        if pos <= 0.0 {
            return cdf[0];
        }
        let lower = pos.floor() as usize;
        if lower >= NBINS - 1 {
            return cdf[NBINS - 1];
        }
        let t = pos - lower as f32;
        // clamp so rounding never overshoots the next bin center
        (cdf[lower] + (cdf[lower + 1] - cdf[lower]) * t).min(cdf[lower + 1])
    })
}
