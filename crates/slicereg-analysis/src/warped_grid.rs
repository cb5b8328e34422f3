//! Deformed-grid overlays for inspecting a displacement field.

use std::path::Path;
use image::{Luma, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use ndarray::{ArrayView2, ArrayView3};
use tracing::info;
use crate::error::{AnalysisError, Result};

/// Cyan, the usual grid color.
pub const DEFAULT_GRID_COLOR: Rgb<u8> = Rgb([0, 255, 255]);

/// Min-max scale a 2D array to an 8-bit grayscale image.
fn grayscale(background: &ArrayView2<f32>) -> image::GrayImage {
    let (rows, cols) = background.dim();
    let (min, max) = background
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = if max > min { max - min } else { 1.0 };

    image::GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let v = background[[y as usize, x as usize]];
        if !v.is_finite() || max <= min {
            return Luma([0]);
        }
        Luma([((v - min) / range * 255.0).round().clamp(0.0, 255.0) as u8])
    })
}

/// Draw the grid `{0, interval, 2*interval, ...} < H-1` x `... < W-1`,
/// with each node displaced by `(disp[0], disp[1])` in (row, col) order,
/// over `background` (black when absent).
///
/// `disp` is `[2, H, W]`; the returned image is `W x H`.
pub fn plot_warped_grid(
    disp: &ArrayView3<f32>,
    background: Option<&ArrayView2<f32>>,
    interval: usize,
    color: Rgb<u8>,
) -> Result<RgbImage> {
    let (components, rows, cols) = disp.dim();
    if components != 2 {
        return Err(AnalysisError::shape_mismatch("[2, H, W]", disp.shape()));
    }
    if interval == 0 {
        return Err(AnalysisError::InvalidParameter("grid interval must be positive".to_string()));
    }

    let mut canvas = match background {
        Some(bg) if bg.dim() != (rows, cols) => {
            return Err(AnalysisError::shape_mismatch(format!("[{rows}, {cols}]"), bg.shape()));
        }
        Some(bg) => image::DynamicImage::ImageLuma8(grayscale(bg)).to_rgb8(),
        None => RgbImage::new(cols as u32, rows as u32),
    };

    let grid_rows: Vec<usize> = (0..rows.saturating_sub(1)).step_by(interval).collect();
    let grid_cols: Vec<usize> = (0..cols.saturating_sub(1)).step_by(interval).collect();

    // node (i, j) in canvas (x, y)
    let node = |r: usize, c: usize| -> (f32, f32) {
        (c as f32 + disp[[1, r, c]], r as f32 + disp[[0, r, c]])
    };

    for &r in &grid_rows {
        for pair in grid_cols.windows(2) {
            draw_line_segment_mut(&mut canvas, node(r, pair[0]), node(r, pair[1]), color);
        }
    }
    for &c in &grid_cols {
        for pair in grid_rows.windows(2) {
            draw_line_segment_mut(&mut canvas, node(pair[0], c), node(pair[1], c), color);
        }
    }

    Ok(canvas)
}

/// Render with [`plot_warped_grid`] and save as PNG.
pub fn save_warped_grid(
    path: &Path,
    disp: &ArrayView3<f32>,
    background: Option<&ArrayView2<f32>>,
    interval: usize,
    color: Rgb<u8>,
) -> Result<()> {
    let canvas = plot_warped_grid(disp, background, interval, color)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    canvas.save_with_format(path, image::ImageFormat::Png)?;
    info!(path = %path.display(), "Wrote warped grid");
    Ok(())
}
