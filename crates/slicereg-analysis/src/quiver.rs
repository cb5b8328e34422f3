//! Quiver plots of 2D displacement fields.
//!
//! Channel 0 of a field is the row (downward) offset and channel 1 the
//! column (rightward) offset, matching the spatial transformer. Plotting
//! tools usually read the first component as horizontal, so fields from
//! those sources need their channels swapped first.

use std::fs;
use std::path::{Path, PathBuf};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use ndarray::{ArrayView2, ArrayView4, Axis};
use tracing::info;
use crate::error::{AnalysisError, Result};
use crate::gif::write_gif;

/// Side of the square canvas in pixels.
pub const CANVAS_SIZE: u32 = 512;

/// Upper bound on arrows along either axis.
pub const MAX_ARROWS_PER_AXIS: usize = 32;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Sampling stride so that at most [`MAX_ARROWS_PER_AXIS`] arrows fit per axis.
pub fn arrow_stride(rows: usize, cols: usize) -> usize {
    rows.max(cols).div_ceil(MAX_ARROWS_PER_AXIS).max(1)
}

fn draw_arrow(canvas: &mut RgbaImage, start: (f32, f32), end: (f32, f32)) {
    draw_line_segment_mut(canvas, start, end, BLACK);

    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 2.0 {
        return;
    }
    let ux = dx / len;
    let uy = dy / len;
    let head = 5.0f32.min(len * 0.4);

    let left = (end.0 - head * (ux + 0.4 * uy), end.1 - head * (uy - 0.4 * ux));
    let right = (end.0 - head * (ux - 0.4 * uy), end.1 - head * (uy + 0.4 * ux));
    draw_line_segment_mut(canvas, end, left, BLACK);
    draw_line_segment_mut(canvas, end, right, BLACK);
}

/// Render one slice of a field on a white square canvas.
///
/// Arrows start at the centers of strided pixels; the longest one spans
/// one sampling cell.
pub fn render_quiver(rows_offset: &ArrayView2<f32>, cols_offset: &ArrayView2<f32>) -> Result<RgbaImage> {
    let (rows, cols) = rows_offset.dim();
    if cols_offset.dim() != (rows, cols) {
        return Err(AnalysisError::shape_mismatch(format!("[{rows}, {cols}]"), cols_offset.shape()));
    }
    let mut canvas = RgbaImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, WHITE);
    if rows == 0 || cols == 0 {
        return Ok(canvas);
    }

    let stride = arrow_stride(rows, cols);
    let pixel = CANVAS_SIZE as f32 / rows.max(cols) as f32;
    // center the field when it is not square
    let x0 = (CANVAS_SIZE as f32 - cols as f32 * pixel) / 2.0;
    let y0 = (CANVAS_SIZE as f32 - rows as f32 * pixel) / 2.0;

    let samples: Vec<(usize, usize)> = (0..rows)
        .step_by(stride)
        .flat_map(|r| (0..cols).step_by(stride).map(move |c| (r, c)))
        .collect();
    let longest = samples
        .iter()
        .map(|&(r, c)| rows_offset[[r, c]].hypot(cols_offset[[r, c]]))
        .filter(|m| m.is_finite())
        .fold(0.0f32, f32::max);
    if longest == 0.0 {
        return Ok(canvas);
    }
    let scale = stride as f32 * pixel / longest;

    for (r, c) in samples {
        let (dy, dx) = (rows_offset[[r, c]], cols_offset[[r, c]]);
        if !dx.is_finite() || !dy.is_finite() {
            continue;
        }
        let start = (x0 + (c as f32 + 0.5) * pixel, y0 + (r as f32 + 0.5) * pixel);
        let end = (start.0 + dx * scale, start.1 + dy * scale);
        draw_arrow(&mut canvas, start, end);
    }
    Ok(canvas)
}

/// Write one quiver frame per slice of `field[2, slices, rows, cols]` to
/// `{output_dir}/quiver/{name}.gif`.
pub fn save_quiver(field: &ArrayView4<f32>, name: &str, output_dir: &Path) -> Result<PathBuf> {
    if field.shape()[0] != 2 {
        return Err(AnalysisError::shape_mismatch("[2, slices, rows, cols]", field.shape()));
    }

    let rows_field = field.index_axis(Axis(0), 0);
    let cols_field = field.index_axis(Axis(0), 1);
    let frames = rows_field
        .axis_iter(Axis(0))
        .zip(cols_field.axis_iter(Axis(0)))
        .map(|(dy, dx)| render_quiver(&dy, &dx))
        .collect::<Result<Vec<_>>>()?;

    let dir = output_dir.join("quiver");
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{name}.gif"));
    let count = frames.len();
    write_gif(&path, frames)?;

    info!(path = %path.display(), frames = count, "Wrote quiver GIF");
    Ok(path)
}
