//! Animated GIF output.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};
use ndarray::{ArrayView3, Axis};
use tracing::info;
use crate::equalize::equalize_hist;
use crate::error::{AnalysisError, Result};

/// Time each frame stays on screen (10 frames per second).
pub const FRAME_DELAY_MS: u32 = 100;

/// Encode `frames` as a looping GIF at `path`.
pub fn write_gif(path: &Path, frames: Vec<RgbaImage>) -> Result<()> {
    if frames.is_empty() {
        return Err(AnalysisError::InvalidParameter("a GIF needs at least one frame".to_string()));
    }
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = GifEncoder::new(file);
    encoder.set_repeat(Repeat::Infinite)?;
    let delay = Delay::from_numer_denom_ms(FRAME_DELAY_MS, 1);
    encoder.encode_frames(frames.into_iter().map(|f| Frame::from_parts(f, 0, 0, delay)))?;
    Ok(())
}

/// Histogram-equalize `volume` (rows x cols x frames) and write each
/// last-axis slice as a grayscale frame to `{output_dir}/gifs/{label}_{name}.gif`.
pub fn save_gif(volume: &ArrayView3<f32>, name: &str, output_dir: &Path, label: &str) -> Result<PathBuf> {
    let (rows, cols, _) = volume.dim();
    if rows == 0 || cols == 0 {
        return Err(AnalysisError::shape_mismatch("non-empty rows and cols", volume.shape()));
    }

    let equalized = equalize_hist(volume) * 255.0;
    let frames: Vec<RgbaImage> = equalized
        .axis_iter(Axis(2))
        .map(|plane| {
            RgbaImage::from_fn(cols as u32, rows as u32, |x, y| {
                let v = plane[[y as usize, x as usize]].round().clamp(0.0, 255.0) as u8;
                Rgba([v, v, v, 255])
            })
        })
        .collect();

    let dir = output_dir.join("gifs");
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{label}_{name}.gif"));
    let count = frames.len();
    write_gif(&path, frames)?;

    info!(path = %path.display(), frames = count, "Wrote GIF");
    Ok(path)
}
