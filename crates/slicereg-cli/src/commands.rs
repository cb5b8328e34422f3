//! Resampling and inspection commands that run on the host.

use std::path::{Path, PathBuf};
use anyhow::{ensure, Context, Result};
use burn_ndarray::{NdArray, NdArrayDevice};
use image::Rgb;
use ndarray::{Array3, Array4, Axis, Ix3, Ix4};
use slicereg_analysis::{save_gif, save_quiver, save_warped_grid, summarize, DEFAULT_GRID_COLOR};
use slicereg_core::{resize_image, InterpolationKernel};
use slicereg_io::{read_nifti, read_nifti_array, write_nifti};
use slicereg_model::SliceAdapter;
use tracing::info;

type HostBackend = NdArray<f32>;

/// Most components reported by `pca` when none are requested.
pub const DEFAULT_COMPONENTS: usize = 10;

pub fn resample(input: &Path, output: &Path, size: [usize; 3], kernel: InterpolationKernel) -> Result<()> {
    let device = NdArrayDevice::Cpu;
    let image = read_nifti::<HostBackend, _>(input, &device)?;
    let resized = resize_image(&image, size, kernel)
        .with_context(|| format!("Failed to resample {}", input.display()))?;
    write_nifti(output, &resized)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        size = ?size,
        spacing = ?resized.spacing(),
        %kernel,
        "Resampled volume"
    );
    Ok(())
}

fn read_volume(path: &Path) -> Result<Array3<f32>> {
    let volume = read_nifti_array(path)?;
    let ndim = volume.data.ndim();
    volume
        .data
        .into_dimensionality::<Ix3>()
        .with_context(|| format!("Expected a 3D volume in {}, found {} dimensions", path.display(), ndim))
}

pub fn gif(input: &Path, name: &str, label: &str, output_dir: &Path) -> Result<PathBuf> {
    let volume = read_volume(input)?;
    Ok(save_gif(&volume.view(), name, output_dir, label)?)
}

pub fn pca(input: &Path, components: Option<usize>) -> Result<()> {
    let volume = read_volume(input)?.mapv(f64::from);
    let depth = volume.dim().2;
    let n_components = components.unwrap_or(DEFAULT_COMPONENTS.min(depth));
    let summary = summarize(&volume.view(), n_components)?;

    println!("Eigenvalues ({} channels):", depth);
    for (i, value) in summary.eigenvalues.iter().enumerate() {
        println!("  {:>3}: {:.6}", i, value);
    }
    println!(
        "Top {} components explain {:.2}% of the variance",
        n_components,
        summary.explained_ratio(n_components) * 100.0
    );
    println!("Residual variance: {:.6}", summary.residual);
    Ok(())
}

/// Read a displacement field written as `(x, y, z, component)` and lay it
/// out as `[component, slice, row, col]` for slices along physical `slice_axis`.
pub fn read_warp_slices(path: &Path, slice_axis: usize) -> Result<Array4<f32>> {
    let axis = SliceAdapter::from_physical_axis(slice_axis)?.axis();
    let volume = read_nifti_array(path)?;
    let ndim = volume.data.ndim();
    let field = volume
        .data
        .into_dimensionality::<Ix4>()
        .with_context(|| format!("Expected a 4D displacement field in {}, found {} dimensions", path.display(), ndim))?;

    // [c, z, y, x], then bring the slice axis forward
    let tensor_order = field.permuted_axes([3, 2, 1, 0]);
    let rest: Vec<usize> = (1..4).filter(|&a| a != axis + 1).collect();
    let order = [0, axis + 1, rest[0], rest[1]];
    Ok(tensor_order.permuted_axes(order).as_standard_layout().into_owned())
}

pub fn quiver(warp: &Path, name: &str, output_dir: &Path, slice_axis: usize) -> Result<PathBuf> {
    let field = read_warp_slices(warp, slice_axis)?;
    Ok(save_quiver(&field.view(), name, output_dir)?)
}

pub struct GridOptions {
    pub slice: usize,
    pub slice_axis: usize,
    pub interval: usize,
    pub color: Rgb<u8>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            slice: 0,
            slice_axis: 2,
            interval: 3,
            color: DEFAULT_GRID_COLOR,
        }
    }
}

pub fn grid(warp: &Path, background: Option<&Path>, output: &Path, options: &GridOptions) -> Result<()> {
    let field = read_warp_slices(warp, options.slice_axis)?;
    let slices = field.dim().1;
    ensure!(
        options.slice < slices,
        "Slice {} out of range, the field has {} slices",
        options.slice,
        slices
    );
    let disp = field.index_axis(Axis(1), options.slice);

    let background = match background {
        Some(path) => {
            let axis = SliceAdapter::from_physical_axis(options.slice_axis)?.axis();
            let zyx = read_volume(path)?.reversed_axes();
            ensure!(
                options.slice < zyx.len_of(Axis(axis)),
                "Slice {} out of range for background {}",
                options.slice,
                path.display()
            );
            Some(zyx.index_axis(Axis(axis), options.slice).to_owned())
        }
        None => None,
    };

    save_warped_grid(output, &disp, background.as_ref().map(|b| b.view()).as_ref(), options.interval, options.color)?;
    Ok(())
}
