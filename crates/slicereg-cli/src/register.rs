//! Slice-by-slice registration of a moving volume onto one fixed slice.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use anyhow::{ensure, Context, Result};
use burn::backend::wgpu::{Wgpu, WgpuDevice};
use burn::tensor::backend::Backend;
use burn_ndarray::{NdArray, NdArrayDevice};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use slicereg_core::Image;
use slicereg_io::{read_nifti, read_nifti_channels, write_nifti, write_nifti_vector};
use slicereg_model::{SliceAdapter, VxmDense};
use tracing::{debug, info};

/// Where the network runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceSelection {
    /// `burn-ndarray` on the host
    #[default]
    Cpu,
    /// wgpu on the discrete adapter with this index
    Gpu(usize),
}

impl FromStr for DeviceSelection {
    type Err = anyhow::Error;

    /// `-1` (or an empty string) is the CPU; a list such as `0,1` selects
    /// its first adapter.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s == "-1" {
            return Ok(Self::Cpu);
        }
        let first = s.split(',').next().unwrap_or(s).trim();
        let index = first
            .parse::<usize>()
            .with_context(|| format!("Invalid GPU id '{}'", s))?;
        Ok(Self::Gpu(index))
    }
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    /// Moving image (source) filename
    #[arg(long)]
    pub moving: PathBuf,

    /// Fixed image (target) filename
    #[arg(long)]
    pub fixed: PathBuf,

    /// Warped image output filename
    #[arg(long)]
    pub moved: PathBuf,

    /// Model weights; the architecture is read from the same path with a .json extension
    #[arg(long)]
    pub model: PathBuf,

    /// Output displacement field filename
    #[arg(long)]
    pub warp: Option<PathBuf>,

    /// GPU number(s); CPU is used when unset or -1
    #[arg(short, long, allow_hyphen_values = true)]
    pub gpu: Option<DeviceSelection>,

    /// Inputs are 4-D with channels on the last axis
    #[arg(long)]
    pub multichannel: bool,

    /// Index of the fixed slice every moving slice is registered to
    #[arg(long, default_value_t = 0)]
    pub reference_slice: usize,

    /// Physical axis the volumes are sliced along (0 = x, 2 = z)
    #[arg(long, default_value_t = 2)]
    pub slice_axis: usize,
}

pub fn run(args: &RegisterArgs) -> Result<()> {
    let selection = args.gpu.unwrap_or_default();
    info!(device = ?selection, "Selected device");
    match selection {
        DeviceSelection::Cpu => register::<NdArray<f32>>(args, &NdArrayDevice::Cpu),
        DeviceSelection::Gpu(index) => register::<Wgpu>(args, &WgpuDevice::DiscreteGpu(index)),
    }
}

fn load_volume<B: Backend>(path: &Path, multichannel: bool, device: &B::Device) -> Result<Vec<Image<B, 3>>> {
    if multichannel {
        read_nifti_channels(path, device)
    } else {
        Ok(vec![read_nifti(path, device)?])
    }
}

/// Register every slice of `--moving` onto slice `--reference-slice` of
/// `--fixed` and write the restacked results.
pub fn register<B: Backend>(args: &RegisterArgs, device: &B::Device) -> Result<()> {
    let (model, config) = VxmDense::<B>::load(&args.model, device)?;
    let moving = load_volume::<B>(&args.moving, args.multichannel, device)
        .with_context(|| format!("Failed to load moving image {}", args.moving.display()))?;
    let fixed = load_volume::<B>(&args.fixed, args.multichannel, device)
        .with_context(|| format!("Failed to load fixed image {}", args.fixed.display()))?;
    ensure!(
        moving.len() == config.src_feats,
        "Moving image has {} channels but the model expects {}",
        moving.len(),
        config.src_feats
    );
    ensure!(
        fixed.len() == config.trg_feats,
        "Fixed image has {} channels but the model expects {}",
        fixed.len(),
        config.trg_feats
    );

    let adapter = SliceAdapter::from_physical_axis(args.slice_axis)?;
    let slice_shape = adapter.slice_shape(&moving[0]);
    ensure!(
        slice_shape == adapter.slice_shape(&fixed[0]),
        "Moving slices {:?} and fixed slices {:?} differ",
        slice_shape,
        adapter.slice_shape(&fixed[0])
    );
    ensure!(
        slice_shape == config.inshape,
        "Slices are {:?} but the model was built for {:?}",
        slice_shape,
        config.inshape
    );

    let reference = adapter
        .slice(&fixed, args.reference_slice)
        .with_context(|| format!("Invalid reference slice {}", args.reference_slice))?;
    let count = adapter.num_slices(&moving[0]);
    info!(
        slices = count,
        axis = args.slice_axis,
        reference = args.reference_slice,
        "Registering slices"
    );

    let progress = ProgressBar::new(count as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} slices ({eta})")?
            .progress_chars("#>-"),
    );

    let [h, w] = slice_shape;
    let channels = moving.len();
    let mut warped = Vec::with_capacity(count);
    let mut flows = Vec::with_capacity(count);
    for index in 0..count {
        let source = adapter.slice(&moving, index)?;
        let output = model.forward(source, reference.clone());
        warped.push(output.warped.reshape([channels, h, w]));
        flows.push(output.flow.reshape([2, h, w]));
        debug!(slice = index, "Registered slice");
        progress.inc(1);
    }
    progress.finish_and_clear();

    let metadata = moving[0].metadata();
    let moved = adapter.stack_channels(warped)?;
    if channels == 1 {
        let [_, nz, ny, nx] = moved.dims();
        write_nifti(&args.moved, &moving[0].with_data(moved.reshape([nz, ny, nx])))?;
    } else {
        write_nifti_vector(&args.moved, &moved, &metadata)?;
    }
    info!(path = %args.moved.display(), "Wrote moved image");

    if let Some(warp) = &args.warp {
        let field = adapter.stack_flows(flows)?;
        write_nifti_vector(warp, &field, &metadata)?;
        info!(path = %warp.display(), "Wrote displacement field");
    }
    Ok(())
}
