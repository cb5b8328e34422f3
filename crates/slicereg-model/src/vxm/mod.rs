//! VoxelMorph-style dense registration network for 2D slices.

pub mod integration;
pub mod spatial_transform;
pub mod unet;

use std::path::{Path, PathBuf};
use anyhow::{ensure, Context, Result};
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Initializer, PaddingConfig2d,
    },
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
    tensor::module::interpolate,
    tensor::ops::{InterpolateMode, InterpolateOptions},
};
use tracing::info;
pub use integration::VecInt;
pub use spatial_transform::SpatialTransformer;
use unet::{Unet, UnetConfig};

/// Output of a registration forward pass.
pub struct VxmOutput<B: Backend> {
    /// Source warped onto the target [B, C, H, W]
    pub warped: Tensor<B, 4>,
    /// Displacement field in voxels [B, 2, H, W]
    pub flow: Tensor<B, 4>,
}

#[derive(Module, Debug)]
pub struct VxmDense<B: Backend> {
    unet: Unet<B>,
    flow_head: Conv2d<B>,
    integrate: Option<VecInt<B>>,
    transformer: SpatialTransformer<B>,
    int_downsize: usize,
}

#[derive(Config, Debug)]
pub struct VxmDenseConfig {
    /// Slice shape [H, W]; each side must be divisible by `2^enc_features.len()`.
    pub inshape: [usize; 2],
    #[config(default = "vec![16, 32, 32, 32]")]
    pub enc_features: Vec<usize>,
    #[config(default = "vec![32, 32, 32, 32, 32, 16, 16]")]
    pub dec_features: Vec<usize>,
    /// Scaling-and-squaring steps; 0 disables integration.
    #[config(default = 7)]
    pub int_steps: usize,
    /// The velocity field is integrated at `1 / int_downsize` resolution.
    #[config(default = 2)]
    pub int_downsize: usize,
    #[config(default = 1)]
    pub src_feats: usize,
    #[config(default = 1)]
    pub trg_feats: usize,
}

impl VxmDenseConfig {
    fn unet_config(&self) -> UnetConfig {
        UnetConfig::new(
            self.src_feats + self.trg_feats,
            self.enc_features.clone(),
            self.dec_features.clone(),
        )
    }

    /// Check that `inshape` survives the U-Net's pooling levels.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.enc_features.is_empty(), "enc_features must not be empty");
        ensure!(
            self.dec_features.len() >= self.enc_features.len(),
            "dec_features needs at least {} entries, got {}",
            self.enc_features.len(),
            self.dec_features.len()
        );
        ensure!(self.int_downsize >= 1, "int_downsize must be at least 1");
        let divisor = self.unet_config().divisor();
        ensure!(
            self.inshape.iter().all(|&s| s > 0 && s % divisor == 0),
            "inshape {:?} must be divisible by {}",
            self.inshape,
            divisor
        );
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> VxmDense<B> {
        let unet_config = self.unet_config();
        let flow_head = Conv2dConfig::new([unet_config.out_channels(), 2], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_initializer(Initializer::Normal { mean: 0.0, std: 1e-5 })
            .init(device);

        VxmDense {
            unet: unet_config.init(device),
            flow_head,
            integrate: (self.int_steps > 0).then(|| VecInt::new(self.int_steps)),
            transformer: SpatialTransformer::new(),
            int_downsize: self.int_downsize,
        }
    }
}

/// `<model>.json` beside a record file.
pub fn config_path(model: &Path) -> PathBuf {
    model.with_extension("json")
}

impl<B: Backend> VxmDense<B> {
    /// Load a network from a named MessagePack record; the architecture is
    /// read from the `.json` file next to it.
    pub fn load<P: AsRef<Path>>(path: P, device: &B::Device) -> Result<(Self, VxmDenseConfig)> {
        let path = path.as_ref();
        let config_file = config_path(path);
        let config = VxmDenseConfig::load(&config_file)
            .with_context(|| format!("Failed to read model config {}", config_file.display()))?;
        config.validate()?;

        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let model = config
            .init::<B>(device)
            .load_file(path.to_path_buf(), &recorder, device)
            .with_context(|| format!("Failed to load model weights {}", path.display()))?;

        info!(
            model = %path.display(),
            inshape = ?config.inshape,
            int_steps = config.int_steps,
            "Loaded VxmDense"
        );
        Ok((model, config))
    }

    /// Write the weights to `path` and the architecture to `<path>.json`.
    pub fn save<P: AsRef<Path>>(self, path: P, config: &VxmDenseConfig) -> Result<()> {
        let path = path.as_ref();
        config
            .save(config_path(path))
            .with_context(|| format!("Failed to write model config for {}", path.display()))?;
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        self.save_file(path.to_path_buf(), &recorder)
            .with_context(|| format!("Failed to write model weights {}", path.display()))?;
        Ok(())
    }

    /// Rescale a flow field by `factor`, resizing it and its magnitudes together.
    fn resize_flow(&self, flow: Tensor<B, 4>, size: [usize; 2], factor: f32) -> Tensor<B, 4> {
        let options = InterpolateOptions::new(InterpolateMode::Bilinear);
        if factor < 1.0 {
            interpolate(flow, size, options) * factor
        } else {
            interpolate(flow * factor, size, options)
        }
    }

    /// Register `source` [B, src_feats, H, W] onto `target` [B, trg_feats, H, W].
    pub fn forward(&self, source: Tensor<B, 4>, target: Tensor<B, 4>) -> VxmOutput<B> {
        let [_, _, h, w] = source.dims();
        let x = Tensor::cat(vec![source.clone(), target], 1);
        let features = self.unet.forward(x);
        let mut flow = self.flow_head.forward(features);

        if let Some(integrate) = &self.integrate {
            if self.int_downsize > 1 {
                let factor = self.int_downsize;
                let small = [h / factor, w / factor];
                flow = self.resize_flow(flow, small, 1.0 / factor as f32);
                flow = integrate.forward(flow);
                flow = self.resize_flow(flow, [h, w], factor as f32);
            } else {
                flow = integrate.forward(flow);
            }
        }

        let warped = self.transformer.forward(source, flow.clone());
        VxmOutput { warped, flow }
    }
}
