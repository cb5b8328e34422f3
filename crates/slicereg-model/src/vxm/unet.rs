use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        LeakyRelu, LeakyReluConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::module::interpolate,
    tensor::ops::{InterpolateMode, InterpolateOptions},
};

/// 3x3 convolution followed by LeakyReLU(0.2).
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    act: LeakyRelu,
}

#[derive(Config, Debug)]
pub struct ConvBlockConfig {
    in_channels: usize,
    out_channels: usize,
}

impl ConvBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvBlock<B> {
        ConvBlock {
            conv: Conv2dConfig::new([self.in_channels, self.out_channels], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            act: LeakyReluConfig::new().with_negative_slope(0.2).init(),
        }
    }
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.act.forward(self.conv.forward(x))
    }
}

/// U-Net backbone: one conv block per level, max pooling on the way down,
/// nearest upsampling and skip concatenation on the way up, then a few
/// full-resolution conv blocks.
#[derive(Module, Debug)]
pub struct Unet<B: Backend> {
    encoder: Vec<ConvBlock<B>>,
    decoder: Vec<ConvBlock<B>>,
    remaining: Vec<ConvBlock<B>>,
    pool: MaxPool2d,
}

#[derive(Config, Debug)]
pub struct UnetConfig {
    pub in_channels: usize,
    pub enc_features: Vec<usize>,
    /// The first `enc_features.len()` entries are decoder levels; the rest
    /// are full-resolution convs.
    pub dec_features: Vec<usize>,
}

impl UnetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Unet<B> {
        let levels = self.enc_features.len();
        assert!(
            self.dec_features.len() >= levels,
            "dec_features needs at least one entry per encoder level"
        );

        let mut prev = self.in_channels;
        let mut skip_channels = Vec::with_capacity(levels);
        let mut encoder = Vec::with_capacity(levels);
        for &nf in &self.enc_features {
            encoder.push(ConvBlockConfig::new(prev, nf).init(device));
            prev = nf;
            skip_channels.push(nf);
        }

        let mut decoder = Vec::with_capacity(levels);
        for (&nf, &skip) in self.dec_features[..levels].iter().zip(skip_channels.iter().rev()) {
            decoder.push(ConvBlockConfig::new(prev, nf).init(device));
            prev = nf + skip;
        }

        let mut remaining = Vec::new();
        for &nf in &self.dec_features[levels..] {
            remaining.push(ConvBlockConfig::new(prev, nf).init(device));
            prev = nf;
        }

        Unet {
            encoder,
            decoder,
            remaining,
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    /// Channels produced by the last block.
    pub fn out_channels(&self) -> usize {
        let levels = self.enc_features.len();
        match self.dec_features.last() {
            Some(&nf) if self.dec_features.len() > levels => nf,
            _ => self.dec_features[levels - 1] + self.enc_features[0],
        }
    }

    /// Spatial sizes must be divisible by this.
    pub fn divisor(&self) -> usize {
        1 << self.enc_features.len()
    }
}

impl<B: Backend> Unet<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut history = Vec::with_capacity(self.encoder.len());
        let mut x = x;
        for block in &self.encoder {
            x = block.forward(x);
            history.push(x.clone());
            x = self.pool.forward(x);
        }

        for block in &self.decoder {
            x = block.forward(x);
            // decoder has one block per encoder level, so history never runs dry
            if let Some(skip) = history.pop() {
                let [_, _, h, w] = skip.dims();
                x = interpolate(x, [h, w], InterpolateOptions::new(InterpolateMode::Nearest));
                x = Tensor::cat(vec![x, skip], 1);
            }
        }

        for block in &self.remaining {
            x = block.forward(x);
        }
        x
    }
}
