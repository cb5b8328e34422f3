use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use slicereg_core::image::Image;
use anyhow::{ensure, Result};

/// Cuts volumes into 2D network inputs along one tensor axis and stacks
/// per-slice outputs back into volumes.
///
/// Slices keep the remaining two tensor axes in their original order, so
/// for axis 0 of a `[z, y, x]` volume a slice is `[y, x]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceAdapter {
    axis: usize,
}

impl SliceAdapter {
    /// `axis` is a tensor axis (0 = slowest).
    pub fn new(axis: usize) -> Result<Self> {
        ensure!(axis < 3, "Slice axis must be 0, 1 or 2, got {}", axis);
        Ok(Self { axis })
    }

    /// `axis` in NIfTI/physical order (0 = x), which is tensor axis `2 - axis`.
    pub fn from_physical_axis(axis: usize) -> Result<Self> {
        ensure!(axis < 3, "Slice axis must be 0, 1 or 2, got {}", axis);
        Self::new(2 - axis)
    }

    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn num_slices<B: Backend>(&self, image: &Image<B, 3>) -> usize {
        image.shape()[self.axis]
    }

    /// `[H, W]` of every slice of `image`.
    pub fn slice_shape<B: Backend>(&self, image: &Image<B, 3>) -> [usize; 2] {
        let shape = image.shape();
        let mut rest = (0..3).filter(|&a| a != self.axis).map(|a| shape[a]);
        [rest.next().unwrap_or(0), rest.next().unwrap_or(0)]
    }

    fn slice_2d<B: Backend>(&self, image: &Image<B, 3>, index: usize) -> Tensor<B, 2> {
        let [h, w] = self.slice_shape(image);
        image.data().clone().narrow(self.axis, index, 1).reshape([h, w])
    }

    /// Slice `index` of every channel as one network input `[1, C, H, W]`.
    pub fn slice<B: Backend>(&self, channels: &[Image<B, 3>], index: usize) -> Result<Tensor<B, 4>> {
        ensure!(!channels.is_empty(), "Cannot slice an empty channel list");
        let shape = channels[0].shape();
        for (i, channel) in channels.iter().enumerate().skip(1) {
            ensure!(
                channel.shape() == shape,
                "Channel {} shape mismatch: {:?} vs {:?}",
                i,
                channel.shape(),
                shape
            );
        }
        ensure!(
            index < shape[self.axis],
            "Slice {} out of range, axis {} has {} slices",
            index,
            self.axis,
            shape[self.axis]
        );

        let [h, w] = self.slice_shape(&channels[0]);
        let planes: Vec<Tensor<B, 2>> = channels.iter().map(|c| self.slice_2d(c, index)).collect();
        Ok(Tensor::stack::<3>(planes, 0).reshape([1, channels.len(), h, w]))
    }

    /// Inverse of slicing a single-channel volume: `[H, W]` slices to a volume.
    pub fn stack<B: Backend>(&self, slices: Vec<Tensor<B, 2>>) -> Result<Tensor<B, 3>> {
        ensure!(!slices.is_empty(), "Cannot stack an empty slice list");
        Ok(Tensor::stack(slices, self.axis))
    }

    /// Per-slice outputs `[C, H, W]` to `[C, z, y, x]` with the slice axis
    /// in place.
    pub fn stack_channels<B: Backend>(&self, slices: Vec<Tensor<B, 3>>) -> Result<Tensor<B, 4>> {
        ensure!(!slices.is_empty(), "Cannot stack an empty slice list");
        Ok(Tensor::stack(slices, self.axis + 1))
    }

    /// Per-slice flows `[2, H, W]` to a displacement field `[2, z, y, x]`.
    pub fn stack_flows<B: Backend>(&self, flows: Vec<Tensor<B, 3>>) -> Result<Tensor<B, 4>> {
        if let Some(flow) = flows.first() {
            ensure!(flow.dims()[0] == 2, "Flows need 2 components, got {}", flow.dims()[0]);
        }
        self.stack_channels(flows)
    }
}
