use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use super::spatial_transform::SpatialTransformer;

/// Velocity Integration Module (Scaling and Squaring).
///
/// Integrates a stationary velocity field to produce a diffeomorphic
/// displacement field, $\phi = \exp(v)$:
/// 1. Scale flow by $1/2^N$
/// 2. Compose $v_{i+1} = v_i + v_i \circ (x + v_i)$ for N steps.
#[derive(Module, Debug)]
pub struct VecInt<B: Backend> {
    stn: SpatialTransformer<B>,
    nsteps: usize,
}

impl<B: Backend> VecInt<B> {
    /// # Arguments
    /// * `nsteps` - Number of squaring steps (7 gives 128 sub-steps)
    pub fn new(nsteps: usize) -> Self {
        Self {
            stn: SpatialTransformer::new(),
            nsteps,
        }
    }

    pub fn nsteps(&self) -> usize {
        self.nsteps
    }

    /// Velocity field [B, 2, H, W] to displacement field [B, 2, H, W].
    pub fn forward(&self, flow: Tensor<B, 4>) -> Tensor<B, 4> {
        let scale = 1.0 / (2.0f32).powi(self.nsteps as i32);
        let mut flow = flow * scale;

        for _ in 0..self.nsteps {
            // STN(flow, flow) = flow(x + flow(x))
            let warped_flow = self.stn.forward(flow.clone(), flow.clone());
            flow = flow + warped_flow;
        }

        flow
    }
}
