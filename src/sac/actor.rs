//! Tanh-squashed Gaussian policy network.

use burn::module::Module;
use burn::nn::Linear;
use burn::prelude::*;

use crate::core::env_spec::EnvironmentSpec;
use crate::core::rng::PrngKey;
use crate::sac::config::SacConfig;
use crate::sac::distribution::{
    clamp_log_std, sample_squashed_gaussian, squashed_gaussian_mode,
};
use crate::sac::nets::{init_linear, Mlp};

/// Policy network: shared MLP trunk with separate mean and log-std heads.
///
/// Log-std outputs are softly clamped before use so the Gaussian never
/// collapses or explodes.
#[derive(Module, Debug)]
pub struct Actor<B: Backend> {
    trunk: Mlp<B>,
    mean_head: Linear<B>,
    log_std_head: Linear<B>,
    action_dim: usize,
}

impl<B: Backend> Actor<B> {
    pub fn new(
        key: PrngKey,
        spec: &EnvironmentSpec,
        config: &SacConfig,
        device: &B::Device,
    ) -> Self {
        let (key, trunk_key) = key.split();
        let (mean_key, log_std_key) = key.split();

        let trunk = Mlp::new(
            trunk_key,
            spec.observation_dim,
            &config.hidden_dims,
            config.activation,
            None,
            false,
            device,
        );
        let d_hidden = trunk.d_output();

        Self {
            trunk,
            mean_head: init_linear(mean_key, d_hidden, spec.action_dim, device),
            log_std_head: init_linear(log_std_key, d_hidden, spec.action_dim, device),
            action_dim: spec.action_dim,
        }
    }

    /// Distribution parameters for a batch of observations: `(mean,
    /// clamped log_std)`, both `[batch, action_dim]`.
    pub fn forward(&self, observations: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let features = self.trunk.forward(observations, false);
        let mean = self.mean_head.forward(features.clone());
        let log_std = clamp_log_std(self.log_std_head.forward(features));
        (mean, log_std)
    }

    /// Sample reparameterized actions with noise drawn from `key`.
    ///
    /// Returns `(actions, log_probs)`; gradients flow through the network,
    /// not through the noise.
    pub fn sample_and_log_prob(
        &self,
        observations: Tensor<B, 2>,
        key: PrngKey,
    ) -> (Tensor<B, 2>, Tensor<B, 1>) {
        let [batch_size, _] = observations.dims();
        let device = observations.device();
        let (mean, log_std) = self.forward(observations);

        let noise_values = key.standard_normal(batch_size * self.action_dim);
        let noise = Tensor::<B, 1>::from_floats(noise_values.as_slice(), &device)
            .reshape([batch_size, self.action_dim]);

        sample_squashed_gaussian(mean, log_std, noise)
    }

    /// Deterministic action, `tanh(mean)`.
    pub fn mode(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        let (mean, _) = self.forward(observations);
        squashed_gaussian_mode(mean)
    }
}

// ============================================================================
// Tests
// ============================================================================
