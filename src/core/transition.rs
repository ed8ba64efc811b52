//! Replay batches in struct-of-arrays layout.

use burn::prelude::*;

/// A batch of transitions with observations and actions stored flattened
/// in row-major order (`batch_size * dim` values per field).
///
/// `continuation` is `1.0` for transitions whose successor state should be
/// bootstrapped from and `0.0` for terminal ones. Timeout-truncated episodes
/// keep `1.0` since the state itself is not terminal.
#[derive(Debug, Clone)]
pub struct TransitionBatch {
    observations: Vec<f32>,
    actions: Vec<f32>,
    rewards: Vec<f32>,
    continuation: Vec<f32>,
    next_observations: Vec<f32>,
    batch_size: usize,
    observation_dim: usize,
    action_dim: usize,
}

impl TransitionBatch {
    /// Assemble a batch, checking that every field agrees on `batch_size`.
    ///
    /// # Panics
    /// Panics when the flattened lengths are inconsistent with
    /// `batch_size * observation_dim` / `batch_size * action_dim`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        observations: Vec<f32>,
        actions: Vec<f32>,
        rewards: Vec<f32>,
        continuation: Vec<f32>,
        next_observations: Vec<f32>,
        batch_size: usize,
        observation_dim: usize,
        action_dim: usize,
    ) -> Self {
        assert_eq!(observations.len(), batch_size * observation_dim);
        assert_eq!(next_observations.len(), batch_size * observation_dim);
        assert_eq!(actions.len(), batch_size * action_dim);
        assert_eq!(rewards.len(), batch_size);
        assert_eq!(continuation.len(), batch_size);

        Self {
            observations,
            actions,
            rewards,
            continuation,
            next_observations,
            batch_size,
            observation_dim,
            action_dim,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn observations<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(self.observations.as_slice(), device)
            .reshape([self.batch_size, self.observation_dim])
    }

    pub fn next_observations<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(self.next_observations.as_slice(), device)
            .reshape([self.batch_size, self.observation_dim])
    }

    pub fn actions<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(self.actions.as_slice(), device)
            .reshape([self.batch_size, self.action_dim])
    }

    pub fn rewards<B: Backend>(&self, device: &B::Device) -> Tensor<B, 1> {
        Tensor::from_floats(self.rewards.as_slice(), device)
    }

    pub fn continuation<B: Backend>(&self, device: &B::Device) -> Tensor<B, 1> {
        Tensor::from_floats(self.continuation.as_slice(), device)
    }
}
