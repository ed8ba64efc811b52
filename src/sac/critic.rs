//! Critic ensemble with random target subsampling.
//!
//! The classic twin-critic minimum generalizes here to `num_qs` heads. The
//! bootstrap target takes the minimum over a random subset of `num_min_qs`
//! target heads, which softens the pessimism of the full-ensemble minimum
//! while keeping overestimation in check.

use burn::module::Module;
use burn::nn::Linear;
use burn::prelude::*;

use crate::core::env_spec::EnvironmentSpec;
use crate::core::rng::PrngKey;
use crate::sac::config::SacConfig;
use crate::sac::nets::{init_linear, Mlp};

// ============================================================================
// Q-network
// ============================================================================

/// A single state-action value head: MLP over `concat(obs, action)` with a
/// scalar output. Dropout and layer norm on the hidden layers follow the
/// config; dropout fires only when `train = true`.
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    trunk: Mlp<B>,
    head: Linear<B>,
}

impl<B: Backend> QNetwork<B> {
    pub fn new(
        key: PrngKey,
        spec: &EnvironmentSpec,
        config: &SacConfig,
        device: &B::Device,
    ) -> Self {
        let (trunk_key, head_key) = key.split();
        let trunk = Mlp::new(
            trunk_key,
            spec.observation_dim + spec.action_dim,
            &config.hidden_dims,
            config.activation,
            config.critic_dropout_rate,
            config.critic_layer_norm,
            device,
        );
        let head = init_linear(head_key, trunk.d_output(), 1, device);
        Self { trunk, head }
    }

    /// Q-values for a batch, shape `[batch]`.
    pub fn forward(
        &self,
        observations: Tensor<B, 2>,
        actions: Tensor<B, 2>,
        train: bool,
    ) -> Tensor<B, 1> {
        let input = Tensor::cat(vec![observations, actions], 1);
        let features = self.trunk.forward(input, train);
        self.head.forward(features).flatten(0, 1)
    }
}

// ============================================================================
// Ensemble
// ============================================================================

/// `num_qs` independently initialized Q-networks.
#[derive(Module, Debug)]
pub struct CriticEnsemble<B: Backend> {
    heads: Vec<QNetwork<B>>,
}

impl<B: Backend> CriticEnsemble<B> {
    pub fn new(
        key: PrngKey,
        spec: &EnvironmentSpec,
        config: &SacConfig,
        device: &B::Device,
    ) -> Self {
        let mut key = key;
        let mut heads = Vec::with_capacity(config.num_qs);
        for _ in 0..config.num_qs {
            let (next, head_key) = key.split();
            key = next;
            heads.push(QNetwork::new(head_key, spec, config, device));
        }
        Self { heads }
    }

    pub fn num_heads(&self) -> usize {
        self.heads.len()
    }

    /// Per-head Q-values, one `[batch]` tensor per head.
    pub fn forward_all(
        &self,
        observations: Tensor<B, 2>,
        actions: Tensor<B, 2>,
        train: bool,
    ) -> Vec<Tensor<B, 1>> {
        self.heads
            .iter()
            .map(|head| head.forward(observations.clone(), actions.clone(), train))
            .collect()
    }

    /// Ensemble holding only the heads at `indices`, parameters shared with
    /// `self` by clone.
    pub fn subsample(&self, indices: &[usize]) -> Self {
        Self {
            heads: indices.iter().map(|&i| self.heads[i].clone()).collect(),
        }
    }

    /// Randomly subsample `num_min_qs` heads with the key; `None` keeps the
    /// whole ensemble.
    pub fn subsample_with(&self, key: PrngKey, num_min_qs: Option<usize>) -> Self {
        let indices = subsample_indices(key, num_min_qs, self.num_heads());
        self.subsample(&indices)
    }
}

/// Indices of the target heads backing one bootstrap step.
///
/// `None` or `k >= num_qs` is the identity `0..num_qs`; otherwise the first
/// `k` entries of a keyed shuffle, distinct by construction.
pub fn subsample_indices(key: PrngKey, num_min_qs: Option<usize>, num_qs: usize) -> Vec<usize> {
    match num_min_qs {
        Some(k) if k < num_qs => {
            let mut indices = key.shuffled_indices(num_qs);
            indices.truncate(k);
            indices
        }
        _ => (0..num_qs).collect(),
    }
}

/// Elementwise minimum over per-head Q-values.
///
/// # Panics
/// Panics on an empty slice; config validation keeps ensembles non-empty.
pub fn min_over_heads<B: Backend>(qs: Vec<Tensor<B, 1>>) -> Tensor<B, 1> {
    qs.into_iter()
        .reduce(|acc, q| acc.min_pair(q))
        .expect("ensemble has at least one head")
}

/// Elementwise mean over per-head Q-values.
pub fn mean_over_heads<B: Backend>(qs: Vec<Tensor<B, 1>>) -> Tensor<B, 1> {
    let n = qs.len();
    qs.into_iter()
        .reduce(|acc, q| acc + q)
        .expect("ensemble has at least one head")
        .div_scalar(n as f32)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    fn make_ensemble(num_qs: usize, device: &<B as Backend>::Device) -> CriticEnsemble<B> {
        let spec = EnvironmentSpec::new(3, 2);
        let config = SacConfig::default()
            .with_num_qs(num_qs)
            .with_hidden_dims(vec![16]);
        CriticEnsemble::new(PrngKey::new(13), &spec, &config, device)
    }

    fn batch(device: &<B as Backend>::Device) -> (Tensor<B, 2>, Tensor<B, 2>) {
        (
            Tensor::from_floats([[0.1, 0.2, 0.3], [-0.5, 0.0, 0.5]], device),
            Tensor::from_floats([[0.5, -0.5], [0.1, 0.9]], device),
        )
    }

    #[test]
    fn test_forward_all_shapes() {
        let device = Default::default();
        let ensemble = make_ensemble(4, &device);
        let (obs, act) = batch(&device);
        let qs = ensemble.forward_all(obs, act, false);
        assert_eq!(qs.len(), 4);
        for q in qs {
            assert_eq!(q.dims(), [2]);
        }
    }

    #[test]
    fn test_heads_are_independent() {
        let device = Default::default();
        let ensemble = make_ensemble(2, &device);
        let (obs, act) = batch(&device);
        let qs = ensemble.forward_all(obs, act, false);
        let a = qs[0].clone().into_data();
        let b = qs[1].clone().into_data();
        assert_ne!(
            a.as_slice::<f32>().unwrap(),
            b.as_slice::<f32>().unwrap(),
            "independently initialized heads should disagree"
        );
    }

    #[test]
    fn test_subsample_indices_identity_when_unset() {
        let key = PrngKey::new(0);
        assert_eq!(subsample_indices(key, None, 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(subsample_indices(key, Some(5), 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(subsample_indices(key, Some(9), 5), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_subsample_indices_distinct_and_in_range() {
        let indices = subsample_indices(PrngKey::new(3), Some(3), 10);
        assert_eq!(indices.len(), 3);
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 3, "indices must be distinct");
        for &i in &indices {
            assert!(i < 10);
        }
    }

    #[test]
    fn test_subsample_indices_deterministic() {
        let key = PrngKey::new(17);
        assert_eq!(
            subsample_indices(key, Some(2), 10),
            subsample_indices(key, Some(2), 10)
        );
    }

    #[test]
    fn test_subsample_preserves_head_outputs() {
        let device = Default::default();
        let ensemble = make_ensemble(5, &device);
        let (obs, act) = batch(&device);
        let all = ensemble.forward_all(obs.clone(), act.clone(), false);

        let sub = ensemble.subsample(&[3, 1]);
        let sub_qs = sub.forward_all(obs, act, false);
        assert_eq!(sub.num_heads(), 2);
        assert_eq!(
            sub_qs[0].clone().into_data().as_slice::<f32>().unwrap(),
            all[3].clone().into_data().as_slice::<f32>().unwrap()
        );
        assert_eq!(
            sub_qs[1].clone().into_data().as_slice::<f32>().unwrap(),
            all[1].clone().into_data().as_slice::<f32>().unwrap()
        );
    }

    #[test]
    fn test_min_and_mean_over_heads() {
        let device = Default::default();
        let qs: Vec<Tensor<B, 1>> = vec![
            Tensor::from_floats([1.0, 4.0], &device),
            Tensor::from_floats([3.0, 2.0], &device),
            Tensor::from_floats([2.0, 6.0], &device),
        ];

        let min = min_over_heads(qs.clone());
        let min_vals = min.into_data();
        assert_eq!(min_vals.as_slice::<f32>().unwrap(), &[1.0, 2.0]);

        let mean = mean_over_heads(qs);
        let mean_vals = mean.into_data();
        assert_eq!(mean_vals.as_slice::<f32>().unwrap(), &[2.0, 4.0]);
    }
}
