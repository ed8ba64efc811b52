//! The SAC agent: critic, actor, and temperature updates.
//!
//! The agent is a value. Every update consumes `self` and returns the
//! successor agent together with that step's metrics, so callers never
//! observe a half-updated state and identical inputs always yield identical
//! outputs. Randomness comes from the agent's own key, advanced by
//! splitting on each stochastic operation.

use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

use crate::core::env_spec::EnvironmentSpec;
use crate::core::rng::PrngKey;
use crate::core::target_network::soft_update;
use crate::core::transition::TransitionBatch;
use crate::sac::actor::Actor;
use crate::sac::config::{ConfigError, SacConfig};
use crate::sac::critic::{mean_over_heads, min_over_heads, CriticEnsemble};
use crate::sac::temperature::{temperature_loss, Temperature};

type AdamOpt<M, B> = OptimizerAdaptor<Adam, M, B>;

// ============================================================================
// Loss functions
// ============================================================================

/// Bootstrap target for the critic update:
///
/// ```text
/// target = reward + discount * continuation * (next_q - temp * next_log_prob)
/// ```
///
/// With `backup_entropy = false` the entropy term is dropped. Terminal
/// transitions (`continuation = 0`) reduce to the reward, as does
/// `discount = 0`.
pub fn backup_target<B: Backend>(
    rewards: Tensor<B, 1>,
    continuation: Tensor<B, 1>,
    next_q: Tensor<B, 1>,
    next_log_probs: Tensor<B, 1>,
    temperature: f32,
    discount: f32,
    backup_entropy: bool,
) -> Tensor<B, 1> {
    let next_value = if backup_entropy {
        next_q - next_log_probs.mul_scalar(temperature)
    } else {
        next_q
    };
    rewards + continuation.mul_scalar(discount) * next_value
}

/// Mean squared Bellman error, averaged over every ensemble head.
pub fn critic_loss<B: Backend>(qs: &[Tensor<B, 1>], target: &Tensor<B, 1>) -> Tensor<B, 1> {
    let n = qs.len() as f32;
    qs.iter()
        .map(|q| (q.clone() - target.clone()).powf_scalar(2.0).mean())
        .reduce(|acc, head| acc + head)
        .expect("ensemble has at least one head")
        .div_scalar(n)
}

/// Policy loss `mean(temp * log_prob - q)`: maximize Q plus entropy bonus.
pub fn actor_loss<B: Backend>(
    q: Tensor<B, 1>,
    log_probs: Tensor<B, 1>,
    temperature: f32,
) -> Tensor<B, 1> {
    (log_probs.mul_scalar(temperature) - q).mean()
}

// ============================================================================
// Metrics
// ============================================================================

/// Scalars from one critic update.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriticMetrics {
    pub critic_loss: f32,
    pub mean_q: f32,
}

/// Scalars from one actor update. `entropy` is `mean(-log_prob)` of the
/// freshly sampled actions and feeds the temperature update.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActorMetrics {
    pub actor_loss: f32,
    pub entropy: f32,
}

/// Scalars from one temperature update. `temperature` is the value the
/// loss was computed with, before the optimizer step.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemperatureMetrics {
    pub temperature: f32,
    pub temperature_loss: f32,
}

/// Combined metrics from a full [`SacAgent::update`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SacMetrics {
    pub critic_loss: f32,
    pub mean_q: f32,
    pub actor_loss: f32,
    pub entropy: f32,
    pub temperature: f32,
    pub temperature_loss: f32,
}

impl SacMetrics {
    /// Format metrics for logging.
    pub fn format(&self) -> String {
        format!(
            "critic_loss={:.3} | mean_q={:.3} | actor_loss={:.3} | entropy={:.3} | temp={:.4} | temp_loss={:.4}",
            self.critic_loss,
            self.mean_q,
            self.actor_loss,
            self.entropy,
            self.temperature,
            self.temperature_loss
        )
    }
}

// ============================================================================
// Agent
// ============================================================================

/// Hyperparameters fixed at construction and consumed by the updates.
#[derive(Debug, Clone, Copy)]
struct UpdateParams {
    tau: f32,
    discount: f32,
    num_min_qs: Option<usize>,
    backup_entropy: bool,
    target_entropy: f32,
    actor_lr: f64,
    critic_lr: f64,
    temp_lr: f64,
}

/// Soft Actor-Critic agent with a critic ensemble and automatic entropy
/// temperature tuning.
///
/// Owns the four networks, their Adam optimizers, the current random key,
/// and the device. The target critic starts as an exact copy of the critic
/// and changes only through Polyak averaging at the end of each critic
/// step.
pub struct SacAgent<B: AutodiffBackend> {
    actor: Actor<B>,
    critic: CriticEnsemble<B>,
    target_critic: CriticEnsemble<B>,
    temperature: Temperature<B>,
    actor_optim: AdamOpt<Actor<B>, B>,
    critic_optim: AdamOpt<CriticEnsemble<B>, B>,
    temp_optim: AdamOpt<Temperature<B>, B>,
    key: PrngKey,
    spec: EnvironmentSpec,
    params: UpdateParams,
    device: B::Device,
}

impl<B: AutodiffBackend> core::fmt::Debug for SacAgent<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SacAgent")
            .field("spec", &self.spec)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl<B: AutodiffBackend> SacAgent<B> {
    /// Build an agent with all weights derived from `seed`.
    ///
    /// Fails if the configuration does not validate or the spec has a
    /// zero-sized observation or action space. Two agents built from the
    /// same spec, config, and seed are parameter-identical.
    pub fn new(
        spec: EnvironmentSpec,
        config: &SacConfig,
        seed: u64,
        device: &B::Device,
    ) -> Result<Self, ConfigError> {
        if spec.observation_dim == 0 {
            return Err(ConfigError::ZeroObservationDim);
        }
        if spec.action_dim == 0 {
            return Err(ConfigError::ZeroActionDim);
        }
        config.validate()?;

        let key = PrngKey::new(seed);
        let (key, actor_key) = key.split();
        let (key, critic_key) = key.split();

        let actor = Actor::new(actor_key, &spec, config, device);
        let critic = CriticEnsemble::new(critic_key, &spec, config, device);
        let target_critic = critic.clone();
        let temperature = Temperature::new(config.init_temperature, device);

        let adam = AdamConfig::new().with_epsilon(1e-5);
        let actor_optim = adam.init();
        let critic_optim = adam.init();
        let temp_optim = adam.init();

        let target_entropy = config
            .target_entropy
            .unwrap_or_else(|| spec.default_target_entropy());

        Ok(Self {
            actor,
            critic,
            target_critic,
            temperature,
            actor_optim,
            critic_optim,
            temp_optim,
            key,
            spec,
            params: UpdateParams {
                tau: config.tau,
                discount: config.discount,
                num_min_qs: config.num_min_qs,
                backup_entropy: config.backup_entropy,
                target_entropy,
                actor_lr: config.actor_lr,
                critic_lr: config.critic_lr,
                temp_lr: config.temp_lr,
            },
            device: device.clone(),
        })
    }

    /// One gradient step on the critic ensemble, followed by the soft
    /// target sync.
    ///
    /// The bootstrap target takes the minimum over a keyed subsample of
    /// target heads and is detached, so its gradient never reaches the
    /// actor, the temperature, or the target parameters. Dropout is active
    /// only on this forward pass.
    pub fn update_critic(self, batch: &TransitionBatch) -> (Self, CriticMetrics) {
        if batch.batch_size() == 0 {
            log::warn!("update_critic called with an empty batch; skipping");
            return (self, CriticMetrics::default());
        }

        let Self {
            actor,
            critic,
            target_critic,
            temperature,
            actor_optim,
            mut critic_optim,
            temp_optim,
            key,
            spec,
            params,
            device,
        } = self;

        let (key, noise_key) = key.split();
        let (key, subsample_key) = key.split();

        let observations = batch.observations::<B>(&device);
        let actions = batch.actions::<B>(&device);
        let next_observations = batch.next_observations::<B>(&device);
        let rewards = batch.rewards::<B>(&device);
        let continuation = batch.continuation::<B>(&device);

        let (next_actions, next_log_probs) =
            actor.sample_and_log_prob(next_observations.clone(), noise_key);

        let target_heads = target_critic.subsample_with(subsample_key, params.num_min_qs);
        let next_q = min_over_heads(target_heads.forward_all(
            next_observations,
            next_actions,
            false,
        ));
        let target = backup_target(
            rewards,
            continuation,
            next_q,
            next_log_probs,
            temperature.value(),
            params.discount,
            params.backup_entropy,
        )
        .detach();

        let qs = critic.forward_all(observations, actions, true);
        let mean_q = tensor_to_scalar(&mean_over_heads(qs.clone()).mean());
        let loss = critic_loss(&qs, &target);
        let loss_value = tensor_to_scalar(&loss);

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &critic);
        let critic = critic_optim.step(params.critic_lr, critic, grads);

        let target_critic = soft_update(&critic, target_critic, params.tau);

        (
            Self {
                actor,
                critic,
                target_critic,
                temperature,
                actor_optim,
                critic_optim,
                temp_optim,
                key,
                spec,
                params,
                device,
            },
            CriticMetrics {
                critic_loss: loss_value,
                mean_q,
            },
        )
    }

    /// One gradient step on the actor against the current critic ensemble
    /// mean, with dropout off.
    pub fn update_actor(self, batch: &TransitionBatch) -> (Self, ActorMetrics) {
        if batch.batch_size() == 0 {
            log::warn!("update_actor called with an empty batch; skipping");
            return (self, ActorMetrics::default());
        }

        let Self {
            actor,
            critic,
            target_critic,
            temperature,
            mut actor_optim,
            critic_optim,
            temp_optim,
            key,
            spec,
            params,
            device,
        } = self;

        let (key, noise_key) = key.split();

        let observations = batch.observations::<B>(&device);
        let (sampled_actions, log_probs) =
            actor.sample_and_log_prob(observations.clone(), noise_key);

        let q = mean_over_heads(critic.forward_all(observations, sampled_actions, false));
        let loss = actor_loss(q, log_probs.clone(), temperature.value());
        let loss_value = tensor_to_scalar(&loss);
        let entropy = -tensor_to_scalar(&log_probs.mean());

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &actor);
        let actor = actor_optim.step(params.actor_lr, actor, grads);

        (
            Self {
                actor,
                critic,
                target_critic,
                temperature,
                actor_optim,
                critic_optim,
                temp_optim,
                key,
                spec,
                params,
                device,
            },
            ActorMetrics {
                actor_loss: loss_value,
                entropy,
            },
        )
    }

    /// One gradient step on `log_temp` towards the entropy target, driven
    /// by the entropy observed in the actor step.
    pub fn update_temperature(self, entropy: f32) -> (Self, TemperatureMetrics) {
        let Self {
            actor,
            critic,
            target_critic,
            temperature,
            actor_optim,
            critic_optim,
            mut temp_optim,
            key,
            spec,
            params,
            device,
        } = self;

        let temp_tensor = temperature.forward();
        let temp_value = tensor_to_scalar(&temp_tensor);
        let loss = temperature_loss(temp_tensor, entropy, params.target_entropy);
        let loss_value = tensor_to_scalar(&loss);

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &temperature);
        let temperature = temp_optim.step(params.temp_lr, temperature, grads);

        (
            Self {
                actor,
                critic,
                target_critic,
                temperature,
                actor_optim,
                critic_optim,
                temp_optim,
                key,
                spec,
                params,
                device,
            },
            TemperatureMetrics {
                temperature: temp_value,
                temperature_loss: loss_value,
            },
        )
    }

    /// Full SAC step: critic, then actor, then temperature.
    pub fn update(self, batch: &TransitionBatch) -> (Self, SacMetrics) {
        if batch.batch_size() == 0 {
            log::warn!("update called with an empty batch; skipping");
            return (self, SacMetrics::default());
        }

        let (agent, critic_metrics) = self.update_critic(batch);
        let (agent, actor_metrics) = agent.update_actor(batch);
        let (agent, temp_metrics) = agent.update_temperature(actor_metrics.entropy);

        (
            agent,
            SacMetrics {
                critic_loss: critic_metrics.critic_loss,
                mean_q: critic_metrics.mean_q,
                actor_loss: actor_metrics.actor_loss,
                entropy: actor_metrics.entropy,
                temperature: temp_metrics.temperature,
                temperature_loss: temp_metrics.temperature_loss,
            },
        )
    }

    /// Sample stochastic actions for flattened row-major observations.
    ///
    /// Advances the agent's key, so repeated calls explore. Runs on the
    /// inner (non-autodiff) module.
    pub fn sample_actions(mut self, observations: &[f32]) -> (Self, Vec<f32>) {
        assert_eq!(
            observations.len() % self.spec.observation_dim,
            0,
            "observations length must be a multiple of observation_dim"
        );
        let batch_size = observations.len() / self.spec.observation_dim;

        let (key, noise_key) = self.key.split();
        self.key = key;

        let actor = self.actor.valid();
        let obs = Tensor::<B::InnerBackend, 1>::from_floats(observations, &self.device)
            .reshape([batch_size, self.spec.observation_dim]);
        let (actions, _) = actor.sample_and_log_prob(obs, noise_key);
        let values = actions.into_data().as_slice::<f32>().unwrap().to_vec();

        (self, values)
    }

    /// Deterministic (mode) actions. Consumes no randomness and leaves the
    /// agent untouched.
    pub fn eval_actions(&self, observations: &[f32]) -> Vec<f32> {
        assert_eq!(
            observations.len() % self.spec.observation_dim,
            0,
            "observations length must be a multiple of observation_dim"
        );
        let batch_size = observations.len() / self.spec.observation_dim;

        let actor = self.actor.valid();
        let obs = Tensor::<B::InnerBackend, 1>::from_floats(observations, &self.device)
            .reshape([batch_size, self.spec.observation_dim]);
        let actions = actor.mode(obs);
        actions.into_data().as_slice::<f32>().unwrap().to_vec()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current entropy temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature.value()
    }

    /// Resolved entropy target.
    pub fn target_entropy(&self) -> f32 {
        self.params.target_entropy
    }

    /// The key the next stochastic operation will split.
    pub fn key(&self) -> PrngKey {
        self.key
    }

    pub fn spec(&self) -> EnvironmentSpec {
        self.spec
    }

    pub fn actor(&self) -> &Actor<B> {
        &self.actor
    }

    pub fn critic(&self) -> &CriticEnsemble<B> {
        &self.critic
    }

    pub fn target_critic(&self) -> &CriticEnsemble<B> {
        &self.target_critic
    }
}

fn tensor_to_scalar<B: Backend>(tensor: &Tensor<B, 1>) -> f32 {
    tensor.clone().into_data().as_slice::<f32>().unwrap()[0]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_backup_target_zero_discount_equals_reward() {
        let device = Default::default();
        let rewards: Tensor<B, 1> = Tensor::from_floats([1.0, -2.0, 0.5], &device);
        let continuation: Tensor<B, 1> = Tensor::from_floats([1.0, 1.0, 0.0], &device);
        let next_q: Tensor<B, 1> = Tensor::from_floats([10.0, 20.0, 30.0], &device);
        let next_log_probs: Tensor<B, 1> = Tensor::from_floats([-1.0, -1.0, -1.0], &device);

        let target = backup_target(rewards, continuation, next_q, next_log_probs, 0.5, 0.0, true);
        let vals = target.into_data();
        assert_eq!(vals.as_slice::<f32>().unwrap(), &[1.0, -2.0, 0.5]);
    }

    #[test]
    fn test_backup_target_terminal_masks_bootstrap() {
        let device = Default::default();
        let rewards: Tensor<B, 1> = Tensor::from_floats([1.0, 1.0], &device);
        let continuation: Tensor<B, 1> = Tensor::from_floats([1.0, 0.0], &device);
        let next_q: Tensor<B, 1> = Tensor::from_floats([2.0, 2.0], &device);
        let next_log_probs: Tensor<B, 1> = Tensor::from_floats([0.0, 0.0], &device);

        let target =
            backup_target(rewards, continuation, next_q, next_log_probs, 0.5, 0.9, false);
        let vals = target.into_data();
        let slice = vals.as_slice::<f32>().unwrap();
        assert!((slice[0] - (1.0 + 0.9 * 2.0)).abs() < 1e-6);
        assert!((slice[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_backup_target_entropy_term() {
        let device = Default::default();
        let rewards: Tensor<B, 1> = Tensor::from_floats([0.0], &device);
        let continuation: Tensor<B, 1> = Tensor::from_floats([1.0], &device);
        let next_q: Tensor<B, 1> = Tensor::from_floats([4.0], &device);
        let next_log_probs: Tensor<B, 1> = Tensor::from_floats([-2.0], &device);

        // next_value = 4 - 0.5 * (-2) = 5; target = 1.0 * 5
        let target = backup_target(
            rewards,
            continuation,
            next_q,
            next_log_probs,
            0.5,
            1.0,
            true,
        );
        let val = target.into_data().as_slice::<f32>().unwrap()[0];
        assert!((val - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_actor_loss_constant_batch_identity() {
        let device = Default::default();
        // Constant q and log_prob across the batch: the mean reduces to
        // temp * log_prob - q elementwise.
        let q: Tensor<B, 1> = Tensor::from_floats([2.0, 2.0, 2.0, 2.0], &device);
        let log_probs: Tensor<B, 1> = Tensor::from_floats([-1.5, -1.5, -1.5, -1.5], &device);
        let temperature = 0.4;

        let loss = actor_loss(q, log_probs, temperature);
        let val = loss.into_data().as_slice::<f32>().unwrap()[0];
        let expected = temperature * -1.5 - 2.0;
        assert!((val - expected).abs() < 1e-6, "{} vs {}", val, expected);
    }

    #[test]
    fn test_critic_loss_averages_heads() {
        let device = Default::default();
        let target: Tensor<B, 1> = Tensor::from_floats([1.0, 1.0], &device);
        let qs: Vec<Tensor<B, 1>> = vec![
            Tensor::from_floats([1.0, 1.0], &device), // error 0
            Tensor::from_floats([3.0, 1.0], &device), // mean squared error 2
        ];
        let loss = critic_loss(&qs, &target);
        let val = loss.into_data().as_slice::<f32>().unwrap()[0];
        assert!((val - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_metrics_format() {
        let metrics = SacMetrics {
            critic_loss: 0.5,
            mean_q: 1.25,
            actor_loss: -0.75,
            entropy: 2.0,
            temperature: 0.9,
            temperature_loss: 0.01,
        };
        let line = metrics.format();
        assert!(line.contains("critic_loss=0.500"));
        assert!(line.contains("mean_q=1.250"));
        assert!(line.contains("temp=0.9000"));
    }
}
