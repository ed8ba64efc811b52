//! SAC hyperparameters and validation.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

// ============================================================================
// Activation
// ============================================================================

/// Hidden-layer activation for actor and critic MLPs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Gelu,
    Tanh,
}

impl Activation {
    pub fn apply<B: burn::prelude::Backend, const D: usize>(
        &self,
        x: burn::prelude::Tensor<B, D>,
    ) -> burn::prelude::Tensor<B, D> {
        use burn::tensor::activation;
        match self {
            Activation::Relu => activation::relu(x),
            Activation::Gelu => activation::gelu(x),
            Activation::Tanh => activation::tanh(x),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the SAC agent.
///
/// Defaults follow the standard continuous-control settings: twin critics,
/// soft target updates with tau=0.005, automatic entropy tuning starting
/// from temperature 1.0. Ensemble variants (REDQ-style) raise `num_qs` and
/// set `num_min_qs` to subsample bootstrap heads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SacConfig {
    // ========================================================================
    // Critic ensemble
    // ========================================================================
    /// Number of critic heads trained in parallel.
    pub num_qs: usize,

    /// Number of target heads subsampled for the bootstrap minimum.
    /// None (or >= num_qs) uses the whole ensemble.
    pub num_min_qs: Option<usize>,

    // ========================================================================
    // Learning rates
    // ========================================================================
    /// Actor network learning rate.
    pub actor_lr: f64,

    /// Critic ensemble learning rate.
    pub critic_lr: f64,

    /// Temperature (log_temp) learning rate.
    pub temp_lr: f64,

    // ========================================================================
    // Network architecture
    // ========================================================================
    /// Hidden layer widths shared by actor trunk and critic heads.
    pub hidden_dims: Vec<usize>,

    /// Hidden-layer activation.
    pub activation: Activation,

    /// Dropout probability on critic hidden layers. None disables dropout.
    /// Active only during the critic's own gradient step.
    pub critic_dropout_rate: Option<f32>,

    /// Apply layer normalization after each critic hidden layer.
    pub critic_layer_norm: bool,

    // ========================================================================
    // Update semantics
    // ========================================================================
    /// Polyak coefficient for target updates. 1.0 = hard copy, 0.0 = frozen.
    pub tau: f32,

    /// Entropy target. None resolves to `-action_dim / 2` at agent creation.
    pub target_entropy: Option<f32>,

    /// Initial entropy temperature; `log_temp` starts at its logarithm.
    pub init_temperature: f32,

    /// Discount factor for future rewards.
    pub discount: f32,

    /// Include the entropy term in the critic's bootstrap target.
    pub backup_entropy: bool,
}

impl Default for SacConfig {
    fn default() -> Self {
        Self {
            num_qs: 2,
            num_min_qs: None,
            actor_lr: 3e-4,
            critic_lr: 3e-4,
            temp_lr: 3e-4,
            hidden_dims: vec![256, 256],
            activation: Activation::Relu,
            critic_dropout_rate: None,
            critic_layer_norm: false,
            tau: 0.005,
            target_entropy: None,
            init_temperature: 1.0,
            discount: 0.99,
            backup_entropy: true,
        }
    }
}

impl SacConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensemble preset in the REDQ style: a large critic ensemble with a
    /// small random subset backing each bootstrap target.
    pub fn ensemble(num_qs: usize, num_min_qs: usize) -> Self {
        Self {
            num_qs,
            num_min_qs: Some(num_min_qs),
            ..Self::default()
        }
    }

    /// Check the configuration for values the agent cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_qs == 0 {
            return Err(ConfigError::EmptyEnsemble);
        }
        if let Some(k) = self.num_min_qs {
            if k == 0 {
                return Err(ConfigError::EmptySubsample);
            }
            if k > self.num_qs {
                return Err(ConfigError::SubsampleTooLarge {
                    num_min_qs: k,
                    num_qs: self.num_qs,
                });
            }
        }
        if self.hidden_dims.is_empty() {
            return Err(ConfigError::EmptyHiddenDims);
        }
        if !(0.0..=1.0).contains(&self.tau) || !self.tau.is_finite() {
            return Err(ConfigError::InvalidTau(self.tau));
        }
        if let Some(rate) = self.critic_dropout_rate {
            if !(0.0..1.0).contains(&rate) || !rate.is_finite() {
                return Err(ConfigError::InvalidDropoutRate(rate));
            }
        }
        for (name, lr) in [
            ("actor_lr", self.actor_lr),
            ("critic_lr", self.critic_lr),
            ("temp_lr", self.temp_lr),
        ] {
            if !(lr.is_finite() && lr > 0.0) {
                return Err(ConfigError::InvalidLearningRate { name, value: lr });
            }
        }
        if !(self.init_temperature.is_finite() && self.init_temperature > 0.0) {
            return Err(ConfigError::InvalidInitTemperature(self.init_temperature));
        }
        if !(0.0..=1.0).contains(&self.discount) || !self.discount.is_finite() {
            return Err(ConfigError::InvalidDiscount(self.discount));
        }
        if self.tau > 0.1 {
            log::warn!(
                "tau={} is unusually large for soft updates; targets will track fast",
                self.tau
            );
        }
        Ok(())
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set the critic ensemble size.
    pub fn with_num_qs(mut self, num_qs: usize) -> Self {
        self.num_qs = num_qs;
        self
    }

    /// Set the number of subsampled target heads.
    pub fn with_num_min_qs(mut self, num_min_qs: usize) -> Self {
        self.num_min_qs = Some(num_min_qs);
        self
    }

    /// Set one learning rate for actor, critic, and temperature.
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.actor_lr = lr;
        self.critic_lr = lr;
        self.temp_lr = lr;
        self
    }

    /// Set the actor learning rate.
    pub fn with_actor_lr(mut self, lr: f64) -> Self {
        self.actor_lr = lr;
        self
    }

    /// Set the critic learning rate.
    pub fn with_critic_lr(mut self, lr: f64) -> Self {
        self.critic_lr = lr;
        self
    }

    /// Set the temperature learning rate.
    pub fn with_temp_lr(mut self, lr: f64) -> Self {
        self.temp_lr = lr;
        self
    }

    /// Set the hidden layer widths.
    pub fn with_hidden_dims(mut self, dims: Vec<usize>) -> Self {
        self.hidden_dims = dims;
        self
    }

    /// Set the hidden-layer activation.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Enable critic dropout with the given rate.
    pub fn with_critic_dropout_rate(mut self, rate: f32) -> Self {
        self.critic_dropout_rate = Some(rate);
        self
    }

    /// Enable or disable critic layer normalization.
    pub fn with_critic_layer_norm(mut self, enabled: bool) -> Self {
        self.critic_layer_norm = enabled;
        self
    }

    /// Set the Polyak coefficient.
    pub fn with_tau(mut self, tau: f32) -> Self {
        self.tau = tau;
        self
    }

    /// Set the entropy target explicitly.
    pub fn with_target_entropy(mut self, target: f32) -> Self {
        self.target_entropy = Some(target);
        self
    }

    /// Set the initial temperature.
    pub fn with_init_temperature(mut self, temperature: f32) -> Self {
        self.init_temperature = temperature;
        self
    }

    /// Set the discount factor.
    pub fn with_discount(mut self, discount: f32) -> Self {
        self.discount = discount;
        self
    }

    /// Include or exclude the entropy term from the bootstrap target.
    pub fn with_backup_entropy(mut self, enabled: bool) -> Self {
        self.backup_entropy = enabled;
        self
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration rejected by [`SacConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyEnsemble,
    EmptySubsample,
    SubsampleTooLarge { num_min_qs: usize, num_qs: usize },
    EmptyHiddenDims,
    InvalidTau(f32),
    InvalidDropoutRate(f32),
    InvalidLearningRate { name: &'static str, value: f64 },
    InvalidInitTemperature(f32),
    InvalidDiscount(f32),
    ZeroObservationDim,
    ZeroActionDim,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyEnsemble => write!(f, "num_qs must be at least 1"),
            ConfigError::EmptySubsample => write!(f, "num_min_qs must be at least 1 when set"),
            ConfigError::SubsampleTooLarge { num_min_qs, num_qs } => write!(
                f,
                "num_min_qs ({}) exceeds ensemble size num_qs ({})",
                num_min_qs, num_qs
            ),
            ConfigError::EmptyHiddenDims => write!(f, "hidden_dims must not be empty"),
            ConfigError::InvalidTau(tau) => {
                write!(f, "tau must be in [0, 1], got {}", tau)
            }
            ConfigError::InvalidDropoutRate(rate) => {
                write!(f, "critic_dropout_rate must be in [0, 1), got {}", rate)
            }
            ConfigError::InvalidLearningRate { name, value } => {
                write!(f, "{} must be positive and finite, got {}", name, value)
            }
            ConfigError::InvalidInitTemperature(t) => {
                write!(f, "init_temperature must be positive and finite, got {}", t)
            }
            ConfigError::InvalidDiscount(d) => {
                write!(f, "discount must be in [0, 1], got {}", d)
            }
            ConfigError::ZeroObservationDim => {
                write!(f, "observation_dim must be at least 1")
            }
            ConfigError::ZeroActionDim => {
                write!(f, "action_dim must be at least 1")
            }
        }
    }
}

impl Error for ConfigError {}

// ============================================================================
// Tests
// ============================================================================
