//! Soft Actor-Critic with a critic ensemble and entropy-temperature tuning.

pub mod actor;
pub mod agent;
pub mod config;
pub mod critic;
pub mod distribution;
pub mod nets;
pub mod temperature;


pub use actor::Actor;
pub use agent::{
    actor_loss, backup_target, critic_loss, ActorMetrics, CriticMetrics, SacAgent, SacMetrics,
    TemperatureMetrics,
};
pub use config::{Activation, ConfigError, SacConfig};
pub use critic::{
    mean_over_heads, min_over_heads, subsample_indices, CriticEnsemble, QNetwork,
};
pub use distribution::{
    clamp_log_std, sample_squashed_gaussian, squashed_gaussian_mode, LOG_STD_MAX, LOG_STD_MIN,
};
pub use temperature::{temperature_loss, Temperature};
