//! # Ensemble SAC: Soft Actor-Critic update core
//!
//! The update algorithm of a Soft Actor-Critic agent with automatic entropy
//! temperature tuning, an ensemble of critics, and random subsampling of
//! target heads for the bootstrap minimum.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        SacAgent                            │
//! ├────────────────────────────────────────────────────────────┤
//! │  update(batch):                                            │
//! │                                                            │
//! │  ┌──────────────┐   ┌──────────────┐   ┌───────────────┐  │
//! │  │update_critic │──▶│ update_actor │──▶│update_temper- │  │
//! │  │  min over    │   │  mean over   │   │ature          │  │
//! │  │  subsampled  │   │  all heads   │   │  entropy vs   │  │
//! │  │  target heads│   │              │   │  target       │  │
//! │  └──────┬───────┘   └──────────────┘   └───────────────┘  │
//! │         │ soft_update(tau)                                │
//! │         ▼                                                 │
//! │  target critic (Polyak copy)                              │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every update consumes the agent and returns its successor, and every
//! random draw (sampling noise, head subsampling, weight initialization)
//! flows through an explicit splittable [`PrngKey`](crate::core::rng::PrngKey),
//! so an (agent, batch, key) triple fully determines the result.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ensemble_sac::{EnvironmentSpec, SacAgent, SacConfig, TransitionBatch};
//!
//! let config = SacConfig::ensemble(10, 2).with_critic_layer_norm(true);
//! let agent: SacAgent<B> = SacAgent::new(spec, &config, seed, &device)?;
//!
//! let (agent, actions) = agent.sample_actions(&observations);
//! let (agent, metrics) = agent.update(&batch);
//! log::info!("{}", metrics.format());
//! ```

pub mod core;
pub mod sac;

// Re-export commonly used types
pub use self::core::env_spec::EnvironmentSpec;
pub use self::core::rng::PrngKey;
pub use self::core::target_network::soft_update;
pub use self::core::transition::TransitionBatch;

pub use sac::agent::{
    actor_loss, backup_target, critic_loss, ActorMetrics, CriticMetrics, SacAgent, SacMetrics,
    TemperatureMetrics,
};
pub use sac::config::{Activation, ConfigError, SacConfig};
pub use sac::critic::{subsample_indices, CriticEnsemble, QNetwork};
pub use sac::temperature::Temperature;
