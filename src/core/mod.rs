//! Shared building blocks: explicit random keys, environment and batch
//! descriptors, and target-network synchronization.

pub mod env_spec;
pub mod rng;
pub mod target_network;
pub mod transition;

pub use env_spec::EnvironmentSpec;
pub use rng::PrngKey;
pub use target_network::soft_update;
pub use transition::TransitionBatch;
