//! Environment dimensionality.

use serde::{Deserialize, Serialize};

/// Shape of the environment interface: flat `f32` observation and action
/// vectors. Actions are assumed to live in `[-1, 1]` per dimension, which is
/// what the squashed-Gaussian policy produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    /// Flattened observation dimensionality.
    pub observation_dim: usize,
    /// Flattened action dimensionality.
    pub action_dim: usize,
}

impl EnvironmentSpec {
    pub fn new(observation_dim: usize, action_dim: usize) -> Self {
        Self {
            observation_dim,
            action_dim,
        }
    }

    /// Entropy target used when the config leaves it unset: `-action_dim / 2`.
    pub fn default_target_entropy(&self) -> f32 {
        -(self.action_dim as f32) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target_entropy() {
        let spec = EnvironmentSpec::new(17, 6);
        assert!((spec.default_target_entropy() + 3.0).abs() < 1e-6);
    }
}
