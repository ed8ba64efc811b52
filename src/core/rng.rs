//! Explicit, splittable random keys.
//!
//! Every stochastic operation in the agent consumes a [`PrngKey`]: sampling
//! noise for the reparameterization trick, shuffling ensemble head indices,
//! and initializing network weights. Keys are split before use so that no
//! key is ever consumed twice, and no global random source is touched:
//! given the same agent state, batch, and key, every update produces the
//! same result.
//!
//! # Usage
//!
//! ```ignore
//! let key = PrngKey::new(seed);
//! let (key, noise_key) = key.split();
//! let noise = noise_key.standard_normal(batch_size * action_dim);
//! // `key` carries forward; `noise_key` is spent.
//! ```

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// A splittable random key.
///
/// `Copy` by design: a key is a value, not a handle. Consuming methods take
/// the key by value to make the "spent" reading explicit at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrngKey(u64);

impl PrngKey {
    /// Create a key from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Deterministically split this key into two independent child keys.
    ///
    /// The children depend only on the parent seed; splitting the same key
    /// twice yields the same pair. Neither child equals the parent, so a
    /// split-then-consume discipline never reuses a stream.
    pub fn split(self) -> (PrngKey, PrngKey) {
        let mut rng = self.rng();
        (PrngKey(rng.gen()), PrngKey(rng.gen()))
    }

    /// Draw `n` samples from the standard normal distribution.
    pub fn standard_normal(self, n: usize) -> Vec<f32> {
        let mut rng = self.rng();
        (0..n).map(|_| rng.sample(StandardNormal)).collect()
    }

    /// Draw `n` samples uniformly from `[-bound, bound]`.
    pub fn uniform_symmetric(self, n: usize, bound: f32) -> Vec<f32> {
        let mut rng = self.rng();
        (0..n).map(|_| rng.gen_range(-bound..=bound)).collect()
    }

    /// Return the indices `0..n` in a uniformly random order.
    pub fn shuffled_indices(self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut self.rng());
        indices
    }

    fn rng(self) -> StdRng {
        StdRng::seed_from_u64(self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
