//! Tanh-squashed diagonal Gaussian policy distribution.
//!
//! Actions are sampled with the reparameterization trick,
//! `a = tanh(mean + std * noise)`, so gradients flow through mean and std.
//! The log-probability carries the tanh change-of-variables correction
//! `sum log(1 - a²)`. Noise is an explicit argument rather than an internal
//! draw: the caller derives it from a key, which keeps every sample
//! reproducible.

use burn::prelude::*;
use burn::tensor::activation::tanh;

/// Lower bound on the clamped log standard deviation.
pub const LOG_STD_MIN: f32 = -5.0;
/// Upper bound on the clamped log standard deviation.
pub const LOG_STD_MAX: f32 = 2.0;

/// Floor for logarithms near zero.
const EPSILON: f32 = 1e-6;

const HALF_LOG_2PI: f32 = 0.918_938_5;

/// Softly clamp raw log-std outputs into `[LOG_STD_MIN, LOG_STD_MAX]`.
///
/// Uses a tanh rescaling instead of a hard clamp so gradients never die at
/// the bounds.
pub fn clamp_log_std<B: Backend>(raw_log_std: Tensor<B, 2>) -> Tensor<B, 2> {
    let tanh_out = raw_log_std.tanh();
    let half_range = (LOG_STD_MAX - LOG_STD_MIN) / 2.0;
    let offset = LOG_STD_MIN + half_range;
    tanh_out.mul_scalar(half_range).add_scalar(offset)
}

/// Sample a squashed-Gaussian action and its log-probability.
///
/// `noise` must be unit-normal with the same shape as `mean`. Returns
/// `(action, log_prob)` with actions in `(-1, 1)` and log-probs of shape
/// `[batch]`.
pub fn sample_squashed_gaussian<B: Backend>(
    mean: Tensor<B, 2>,
    log_std: Tensor<B, 2>,
    noise: Tensor<B, 2>,
) -> (Tensor<B, 2>, Tensor<B, 1>) {
    let std = log_std.clone().exp();
    let pre_squash = mean + std * noise.clone();

    // Diagonal Gaussian log-density at mean + std * noise, in terms of the
    // noise itself: -0.5 * noise² - log_std - 0.5 * log(2π), summed over
    // action dimensions.
    let per_dim =
        noise.clone().powf_scalar(2.0).mul_scalar(-0.5) - log_std - HALF_LOG_2PI;
    let gaussian_log_prob: Tensor<B, 1> = per_dim.sum_dim(1).flatten(0, 1);

    let squashed = tanh(pre_squash.clone());
    let log_probs = gaussian_log_prob - squash_correction(pre_squash);

    (squashed, log_probs)
}

/// Deterministic action: the distribution mode, `tanh(mean)`.
pub fn squashed_gaussian_mode<B: Backend>(mean: Tensor<B, 2>) -> Tensor<B, 2> {
    tanh(mean)
}

/// Change-of-variables term `sum log(1 - tanh²(u))`, clamped away from
/// log(0) for actions saturating the bounds.
fn squash_correction<B: Backend>(pre_squash: Tensor<B, 2>) -> Tensor<B, 1> {
    let squashed = tanh(pre_squash);
    let one_minus_sq = (-squashed.clone() * squashed + 1.0).clamp(EPSILON, 1.0);
    let log_det_per_dim: Tensor<B, 2> = one_minus_sq.log();
    log_det_per_dim.sum_dim(1).flatten(0, 1)
}

// ============================================================================
// Tests
// ============================================================================
