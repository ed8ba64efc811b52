//! Polyak averaging between online and target networks.
//!
//! Bootstrapping a temporal-difference target from the network being trained
//! creates a moving-target problem. A slowly tracking copy of the critic
//! decouples the two:
//!
//! ```text
//! θ_target = τ * θ_online + (1 - τ) * θ_target
//! ```
//!
//! `τ = 1` replaces the target with the online weights, `τ = 0` leaves it
//! untouched. Typical values are small (0.005 - 0.01).

use burn::module::{Module, ModuleMapper, ParamId};
use burn::prelude::*;

/// A parameter flattened to 1D with its original shape dropped.
///
/// Parameters of different rank cannot share a `Vec` directly; storing them
/// flat sidesteps the const-generic dimension and lets the update mapper
/// reshape back from the target's own dims.
struct FlatParam<B: Backend> {
    tensor: Tensor<B, 1>,
}

/// Collects every float parameter of a module in traversal order.
///
/// Traversal order is deterministic for modules of the same architecture,
/// so positions line up between an online network and its target copy.
struct ParamExtractor<B: Backend> {
    params: Vec<FlatParam<B>>,
}

impl<B: Backend> ModuleMapper<B> for ParamExtractor<B> {
    fn map_float<const D: usize>(&mut self, _id: ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        let total_size: usize = tensor.dims().iter().product();
        self.params.push(FlatParam {
            tensor: tensor.clone().reshape([total_size]),
        });
        tensor
    }
}

/// Interpolates target parameters towards previously extracted online ones.
///
/// Parameters are matched by traversal order, not by `ParamId`, so the
/// online and target modules may have been created independently as long as
/// their architectures agree.
struct SoftUpdateMapper<B: Backend> {
    online_params: Vec<FlatParam<B>>,
    tau: f32,
    index: usize,
}

impl<B: Backend> ModuleMapper<B> for SoftUpdateMapper<B> {
    fn map_float<const D: usize>(&mut self, _id: ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        let shape = tensor.dims();
        let total_size: usize = shape.iter().product();

        let idx = self.index;
        self.index += 1;

        match self.online_params.get(idx) {
            Some(online) => {
                let interpolated = online.tensor.clone().mul_scalar(self.tau)
                    + tensor.reshape([total_size]).mul_scalar(1.0 - self.tau);
                interpolated.reshape(shape)
            }
            None => {
                // Architecture mismatch between online and target. Keep the
                // target parameter rather than panic mid-traversal.
                log::warn!("soft_update: no online parameter at index {}", idx);
                tensor
            }
        }
    }
}

/// Move `target` towards `online` by Polyak averaging every float parameter.
///
/// Returns the updated target module. `tau >= 1` is an exact copy of the
/// online weights and `tau <= 0` returns the target unchanged; both
/// endpoints skip the parameter traversal entirely.
pub fn soft_update<B, M>(online: &M, target: M, tau: f32) -> M
where
    B: Backend,
    M: Module<B>,
{
    if tau >= 1.0 {
        return online.clone();
    }
    if tau <= 0.0 {
        return target;
    }

    let mut extractor = ParamExtractor { params: Vec::new() };
    let _ = online.clone().map(&mut extractor);

    let mut updater = SoftUpdateMapper {
        online_params: extractor.params,
        tau,
        index: 0,
    };
    target.map(&mut updater)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::PrngKey;
    use crate::sac::nets::init_linear;
    use burn::backend::{Autodiff, NdArray};
    use burn::nn::Linear;

    type B = Autodiff<NdArray<f32>>;

    fn weights(linear: &Linear<B>) -> Vec<f32> {
        linear
            .weight
            .val()
            .into_data()
            .as_slice::<f32>()
            .unwrap()
            .to_vec()
    }

    fn make_pair() -> (Linear<B>, Linear<B>) {
        let device = Default::default();
        let (a, b) = PrngKey::new(11).split();
        (init_linear(a, 3, 2, &device), init_linear(b, 3, 2, &device))
    }

    #[test]
    fn test_tau_one_copies_online() {
        let (online, target) = make_pair();
        let updated = soft_update(&online, target, 1.0);
        assert_eq!(weights(&online), weights(&updated));
    }

    #[test]
    fn test_tau_zero_keeps_target() {
        let (online, target) = make_pair();
        let before = weights(&target);
        let updated = soft_update(&online, target, 0.0);
        assert_eq!(before, weights(&updated));
    }

    #[test]
    fn test_interpolation() {
        let (online, target) = make_pair();
        let tau = 0.25;
        let expected: Vec<f32> = weights(&online)
            .iter()
            .zip(weights(&target).iter())
            .map(|(o, t)| tau * o + (1.0 - tau) * t)
            .collect();

        let updated = soft_update(&online, target, tau);
        for (e, u) in expected.iter().zip(weights(&updated).iter()) {
            assert!((e - u).abs() < 1e-6, "expected {}, got {}", e, u);
        }
    }

    #[test]
    fn test_interpolation_over_multi_param_module() {
        use crate::sac::config::Activation;
        use crate::sac::nets::Mlp;

        // Weights, biases, and layer-norm parameters must all pair up by
        // traversal position between the two modules.
        let device = Default::default();
        let (k1, k2) = PrngKey::new(23).split();
        let build = |k| {
            Mlp::<B>::new(k, 3, &[8, 4], Activation::Relu, None, true, &device)
        };
        let online = build(k1);
        let mut target = build(k2);

        let input: Tensor<B, 2> = Tensor::from_floats([[0.2, -0.4, 0.6]], &device);
        let online_out = online.forward(input.clone(), false);

        // Fractional tau walks every parameter through the mapper pair;
        // repeated steps drive the target onto the online weights.
        for _ in 0..60 {
            target = soft_update(&online, target, 0.5);
        }
        let updated_out = target.forward(input, false);

        let a = online_out.into_data();
        let b = updated_out.into_data();
        for (x, y) in a
            .as_slice::<f32>()
            .unwrap()
            .iter()
            .zip(b.as_slice::<f32>().unwrap())
        {
            assert!((x - y).abs() < 1e-6, "{} vs {}", x, y);
        }
    }

    #[test]
    fn test_repeated_updates_converge() {
        let (online, mut target) = make_pair();
        for _ in 0..2000 {
            target = soft_update(&online, target, 0.05);
        }
        for (o, t) in weights(&online).iter().zip(weights(&target).iter()) {
            assert!(
                (o - t).abs() < 1e-4,
                "target did not converge: {} vs {}",
                o,
                t
            );
        }
    }
}
