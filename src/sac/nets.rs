//! Network building blocks with key-seeded initialization.
//!
//! Burn's stock `LinearConfig::init` draws from the backend's global RNG;
//! here every weight comes from a [`PrngKey`] instead, so two agents built
//! from the same seed have identical parameters.

use burn::module::{Ignored, Module, Param};
use burn::nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear};
use burn::prelude::*;

use crate::core::rng::PrngKey;
use crate::sac::config::Activation;

/// Build a linear layer with weights drawn uniformly from
/// `±1/sqrt(d_input)` using the key, and a zero bias.
pub fn init_linear<B: Backend>(
    key: PrngKey,
    d_input: usize,
    d_output: usize,
    device: &B::Device,
) -> Linear<B> {
    let bound = 1.0 / (d_input as f32).sqrt();
    let weights = key.uniform_symmetric(d_input * d_output, bound);
    let weight =
        Tensor::<B, 1>::from_floats(weights.as_slice(), device).reshape([d_input, d_output]);
    let bias = Tensor::zeros([d_output], device);

    Linear {
        weight: Param::from_tensor(weight),
        bias: Some(Param::from_tensor(bias)),
    }
}

/// Multi-layer perceptron trunk.
///
/// Each hidden layer applies linear → dropout → layer norm → activation;
/// dropout and layer norm are optional and dropout only fires when the
/// forward pass is called with `train = true`. Output dimensionality is the
/// last hidden width; heads go on top.
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    layers: Vec<Linear<B>>,
    norms: Option<Vec<LayerNorm<B>>>,
    dropout: Option<Dropout>,
    activation: Ignored<Activation>,
    d_output: usize,
}

impl<B: Backend> Mlp<B> {
    pub fn new(
        key: PrngKey,
        d_input: usize,
        hidden_dims: &[usize],
        activation: Activation,
        dropout_rate: Option<f32>,
        layer_norm: bool,
        device: &B::Device,
    ) -> Self {
        assert!(!hidden_dims.is_empty(), "Mlp requires at least one hidden layer");

        let mut key = key;
        let mut layers = Vec::with_capacity(hidden_dims.len());
        let mut d_in = d_input;
        for &d_out in hidden_dims {
            let (next, layer_key) = key.split();
            key = next;
            layers.push(init_linear(layer_key, d_in, d_out, device));
            d_in = d_out;
        }

        let norms: Option<Vec<LayerNorm<B>>> = layer_norm.then(|| {
            hidden_dims
                .iter()
                .map(|&d| LayerNormConfig::new(d).init(device))
                .collect()
        });
        let dropout = dropout_rate.map(|rate| DropoutConfig::new(rate as f64).init());

        Self {
            layers,
            norms,
            dropout,
            activation: Ignored(activation),
            d_output: d_in,
        }
    }

    pub fn d_output(&self) -> usize {
        self.d_output
    }

    pub fn forward(&self, input: Tensor<B, 2>, train: bool) -> Tensor<B, 2> {
        let mut x = input;
        for (i, layer) in self.layers.iter().enumerate() {
            x = layer.forward(x);
            if train {
                if let Some(dropout) = &self.dropout {
                    x = dropout.forward(x);
                }
            }
            if let Some(norms) = &self.norms {
                x = norms[i].forward(x);
            }
            x = self.activation.apply(x);
        }
        x
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    fn tensor_values<const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
        t.into_data().as_slice::<f32>().unwrap().to_vec()
    }

    #[test]
    fn test_init_linear_deterministic() {
        let device = Default::default();
        let key = PrngKey::new(5);
        let a: Linear<B> = init_linear(key, 4, 3, &device);
        let b: Linear<B> = init_linear(key, 4, 3, &device);
        assert_eq!(tensor_values(a.weight.val()), tensor_values(b.weight.val()));
    }

    #[test]
    fn test_init_linear_bounds_and_zero_bias() {
        let device = Default::default();
        let linear: Linear<B> = init_linear(PrngKey::new(8), 16, 8, &device);
        let bound = 1.0 / (16.0_f32).sqrt();
        for w in tensor_values(linear.weight.val()) {
            assert!(w.abs() <= bound, "weight {} outside ±{}", w, bound);
        }
        for b in tensor_values(linear.bias.as_ref().unwrap().val()) {
            assert_eq!(b, 0.0);
        }
    }

    #[test]
    fn test_different_keys_different_weights() {
        let device = Default::default();
        let (k1, k2) = PrngKey::new(5).split();
        let a: Linear<B> = init_linear(k1, 4, 3, &device);
        let b: Linear<B> = init_linear(k2, 4, 3, &device);
        assert_ne!(tensor_values(a.weight.val()), tensor_values(b.weight.val()));
    }

    #[test]
    fn test_mlp_output_shape() {
        let device = Default::default();
        let mlp: Mlp<B> = Mlp::new(
            PrngKey::new(1),
            6,
            &[32, 16],
            Activation::Relu,
            None,
            false,
            &device,
        );
        assert_eq!(mlp.d_output(), 16);

        let input = Tensor::zeros([4, 6], &device);
        let out = mlp.forward(input, false);
        assert_eq!(out.dims(), [4, 16]);
    }

    #[test]
    fn test_mlp_eval_forward_ignores_dropout() {
        let device = Default::default();
        let mlp: Mlp<B> = Mlp::new(
            PrngKey::new(2),
            4,
            &[8],
            Activation::Tanh,
            Some(0.5),
            true,
            &device,
        );
        let input: Tensor<B, 2> = Tensor::from_floats([[0.5, -0.5, 1.0, -1.0]], &device);
        let a = tensor_values(mlp.forward(input.clone(), false));
        let b = tensor_values(mlp.forward(input, false));
        assert_eq!(a, b);
    }

    #[test]
    fn test_mlp_deterministic_across_builds() {
        let device = Default::default();
        let build = || {
            Mlp::<B>::new(
                PrngKey::new(77),
                3,
                &[8, 8],
                Activation::Gelu,
                None,
                false,
                &device,
            )
        };
        let input: Tensor<B, 2> = Tensor::from_floats([[0.1, 0.2, 0.3]], &device);
        let a = tensor_values(build().forward(input.clone(), false));
        let b = tensor_values(build().forward(input, false));
        assert_eq!(a, b);
    }
}
