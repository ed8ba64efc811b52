//! Learnable entropy temperature.
//!
//! The temperature weighs the entropy bonus in both the actor loss and the
//! bootstrap target. It is optimized in log space, so the evaluated
//! temperature stays positive for any parameter value.

use burn::module::{Module, Param};
use burn::prelude::*;

/// Scalar `log_temp` parameter; the temperature is `exp(log_temp)`.
#[derive(Module, Debug)]
pub struct Temperature<B: Backend> {
    log_temp: Param<Tensor<B, 1>>,
}

impl<B: Backend> Temperature<B> {
    /// Start at `init_temperature`; caller guarantees it is positive.
    pub fn new(init_temperature: f32, device: &B::Device) -> Self {
        let log_temp = Tensor::from_floats([init_temperature.ln()], device);
        Self {
            log_temp: Param::from_tensor(log_temp),
        }
    }

    /// Current temperature as a graph-connected tensor; gradients reach
    /// `log_temp` through the exponential.
    pub fn forward(&self) -> Tensor<B, 1> {
        self.log_temp.val().exp()
    }

    /// Current temperature as a plain scalar.
    pub fn value(&self) -> f32 {
        self.forward().into_data().as_slice::<f32>().unwrap()[0]
    }
}

/// Temperature loss `temp * (entropy - target_entropy)`.
///
/// `entropy` is the scalar `mean(-log_prob)` observed in the actor step.
/// Expanding shows this equals the conventional
/// `-temp * (mean(log_prob) + target_entropy)` form: gradient descent
/// raises the temperature while entropy exceeds the target and lowers it
/// otherwise.
pub fn temperature_loss<B: Backend>(
    temperature: Tensor<B, 1>,
    entropy: f32,
    target_entropy: f32,
) -> Tensor<B, 1> {
    temperature.mul_scalar(entropy - target_entropy)
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
    fn test_initial_value_round_trips() {
        let device = Default::default();
        let temp: Temperature<B> = Temperature::new(1.0, &device);
        assert!((temp.value() - 1.0).abs() < 1e-6);

        let temp: Temperature<B> = Temperature::new(0.2, &device);
        assert!((temp.value() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_temperature_is_positive() {
        let device = Default::default();
        // Even a tiny initial temperature maps to a finite log and back to
        // a strictly positive value.
        for init in [1e-4, 0.5, 1.0, 10.0] {
            let temp: Temperature<B> = Temperature::new(init, &device);
            assert!(temp.value() > 0.0);
        }
    }

    #[test]
    fn test_loss_sign() {
        let device = Default::default();
        let temp: Temperature<B> = Temperature::new(0.5, &device);

        // Entropy above target: positive loss, so descent shrinks temp.
        let loss = temperature_loss(temp.forward(), -1.0, -2.0);
        assert!(loss.into_data().as_slice::<f32>().unwrap()[0] > 0.0);

        // Entropy below target: negative loss, descent grows temp.
        let loss = temperature_loss(temp.forward(), -3.0, -2.0);
        assert!(loss.into_data().as_slice::<f32>().unwrap()[0] < 0.0);
    }

    #[test]
    fn test_loss_value() {
        let device = Default::default();
        let temp: Temperature<B> = Temperature::new(2.0, &device);
        let loss = temperature_loss(temp.forward(), -1.5, -2.5);
        let val = loss.into_data().as_slice::<f32>().unwrap()[0];
        assert!((val - 2.0).abs() < 1e-5);
    }
}
