//! Momentum SGD with L2 weight decay
//!
//! The velocities this optimizer updates are owned by each [`DenseLayer`], so
//! the optimizer itself only carries the three hyperparameters and can be
//! shared by every layer of a network.

use serde::{Deserialize, Serialize};

use crate::layers::DenseLayer;

/// Gradient bound applied to weight gradients, and value bound applied to
/// biases, before every update.
pub const CLAMP_LIMIT: f64 = 1.0;

/// Mini-batch gradient descent with momentum and L2 weight decay.
///
/// For each weight `w` with accumulated gradient `g` and velocity `v`:
///
/// ```text
/// g = clamp(g, -1, 1)
/// v = v * momentum - g * learn_rate
/// w = w * (1 - regularization * learn_rate) + v
/// ```
///
/// Biases follow a different rule. The bias value itself is clamped, and the
/// momentum term is taken from the bias rather than from its previous
/// velocity:
///
/// ```text
/// b = clamp(b, -1, 1)
/// v = b * momentum - g * learn_rate
/// b = b + v
/// ```
///
/// Biases receive no weight decay. Every gradient accumulator is zeroed once
/// its parameter is updated.
///
/// # Example
///
/// ```
/// use digit_net::optimizers::MomentumSgd;
///
/// let optimizer = MomentumSgd::default();
/// assert_eq!(optimizer.learn_rate, 0.01);
/// assert_eq!(optimizer.momentum, 0.2);
/// assert_eq!(optimizer.regularization, 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumSgd {
    pub learn_rate: f64,
    pub momentum: f64,
    pub regularization: f64,
}

impl Default for MomentumSgd {
    fn default() -> Self {
        Self {
            learn_rate: 0.01,
            momentum: 0.2,
            regularization: 0.1,
        }
    }
}

impl MomentumSgd {
    pub fn new(learn_rate: f64, momentum: f64, regularization: f64) -> Self {
        Self {
            learn_rate,
            momentum,
            regularization,
        }
    }

    /// Multiplicative shrink applied to every weight before its velocity is
    /// added.
    pub fn weight_decay(&self) -> f64 {
        1.0 - self.regularization * self.learn_rate
    }

    /// Applies the accumulated gradients of `layer` and resets them to zero.
    pub fn apply(&self, layer: &mut DenseLayer) {
        let weight_decay = self.weight_decay();

        for ((weight, gradient), velocity) in layer
            .weights
            .iter_mut()
            .zip(layer.weight_gradients.iter_mut())
            .zip(layer.weight_velocities.iter_mut())
        {
            let clamped = gradient.clamp(-CLAMP_LIMIT, CLAMP_LIMIT);
            *velocity = *velocity * self.momentum - clamped * self.learn_rate;
            *weight = *weight * weight_decay + *velocity;
            *gradient = 0.0;
        }

        for ((bias, gradient), velocity) in layer
            .biases
            .iter_mut()
            .zip(layer.bias_gradients.iter_mut())
            .zip(layer.bias_velocities.iter_mut())
        {
            *bias = bias.clamp(-CLAMP_LIMIT, CLAMP_LIMIT);
            *velocity = *bias * self.momentum - *gradient * self.learn_rate;
            *bias += *velocity;
            *gradient = 0.0;
        }
    }
}
