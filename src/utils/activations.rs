//! Activation functions for the network
//!
//! Every layer uses the same leaky rectifier, both in the forward pass and in
//! its derivative form during backpropagation.

/// Slope applied to non-positive inputs.
pub const LEAKY_SLOPE: f64 = 0.01;

/// Leaky ReLU activation.
///
/// Returns `x` when `x > 0`, otherwise `0.01 * x`. Zero maps to zero.
pub fn leaky_relu(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        LEAKY_SLOPE * x
    }
}

/// Derivative of [`leaky_relu`] with respect to its weighted input.
///
/// Returns `1.0` when `weighted_sum > 0`, otherwise `0.01`.
pub fn leaky_relu_derivative(weighted_sum: f64) -> f64 {
    if weighted_sum > 0.0 {
        1.0
    } else {
        LEAKY_SLOPE
    }
}
