//! Optimizers for neural network parameter updates
//!
//! Optimizers consume the gradients accumulated in a layer over one
//! mini-batch and turn them into a parameter update. The network applies one
//! optimizer step per batch to every layer.
//!
//! # Available Optimizers
//!
//! - [`MomentumSgd`]: gradient descent with momentum, gradient clamping and
//!   L2 weight decay

pub mod momentum;

pub use momentum::{MomentumSgd, CLAMP_LIMIT};
