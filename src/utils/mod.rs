//! Shared utilities for the network engine
//!
//! This module provides the activation function, the squared cost used as a
//! training diagnostic, and label encoding.

pub mod activations;
pub mod cost;

pub use activations::{leaky_relu, leaky_relu_derivative, LEAKY_SLOPE};
pub use cost::{max_value_index, one_hot, squared_cost, NUM_CLASSES};
