//! Dense (fully connected) layer with a leaky-ReLU activation
//!
//! This module provides a DenseLayer that performs the transformation
//! `activation = leaky_relu(W·x + b)` and the per-sample gradient bookkeeping
//! used by backpropagation.

use log::debug;
use rand::Rng;
use rand_distr::StandardNormal;

use super::scratch::LayerScratch;
use crate::error::{NetworkError, Result};
use crate::utils::{leaky_relu, leaky_relu_derivative};

/// Dense layer with weights, biases, gradient accumulators and momentum
/// velocities.
///
/// The weight connecting input neuron `i` to output neuron `o` lives at flat
/// index `o * input_size + i` (row-major by output neuron). Gradient
/// accumulators and velocities share the shape of the parameter they track.
///
/// # Example
///
/// ```
/// use digit_net::layers::DenseLayer;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let layer = DenseLayer::new(784, 128, &mut rng);
/// assert_eq!(layer.input_size(), 784);
/// assert_eq!(layer.output_size(), 128);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    input_size: usize,
    output_size: usize,
    pub(crate) weights: Vec<f64>,
    pub(crate) biases: Vec<f64>,
    pub(crate) weight_gradients: Vec<f64>,
    pub(crate) bias_gradients: Vec<f64>,
    pub(crate) weight_velocities: Vec<f64>,
    pub(crate) bias_velocities: Vec<f64>,
}

impl DenseLayer {
    /// Create a new DenseLayer with He initialization.
    ///
    /// Each weight is a standard-normal sample scaled by
    /// `sqrt(2 / input_size)`. Biases, gradient accumulators and velocities
    /// start at zero.
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        let scale = (2.0 / input_size as f64).sqrt();
        let weights: Vec<f64> = (0..input_size * output_size)
            .map(|_| rng.sample::<f64, _>(StandardNormal) * scale)
            .collect();

        debug!(
            "initialized dense layer {} -> {} (scale {:.5})",
            input_size, output_size, scale
        );

        Self::with_zeroed_state(input_size, output_size, weights, vec![0.0; output_size])
    }

    /// Create a layer from explicit parameters.
    ///
    /// `weights` must hold `input_size * output_size` values laid out
    /// row-major by output neuron and `biases` must hold `output_size`
    /// values. Accumulators and velocities start at zero.
    pub fn from_parameters(
        input_size: usize,
        output_size: usize,
        weights: Vec<f64>,
        biases: Vec<f64>,
    ) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(NetworkError::InvalidTopology(format!(
                "layer widths must be positive, got {input_size} -> {output_size}"
            )));
        }
        if weights.len() != input_size * output_size {
            return Err(NetworkError::DimensionMismatch {
                context: "layer weights",
                expected: input_size * output_size,
                actual: weights.len(),
            });
        }
        if biases.len() != output_size {
            return Err(NetworkError::DimensionMismatch {
                context: "layer biases",
                expected: output_size,
                actual: biases.len(),
            });
        }

        Ok(Self::with_zeroed_state(input_size, output_size, weights, biases))
    }

    fn with_zeroed_state(
        input_size: usize,
        output_size: usize,
        weights: Vec<f64>,
        biases: Vec<f64>,
    ) -> Self {
        let weight_count = weights.len();
        Self {
            input_size,
            output_size,
            weights,
            biases,
            weight_gradients: vec![0.0; weight_count],
            bias_gradients: vec![0.0; output_size],
            weight_velocities: vec![0.0; weight_count],
            bias_velocities: vec![0.0; output_size],
        }
    }

    /// Get the input size of the layer.
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Get the output size of the layer.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Returns input_size × output_size (weights) + output_size (biases).
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Weights in `output * input_size + input` order.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// One bias per output neuron.
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// Weight gradients summed since the last update.
    pub fn weight_gradients(&self) -> &[f64] {
        &self.weight_gradients
    }

    /// Bias gradients summed since the last update.
    pub fn bias_gradients(&self) -> &[f64] {
        &self.bias_gradients
    }

    /// Momentum velocity per weight.
    pub fn weight_velocities(&self) -> &[f64] {
        &self.weight_velocities
    }

    /// Momentum velocity per bias.
    pub fn bias_velocities(&self) -> &[f64] {
        &self.bias_velocities
    }

    /// Flat index of the weight from input `input` to output `output`.
    pub fn flat_weight_index(&self, input: usize, output: usize) -> usize {
        output * self.input_size + input
    }

    /// Weight from input neuron `input` to output neuron `output`.
    pub fn weight(&self, input: usize, output: usize) -> f64 {
        self.weights[self.flat_weight_index(input, output)]
    }

    fn weighted_sum(&self, inputs: &[f64], output: usize) -> f64 {
        let row = &self.weights[output * self.input_size..(output + 1) * self.input_size];
        let mut sum = self.biases[output];
        for (x, w) in inputs.iter().zip(row) {
            sum += x * w;
        }
        sum
    }

    fn check_inputs(&self, inputs: &[f64]) {
        assert_eq!(
            inputs.len(),
            self.input_size,
            "layer expects {} inputs, got {}",
            self.input_size,
            inputs.len()
        );
    }

    /// Forward propagation for inference.
    ///
    /// Returns `leaky_relu(bias[o] + Σ_i inputs[i] * weight(i, o))` for every
    /// output neuron. Nothing is recorded.
    ///
    /// # Panics
    ///
    /// Panics if `inputs.len() != input_size`.
    pub fn forward(&self, inputs: &[f64]) -> Vec<f64> {
        self.check_inputs(inputs);
        (0..self.output_size)
            .map(|o| leaky_relu(self.weighted_sum(inputs, o)))
            .collect()
    }

    /// Forward propagation for training.
    ///
    /// Same computation as [`forward`](Self::forward), but the inputs,
    /// weighted sums and activations are written into `scratch` for the
    /// backward pass. Returns the recorded activations.
    ///
    /// # Panics
    ///
    /// Panics if `inputs.len() != input_size` or `scratch` was sized for a
    /// different layer.
    pub fn forward_recording<'s>(
        &self,
        inputs: &[f64],
        scratch: &'s mut LayerScratch,
    ) -> &'s [f64] {
        self.check_inputs(inputs);
        assert_eq!(
            scratch.weighted_sums.len(),
            self.output_size,
            "scratch buffers do not match layer width"
        );

        scratch.inputs.copy_from_slice(inputs);
        for o in 0..self.output_size {
            let z = self.weighted_sum(inputs, o);
            scratch.weighted_sums[o] = z;
            scratch.activations[o] = leaky_relu(z);
        }
        &scratch.activations
    }

    /// Node values for the output layer.
    ///
    /// `node[o] = (activation[o] - expected[o]) * leaky_relu'(weighted_sum[o])`,
    /// the derivative of the squared cost through the activation.
    ///
    /// # Panics
    ///
    /// Panics if `expected.len() != output_size`.
    pub fn output_node_values(&self, expected: &[f64], scratch: &mut LayerScratch) {
        assert_eq!(
            expected.len(),
            self.output_size,
            "expected outputs must match layer width"
        );

        for (o, &target) in expected.iter().enumerate() {
            let cost_derivative = scratch.activations[o] - target;
            scratch.node_values[o] = cost_derivative * leaky_relu_derivative(scratch.weighted_sums[o]);
        }
    }

    /// Node values for a hidden layer.
    ///
    /// Backpropagates `downstream_node_values` through the weights of
    /// `downstream`, the layer fed by this one:
    /// `node[o] = leaky_relu'(weighted_sum[o]) * Σ_d downstream.weight(o, d) * downstream_node_values[d]`.
    ///
    /// # Panics
    ///
    /// Panics if `downstream` does not take this layer's outputs as inputs.
    pub fn hidden_node_values(
        &self,
        scratch: &mut LayerScratch,
        downstream: &DenseLayer,
        downstream_node_values: &[f64],
    ) {
        assert_eq!(
            downstream.input_size, self.output_size,
            "downstream layer must consume this layer's outputs"
        );

        for o in 0..self.output_size {
            let mut node_value = 0.0;
            for (d, &downstream_value) in downstream_node_values.iter().enumerate() {
                node_value += downstream.weight(o, d) * downstream_value;
            }
            node_value *= leaky_relu_derivative(scratch.weighted_sums[o]);
            scratch.node_values[o] = node_value;
        }
    }

    /// Adds this sample's gradient contribution to the accumulators.
    ///
    /// `weight_gradients[o, i] += inputs[i] * node[o]`,
    /// `bias_gradients[o] += node[o]`.
    pub fn accumulate_gradients(&mut self, scratch: &LayerScratch) {
        let input_size = self.input_size;
        for (o, &node_value) in scratch.node_values.iter().enumerate() {
            let row = &mut self.weight_gradients[o * input_size..(o + 1) * input_size];
            for (gradient, &input) in row.iter_mut().zip(&scratch.inputs) {
                *gradient += input * node_value;
            }
            self.bias_gradients[o] += node_value;
        }
    }

    /// Zeroes both gradient accumulators.
    pub fn clear_gradients(&mut self) {
        self.weight_gradients.fill(0.0);
        self.bias_gradients.fill(0.0);
    }
}
