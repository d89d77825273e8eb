//! Per-sample scratch buffers for one layer.

/// Intermediate values of one layer for the sample currently being trained.
///
/// Buffers are allocated once, sized from the layer, and overwritten by
/// every sample. Values are only meaningful between the forward pass of a
/// sample and the end of its backward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerScratch {
    pub(crate) inputs: Vec<f64>,
    pub(crate) weighted_sums: Vec<f64>,
    pub(crate) activations: Vec<f64>,
    pub(crate) node_values: Vec<f64>,
}

impl LayerScratch {
    /// Zeroed buffers for a layer mapping `input_width → output_width`.
    pub fn new(input_width: usize, output_width: usize) -> Self {
        Self {
            inputs: vec![0.0; input_width],
            weighted_sums: vec![0.0; output_width],
            activations: vec![0.0; output_width],
            node_values: vec![0.0; output_width],
        }
    }

    /// Inputs recorded by the last forward pass.
    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    /// Pre-activation sums from the last forward pass.
    pub fn weighted_sums(&self) -> &[f64] {
        &self.weighted_sums
    }

    /// Leaky-ReLU outputs from the last forward pass.
    pub fn activations(&self) -> &[f64] {
        &self.activations
    }

    /// `∂Cost/∂weightedSum` for each neuron on the current sample.
    pub fn node_values(&self) -> &[f64] {
        &self.node_values
    }

    /// Clears every buffer without reallocating.
    pub fn reset(&mut self) {
        self.inputs.fill(0.0);
        self.weighted_sums.fill(0.0);
        self.activations.fill(0.0);
        self.node_values.fill(0.0);
    }
}
