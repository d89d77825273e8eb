//! Multilayer perceptron: inference, classification and mini-batch training.
//!
//! A [`Network`] owns an ordered stack of [`DenseLayer`]s. Training walks a
//! sequence of [`Batch`]es once: every sample is propagated forward while its
//! intermediate values are recorded into pooled scratch buffers, its gradient
//! is backpropagated and summed into the layers' accumulators, and after the
//! last sample of each batch one [`MomentumSgd`] step is applied to every
//! layer.

use log::{debug, info};
use rand::Rng;

use crate::data::{Batch, Image};
use crate::error::{NetworkError, Result};
use crate::layers::{DenseLayer, LayerScratch};
use crate::optimizers::MomentumSgd;
use crate::utils::{max_value_index, one_hot, squared_cost, NUM_CLASSES};

/// Samples whose squared cost falls below this value count as correct in the
/// running training score.
pub const DEFAULT_COST_THRESHOLD: f64 = 0.15;

/// Scratch buffers for one forward/backward pass through a whole network.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkScratch {
    layers: Vec<LayerScratch>,
}

impl NetworkScratch {
    /// One [`LayerScratch`] per layer, sized to match.
    pub fn new(layers: &[DenseLayer]) -> Self {
        Self {
            layers: layers
                .iter()
                .map(|layer| LayerScratch::new(layer.input_size(), layer.output_size()))
                .collect(),
        }
    }

    /// Per-layer buffers in forward order.
    pub fn layers(&self) -> &[LayerScratch] {
        &self.layers
    }

    /// Mutable per-layer buffers in forward order.
    pub fn layers_mut(&mut self) -> &mut [LayerScratch] {
        &mut self.layers
    }

    /// Activations of the final layer from the last recorded forward pass.
    pub fn output(&self) -> &[f64] {
        self.layers
            .last()
            .map(|scratch| scratch.activations())
            .unwrap_or(&[])
    }

    /// Clears every layer's buffers.
    pub fn reset(&mut self) {
        for scratch in &mut self.layers {
            scratch.reset();
        }
    }
}

/// Running count of training samples the network already fit well.
///
/// A sample is correct when the squared cost of the network's output against
/// its one-hot label is below the network's cost threshold at the moment it
/// is trained on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainingScore {
    pub correct: usize,
    pub total: usize,
}

impl TrainingScore {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// `correct / total`, or 0.0 before any sample was seen.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Fully connected leaky-ReLU network trained with momentum SGD.
///
/// # Example
///
/// ```
/// use digit_net::network::Network;
/// use digit_net::optimizers::MomentumSgd;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(1);
/// let network = Network::new(&[784, 32, 10], MomentumSgd::default(), &mut rng).unwrap();
/// assert_eq!(network.layer_sizes(), vec![784, 32, 10]);
/// ```
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<DenseLayer>,
    optimizer: MomentumSgd,
    cost_threshold: f64,
    score: TrainingScore,
    scratch_pool: Vec<NetworkScratch>,
}

impl Network {
    /// Builds a network from layer widths `[n0, n1, ..., nk]`.
    ///
    /// Produces `k` layers, layer `i` mapping `n_i → n_{i+1}`, initialized
    /// from `rng`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidTopology`] for fewer than two widths or any
    /// zero width.
    pub fn new<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        optimizer: MomentumSgd,
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(NetworkError::InvalidTopology(format!(
                "need at least 2 layer widths, got {}",
                layer_sizes.len()
            )));
        }
        if let Some(position) = layer_sizes.iter().position(|&width| width == 0) {
            return Err(NetworkError::InvalidTopology(format!(
                "layer width {position} is zero"
            )));
        }

        let layers = layer_sizes
            .windows(2)
            .map(|pair| DenseLayer::new(pair[0], pair[1], rng))
            .collect();

        info!("built network with layer sizes {:?}", layer_sizes);
        Ok(Self::assemble(layers, optimizer))
    }

    /// Builds a network from existing layers.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidTopology`] if `layers` is empty or a layer's
    /// output width differs from the next layer's input width.
    pub fn from_layers(layers: Vec<DenseLayer>, optimizer: MomentumSgd) -> Result<Self> {
        if layers.is_empty() {
            return Err(NetworkError::InvalidTopology(
                "network needs at least one layer".to_string(),
            ));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(NetworkError::InvalidTopology(format!(
                    "layer {} outputs {} values but layer {} expects {}",
                    i,
                    pair[0].output_size(),
                    i + 1,
                    pair[1].input_size()
                )));
            }
        }

        Ok(Self::assemble(layers, optimizer))
    }

    fn assemble(layers: Vec<DenseLayer>, optimizer: MomentumSgd) -> Self {
        Self {
            layers,
            optimizer,
            cost_threshold: DEFAULT_COST_THRESHOLD,
            score: TrainingScore::default(),
            scratch_pool: Vec::new(),
        }
    }

    /// Sets the cost below which a trained sample counts as correct.
    pub fn with_cost_threshold(mut self, cost_threshold: f64) -> Self {
        self.cost_threshold = cost_threshold;
        self
    }

    /// Layers in forward order.
    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Replaces the weights and biases of layer `index` in place.
    ///
    /// The layer keeps its widths, so the topology cannot change. Velocities
    /// and gradient accumulators are left untouched.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidTopology`] if there is no layer `index`, and
    /// [`NetworkError::DimensionMismatch`] if either vector's length differs
    /// from the layer's current shape. Nothing is modified on error.
    pub fn set_parameters(
        &mut self,
        index: usize,
        weights: Vec<f64>,
        biases: Vec<f64>,
    ) -> Result<()> {
        let layer_count = self.layers.len();
        let layer = self.layers.get_mut(index).ok_or_else(|| {
            NetworkError::InvalidTopology(format!(
                "no layer {index} in a network of {layer_count} layers"
            ))
        })?;
        if weights.len() != layer.weights.len() {
            return Err(NetworkError::DimensionMismatch {
                context: "layer weights",
                expected: layer.weights.len(),
                actual: weights.len(),
            });
        }
        if biases.len() != layer.biases.len() {
            return Err(NetworkError::DimensionMismatch {
                context: "layer biases",
                expected: layer.biases.len(),
                actual: biases.len(),
            });
        }

        layer.weights = weights;
        layer.biases = biases;
        Ok(())
    }

    /// Widths `[n0, ..., nk]` the network was built from.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.layers.len() + 1);
        sizes.push(self.input_size());
        sizes.extend(self.layers.iter().map(DenseLayer::output_size));
        sizes
    }

    /// Width of the input layer.
    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    /// Number of output classes.
    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].output_size()
    }

    /// Update rule applied after each batch.
    pub fn optimizer(&self) -> &MomentumSgd {
        &self.optimizer
    }

    /// Cost below which a trained sample counts as correct.
    pub fn cost_threshold(&self) -> f64 {
        self.cost_threshold
    }

    /// Running score accumulated over every `train` call so far.
    pub fn score(&self) -> TrainingScore {
        self.score
    }

    /// Zeroes the running score.
    pub fn reset_score(&mut self) {
        self.score = TrainingScore::default();
    }

    /// Number of pooled per-batch scratch sets allocated so far.
    pub fn scratch_pool_len(&self) -> usize {
        self.scratch_pool.len()
    }

    /// Forward propagation through every layer without recording.
    ///
    /// # Panics
    ///
    /// Panics if `inputs.len()` differs from the network's input width.
    pub fn forward(&self, inputs: &[f64]) -> Vec<f64> {
        let mut current = inputs.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current);
        }
        current
    }

    /// Index of the largest output for `image`; ties go to the lowest index.
    ///
    /// # Panics
    ///
    /// Panics if the image's pixel count differs from the input width.
    pub fn classify(&self, image: &Image) -> usize {
        max_value_index(&self.forward(image.pixels()))
    }

    /// Fraction of `images` whose classification matches their label.
    pub fn evaluate(&self, images: &[Image]) -> f64 {
        if images.is_empty() {
            return 0.0;
        }
        let correct = images
            .iter()
            .filter(|image| self.classify(image) == image.label())
            .count();
        correct as f64 / images.len() as f64
    }

    /// Runs one pass over `batches`, applying one optimizer step per batch.
    ///
    /// Every batch is visited exactly once, in order. Within a batch the
    /// gradients of all samples are summed before the update; accumulators
    /// are zeroed after it. Scratch buffers are pooled per batch index and
    /// reused by later calls. An empty batch sequence leaves the network
    /// unchanged.
    ///
    /// # Errors
    ///
    /// [`NetworkError::DimensionMismatch`] if the final layer is not
    /// `NUM_CLASSES` wide or any sample's pixel count differs from the input
    /// width. Nothing is modified in that case.
    pub fn train(&mut self, batches: &[Batch<'_>]) -> Result<()> {
        self.check_trainable(batches)?;

        if self.scratch_pool.len() < batches.len() {
            let layers = &self.layers;
            self.scratch_pool
                .resize_with(batches.len(), || NetworkScratch::new(layers));
        }

        let mut pool = std::mem::take(&mut self.scratch_pool);
        for (batch_index, (batch, scratch)) in
            batches.iter().zip(pool.iter_mut()).enumerate()
        {
            scratch.reset();
            for image in batch.iter() {
                self.update_gradients(image, scratch);
            }
            self.apply_gradients();
            debug!(
                "batch {}/{} applied ({} samples, running score {}/{})",
                batch_index + 1,
                batches.len(),
                batch.len(),
                self.score.correct,
                self.score.total
            );
        }
        self.scratch_pool = pool;

        if !batches.is_empty() {
            info!(
                "trained on {} batches; running score {}/{} ({:.2}%)",
                batches.len(),
                self.score.correct,
                self.score.total,
                self.score.accuracy() * 100.0
            );
        }
        Ok(())
    }

    fn check_trainable(&self, batches: &[Batch<'_>]) -> Result<()> {
        if self.output_size() != NUM_CLASSES {
            return Err(NetworkError::DimensionMismatch {
                context: "output layer width",
                expected: NUM_CLASSES,
                actual: self.output_size(),
            });
        }
        let input_size = self.input_size();
        if let Some(image) = batches
            .iter()
            .flat_map(|batch| batch.iter())
            .find(|image| image.num_pixels() != input_size)
        {
            return Err(NetworkError::DimensionMismatch {
                context: "sample pixel count",
                expected: input_size,
                actual: image.num_pixels(),
            });
        }
        Ok(())
    }

    /// Forward propagation that records every layer's intermediate values.
    ///
    /// Returns the output activations held in `scratch`.
    pub fn forward_recording<'s>(
        &self,
        inputs: &[f64],
        scratch: &'s mut NetworkScratch,
    ) -> &'s [f64] {
        for (index, layer) in self.layers.iter().enumerate() {
            let (before, rest) = scratch.layers.split_at_mut(index);
            let layer_inputs = match before.last() {
                Some(previous) => previous.activations(),
                None => inputs,
            };
            layer.forward_recording(layer_inputs, &mut rest[0]);
        }
        scratch.output()
    }

    /// Forward pass and backpropagation for one sample, summing its gradients
    /// into every layer's accumulators.
    fn update_gradients(&mut self, image: &Image, scratch: &mut NetworkScratch) {
        self.forward_recording(image.pixels(), scratch);

        let expected = one_hot(image.label());
        let output_index = self.layers.len() - 1;

        let cost = squared_cost(scratch.layers[output_index].activations(), &expected);
        self.score.record(cost < self.cost_threshold);

        let output_layer = &mut self.layers[output_index];
        output_layer.output_node_values(&expected, &mut scratch.layers[output_index]);
        output_layer.accumulate_gradients(&scratch.layers[output_index]);

        for hidden_index in (0..output_index).rev() {
            let (current, downstream) = scratch.layers.split_at_mut(hidden_index + 1);
            let hidden_scratch = &mut current[hidden_index];
            let (hidden_layers, downstream_layers) = self.layers.split_at_mut(hidden_index + 1);
            let hidden_layer = &mut hidden_layers[hidden_index];

            hidden_layer.hidden_node_values(
                hidden_scratch,
                &downstream_layers[0],
                downstream[0].node_values(),
            );
            hidden_layer.accumulate_gradients(hidden_scratch);
        }
    }

    /// One optimizer step on every layer; zeroes the accumulators.
    fn apply_gradients(&mut self) {
        for layer in &mut self.layers {
            self.optimizer.apply(layer);
        }
    }
}
