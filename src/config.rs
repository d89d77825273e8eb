//! Configuration structures for training
//!
//! This module provides the training configuration: network topology,
//! optimizer hyperparameters, batching and the scoring threshold, parsed from
//! JSON files.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;

use crate::network::DEFAULT_COST_THRESHOLD;
use crate::optimizers::MomentumSgd;
use crate::utils::NUM_CLASSES;

fn default_learn_rate() -> f64 {
    0.01
}

fn default_momentum() -> f64 {
    0.2
}

fn default_regularization() -> f64 {
    0.1
}

fn default_batch_size() -> usize {
    32
}

fn default_image_size() -> usize {
    28
}

fn default_cost_threshold() -> f64 {
    DEFAULT_COST_THRESHOLD
}

/// Configuration for a training run
///
/// Only `layer_sizes` is required. Every other field falls back to the
/// defaults below when omitted:
///
/// - **learn_rate**: 0.01
/// - **momentum**: 0.2
/// - **regularization**: 0.1 (L2 weight decay strength)
/// - **batch_size**: 32
/// - **image_size**: 28 (side length; `image_size²` must equal `layer_sizes[0]`)
/// - **cost_threshold**: 0.15 (squared cost under which a sample scores as correct)
/// - **seed**: none (seed the generator from OS entropy)
/// - **sample_limit**: none (use the whole dataset)
///
/// # Example
///
/// ```json
/// {
///   "layer_sizes": [784, 128, 64, 10],
///   "learn_rate": 0.01,
///   "momentum": 0.2,
///   "regularization": 0.1,
///   "batch_size": 32,
///   "seed": 42
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Layer widths `[n0, ..., nk]`; the last must be 10
    pub layer_sizes: Vec<usize>,

    #[serde(default = "default_learn_rate")]
    pub learn_rate: f64,

    #[serde(default = "default_momentum")]
    pub momentum: f64,

    #[serde(default = "default_regularization")]
    pub regularization: f64,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Side length of the square input images
    #[serde(default = "default_image_size")]
    pub image_size: usize,

    #[serde(default = "default_cost_threshold")]
    pub cost_threshold: f64,

    /// Seed for weight initialization and shuffling
    #[serde(default)]
    pub seed: Option<u64>,

    /// Train on at most this many samples
    #[serde(default)]
    pub sample_limit: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            layer_sizes: vec![784, 128, 64, NUM_CLASSES],
            learn_rate: default_learn_rate(),
            momentum: default_momentum(),
            regularization: default_regularization(),
            batch_size: default_batch_size(),
            image_size: default_image_size(),
            cost_threshold: default_cost_threshold(),
            seed: None,
            sample_limit: None,
        }
    }
}

impl TrainingConfig {
    /// Optimizer hyperparameters described by this configuration.
    pub fn optimizer(&self) -> MomentumSgd {
        MomentumSgd::new(self.learn_rate, self.momentum, self.regularization)
    }

    /// Generator for initialization and shuffling: seeded when `seed` is set,
    /// otherwise from OS entropy.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path`, deserializes its JSON contents into a
/// `TrainingConfig` and validates it.
///
/// # Returns
///
/// `Ok(TrainingConfig)` on success, or an error if the file cannot be read,
/// the JSON is invalid, or a value is out of range.
///
/// # Examples
///
/// ```no_run
/// use digit_net::config::load_config;
///
/// let cfg = load_config("config/digit_mlp.json").unwrap();
/// assert_eq!(cfg.layer_sizes.last(), Some(&10));
/// ```
pub fn load_config(path: &str) -> Result<TrainingConfig, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn invalid(message: impl Into<String>) -> Box<dyn Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message.into(),
    ))
}

/// Checks ranges and topology consistency of a configuration.
pub fn validate_config(config: &TrainingConfig) -> Result<(), Box<dyn Error>> {
    if config.layer_sizes.len() < 2 {
        return Err(invalid("layer_sizes must contain at least 2 widths"));
    }

    if let Some(index) = config.layer_sizes.iter().position(|&width| width == 0) {
        return Err(invalid(format!(
            "layer_sizes[{}] must be greater than 0",
            index
        )));
    }

    if config.layer_sizes.last() != Some(&NUM_CLASSES) {
        return Err(invalid(format!(
            "last layer width must be {} (one output per class)",
            NUM_CLASSES
        )));
    }

    if config.image_size == 0 {
        return Err(invalid("image_size must be greater than 0"));
    }

    let pixels = config.image_size * config.image_size;
    if config.layer_sizes[0] != pixels {
        return Err(invalid(format!(
            "first layer width ({}) must equal image_size² ({})",
            config.layer_sizes[0], pixels
        )));
    }

    if config.learn_rate.is_nan() || config.learn_rate <= 0.0 {
        return Err(invalid("learn_rate must be positive"));
    }

    if !(0.0..1.0).contains(&config.momentum) {
        return Err(invalid("momentum must be in [0, 1)"));
    }

    if config.regularization.is_nan() || config.regularization < 0.0 {
        return Err(invalid("regularization must be non-negative"));
    }

    if config.batch_size == 0 {
        return Err(invalid("batch_size must be greater than 0"));
    }

    if config.cost_threshold.is_nan() || config.cost_threshold <= 0.0 {
        return Err(invalid("cost_threshold must be positive"));
    }

    Ok(())
}
