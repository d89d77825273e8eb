//! Digit classification network
//!
//! A hand-rolled multilayer perceptron that classifies square grayscale
//! images into ten classes, trained by mini-batch gradient descent with
//! momentum and L2 weight decay.
//!
//! # Modules
//!
//! - `data`: Image records, batch construction and dataset decoding
//! - `layers`: Dense layer and its per-sample scratch buffers
//! - `network`: Network inference, classification and the training pass
//! - `optimizers`: Momentum SGD update rule
//! - `utils`: Activation, cost and label encoding helpers
//! - `config`: Training configuration loaded from JSON
//! - `persistence`: Binary model save/load
//! - `error`: Shared error type
//!
//! # Example
//!
//! ```
//! use digit_net::data::{build_batches, Image};
//! use digit_net::network::Network;
//! use digit_net::optimizers::MomentumSgd;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut samples: Vec<Image> = (0..20)
//!     .map(|i| Image::new(2, vec![(i % 10) as f64 / 10.0; 4], i % 10).unwrap())
//!     .collect();
//!
//! let mut network = Network::new(&[4, 8, 10], MomentumSgd::default(), &mut rng).unwrap();
//! let batches = build_batches(&mut samples, 5, &mut rng);
//! network.train(&batches).unwrap();
//!
//! let class = network.classify(&samples[0]);
//! assert!(class < 10);
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod layers;
pub mod network;
pub mod optimizers;
pub mod persistence;
pub mod utils;

pub use error::{NetworkError, Result};
pub use network::{Network, TrainingScore};
