//! Layer abstractions for the network
//!
//! Only fully connected layers exist. Each layer owns its parameters and
//! training state; the per-sample intermediate values live in a separate
//! [`LayerScratch`] so that one layer can be trained against many pooled
//! scratch buffers.

pub mod dense;
pub mod scratch;

pub use dense::DenseLayer;
pub use scratch::LayerScratch;
