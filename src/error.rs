//! Error type shared by the network engine, the dataset loader and model persistence.

use thiserror::Error;

/// Errors reported by `digit_net`.
///
/// Every variant is a precondition violation detected before any state is
/// mutated, or an I/O failure while reading or writing data.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Layer widths do not describe a valid stack of layers.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// A vector or sample does not have the width the network expects.
    #[error("dimension mismatch: {context} expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Pixel count does not match `side_length²`.
    #[error("invalid image: side length {side_length} needs {expected} pixels, got {actual}")]
    InvalidImage {
        side_length: usize,
        expected: usize,
        actual: usize,
    },

    /// Label outside `[0, NUM_CLASSES)`.
    #[error("invalid label {label}: must be below {classes}")]
    InvalidLabel { label: usize, classes: usize },

    /// Encoded dataset is malformed (bad header, truncated payload, ...).
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// Serialized model could not be decoded.
    #[error("corrupt model file: {0}")]
    CorruptModel(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetworkError>;
