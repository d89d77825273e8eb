//! Immutable normalized image records.

use crate::error::{NetworkError, Result};
use crate::utils::NUM_CLASSES;

/// A square grayscale sample with its class label.
///
/// Pixels are stored row-major, `pixels[y * side_length + x]`, with values
/// normalized into `[0, 1]` by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    side_length: usize,
    pixels: Vec<f64>,
    label: usize,
}

impl Image {
    /// Creates an image after checking `pixels.len() == side_length²` and
    /// `label < NUM_CLASSES`.
    pub fn new(side_length: usize, pixels: Vec<f64>, label: usize) -> Result<Self> {
        let expected = side_length * side_length;
        if pixels.len() != expected {
            return Err(NetworkError::InvalidImage {
                side_length,
                expected,
                actual: pixels.len(),
            });
        }
        if label >= NUM_CLASSES {
            return Err(NetworkError::InvalidLabel {
                label,
                classes: NUM_CLASSES,
            });
        }

        Ok(Self {
            side_length,
            pixels,
            label,
        })
    }

    pub fn side_length(&self) -> usize {
        self.side_length
    }

    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }

    pub fn label(&self) -> usize {
        self.label
    }

    pub fn num_pixels(&self) -> usize {
        self.pixels.len()
    }

    /// Pixel value at column `x`, row `y`, or `None` outside the image.
    pub fn pixel(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.side_length || y >= self.side_length {
            return None;
        }
        self.pixels.get(y * self.side_length + x).copied()
    }
}
