//! Mini-batch construction
//!
//! Samples are shuffled in place with a Fisher-Yates shuffle and then split
//! into contiguous, equally sized groups. A trailing group smaller than the
//! batch size is dropped.

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use super::image::Image;

/// A fixed-size, ordered group of samples.
///
/// Batches borrow the shuffled sample slice they were cut from, so building
/// them never copies pixel data.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    samples: &'a [Image],
}

impl<'a> Batch<'a> {
    pub fn new(samples: &'a [Image]) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &'a [Image] {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'a, Image> {
        self.samples.iter()
    }
}

impl<'a> IntoIterator for Batch<'a> {
    type Item = &'a Image;
    type IntoIter = std::slice::Iter<'a, Image>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Shuffles `samples` in place and partitions them into batches of
/// `batch_size`.
///
/// Produces `samples.len() / batch_size` batches, each exactly `batch_size`
/// long; the remainder is dropped.
///
/// # Boundary behavior
///
/// A `batch_size` of zero, or one larger than the number of samples, yields
/// zero batches. The samples are still shuffled in the second case.
///
/// # Example
///
/// ```
/// use digit_net::data::{build_batches, Image};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut samples: Vec<Image> = (0..10)
///     .map(|i| Image::new(1, vec![i as f64 / 10.0], i % 10).unwrap())
///     .collect();
/// let mut rng = StdRng::seed_from_u64(7);
/// let batches = build_batches(&mut samples, 3, &mut rng);
/// assert_eq!(batches.len(), 3);
/// assert!(batches.iter().all(|b| b.len() == 3));
/// ```
pub fn build_batches<'a, R>(
    samples: &'a mut [Image],
    batch_size: usize,
    rng: &mut R,
) -> Vec<Batch<'a>>
where
    R: Rng + ?Sized,
{
    if batch_size == 0 {
        warn!("batch size of zero requested; no batches built");
        return Vec::new();
    }

    samples.shuffle(rng);
    let samples: &'a [Image] = samples;

    let remainder = samples.len() % batch_size;
    if samples.len() < batch_size {
        warn!(
            "batch size {} exceeds sample count {}; no batches built",
            batch_size,
            samples.len()
        );
    } else if remainder > 0 {
        debug!("dropping {} trailing samples that do not fill a batch", remainder);
    }

    samples.chunks_exact(batch_size).map(Batch::new).collect()
}
