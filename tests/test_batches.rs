//! Tests for mini-batch construction
//!
//! This file tests:
//! - Batch counts and sizes, including the dropped remainder
//! - That shuffling permutes the samples without losing any
//! - Reproducibility under a fixed seed
//! - Degenerate batch sizes

use digit_net::data::{build_batches, Batch, Image};
use rand::rngs::StdRng;
use rand::SeedableRng;

// Sample `i` carries `i` as its single pixel so it can be identified after
// shuffling.
fn numbered_samples(count: usize) -> Vec<Image> {
    (0..count)
        .map(|i| Image::new(1, vec![i as f64], i % 10).unwrap())
        .collect()
}

fn ids(batches: &[Batch<'_>]) -> Vec<usize> {
    batches
        .iter()
        .flat_map(|batch| batch.iter())
        .map(|image| image.pixels()[0] as usize)
        .collect()
}

// ============================================================================
// Batch Shape Tests
// ============================================================================

mod batch_shape_tests {
    use super::*;

    #[test]
    fn test_batch_count_drops_remainder() {
        let mut rng = StdRng::seed_from_u64(1);
        for &(count, size, expected) in &[(10, 3, 3), (12, 4, 3), (7, 7, 1), (100, 32, 3), (5, 1, 5)] {
            let mut samples = numbered_samples(count);
            let batches = build_batches(&mut samples, size, &mut rng);
            assert_eq!(batches.len(), expected, "{count} samples in batches of {size}");
            assert!(batches.iter().all(|batch| batch.len() == size));
        }
    }

    #[test]
    fn test_batch_size_larger_than_samples() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut samples = numbered_samples(5);
        let batches = build_batches(&mut samples, 6, &mut rng);
        assert!(batches.is_empty());
    }

    #[test]
    fn test_zero_batch_size() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut samples = numbered_samples(5);
        assert!(build_batches(&mut samples, 0, &mut rng).is_empty());
        assert_eq!(samples.len(), 5);
    }

    #[test]
    fn test_empty_sample_set() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut samples: Vec<Image> = Vec::new();
        assert!(build_batches(&mut samples, 4, &mut rng).is_empty());
    }
}

// ============================================================================
// Shuffle Tests
// ============================================================================

mod shuffle_tests {
    use super::*;

    #[test]
    fn test_exact_division_is_a_permutation() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut samples = numbered_samples(24);
            let batches = build_batches(&mut samples, 6, &mut rng);

            let mut seen = ids(&batches);
            seen.sort_unstable();
            assert_eq!(seen, (0..24).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_remainder_samples_are_distinct() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut samples = numbered_samples(23);
        let batches = build_batches(&mut samples, 5, &mut rng);

        let mut seen = ids(&batches);
        assert_eq!(seen.len(), 20);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 20);
        assert!(seen.iter().all(|&id| id < 23));
    }

    #[test]
    fn test_batches_follow_shuffled_order() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut samples = numbered_samples(12);
        let batch_ids = ids(&build_batches(&mut samples, 4, &mut rng));

        let slice_ids: Vec<usize> = samples.iter().map(|image| image.pixels()[0] as usize).collect();
        assert_eq!(batch_ids, slice_ids);
    }

    #[test]
    fn test_same_seed_same_batches() {
        let mut first = numbered_samples(30);
        let mut second = numbered_samples(30);
        let a = ids(&build_batches(&mut first, 7, &mut StdRng::seed_from_u64(99)));
        let b = ids(&build_batches(&mut second, 7, &mut StdRng::seed_from_u64(99)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_moves_samples() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut samples = numbered_samples(50);
        let shuffled = ids(&build_batches(&mut samples, 50, &mut rng));
        assert_ne!(shuffled, (0..50).collect::<Vec<_>>());
    }
}
