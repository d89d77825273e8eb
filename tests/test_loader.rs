//! Tests for dataset loading from disk
//!
//! This file tests:
//! - IDX image/label files written to a temporary directory
//! - Header-less raw byte files
//! - Concatenating several image/label file pairs
//! - Error reporting for missing and malformed files

use approx::assert_relative_eq;
use digit_net::data::{load_idx, load_idx_pairs, load_raw, load_raw_pairs};
use digit_net::NetworkError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn idx_images(count: u32, side: u32, pixels: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for value in [2051, count, side, side] {
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    bytes.extend_from_slice(pixels);
    bytes
}

fn idx_labels(labels: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2049u32.to_be_bytes());
    bytes.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    bytes.extend_from_slice(labels);
    bytes
}

fn write_pair(dir: &TempDir, images: &[u8], labels: &[u8]) -> (PathBuf, PathBuf) {
    write_named_pair(dir, "data", images, labels)
}

fn write_named_pair(dir: &TempDir, name: &str, images: &[u8], labels: &[u8]) -> (PathBuf, PathBuf) {
    let images_path = dir.path().join(format!("{name}-images.idx3-ubyte"));
    let labels_path = dir.path().join(format!("{name}-labels.idx1-ubyte"));
    fs::write(&images_path, images).unwrap();
    fs::write(&labels_path, labels).unwrap();
    (images_path, labels_path)
}

// ============================================================================
// IDX Loading Tests
// ============================================================================

mod idx_tests {
    use super::*;

    #[test]
    fn test_load_idx_files() {
        let dir = TempDir::new().unwrap();
        let pixels: Vec<u8> = vec![0, 255, 51, 102, 255, 255, 0, 0];
        let (images, labels) = write_pair(&dir, &idx_images(2, 2, &pixels), &idx_labels(&[3, 9]));

        let samples = load_idx(&images, &labels).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].side_length(), 2);
        assert_eq!(samples[0].label(), 3);
        assert_eq!(samples[1].label(), 9);
        assert_relative_eq!(samples[0].pixels()[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(samples[0].pixels()[2], 0.2, epsilon = 1e-12);
        assert_relative_eq!(samples[0].pixel(1, 1).unwrap(), 0.4, epsilon = 1e-12);
        assert_eq!(samples[1].pixels()[3], 0.0);
    }

    #[test]
    fn test_count_is_smaller_header() {
        let dir = TempDir::new().unwrap();
        let pixels = vec![128u8; 3 * 4];
        let (images, labels) = write_pair(&dir, &idx_images(3, 2, &pixels), &idx_labels(&[1, 2]));
        assert_eq!(load_idx(&images, &labels).unwrap().len(), 2);
    }

    #[test]
    fn test_wrong_magic_number() {
        let dir = TempDir::new().unwrap();
        let mut images = idx_images(1, 1, &[0]);
        images[3] = 0x04;
        let (images, labels) = write_pair(&dir, &images, &idx_labels(&[0]));
        assert!(matches!(
            load_idx(&images, &labels),
            Err(NetworkError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_swapped_files_rejected() {
        let dir = TempDir::new().unwrap();
        let (images, labels) = write_pair(&dir, &idx_images(1, 1, &[0]), &idx_labels(&[0]));
        assert!(load_idx(&labels, &images).is_err());
    }

    #[test]
    fn test_truncated_payload() {
        let dir = TempDir::new().unwrap();
        let (images, labels) = write_pair(&dir, &idx_images(2, 2, &[0; 5]), &idx_labels(&[0, 1]));
        assert!(matches!(
            load_idx(&images, &labels),
            Err(NetworkError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_invalid_label_byte() {
        let dir = TempDir::new().unwrap();
        let (images, labels) = write_pair(&dir, &idx_images(1, 1, &[7]), &idx_labels(&[10]));
        assert!(matches!(
            load_idx(&images, &labels),
            Err(NetworkError::InvalidLabel { label: 10, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nothing");
        assert!(matches!(
            load_idx(&missing, &missing),
            Err(NetworkError::Io(_))
        ));
    }
}

// ============================================================================
// Raw Loading Tests
// ============================================================================

mod raw_tests {
    use super::*;

    #[test]
    fn test_load_raw_files() {
        let dir = TempDir::new().unwrap();
        let pixels: Vec<u8> = (0..18).map(|i| (i * 10) as u8).collect();
        let (images, labels) = write_pair(&dir, &pixels, &[4, 5]);

        let samples = load_raw(&images, &labels, 3).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].label(), 5);
        assert_relative_eq!(samples[1].pixels()[0], 90.0 / 255.0, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_trailing_image_ignored() {
        let dir = TempDir::new().unwrap();
        let (images, labels) = write_pair(&dir, &[0u8; 10], &[1, 2, 3]);
        assert_eq!(load_raw(&images, &labels, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_zero_side_length() {
        let dir = TempDir::new().unwrap();
        let (images, labels) = write_pair(&dir, &[0u8; 4], &[1]);
        assert!(load_raw(&images, &labels, 0).is_err());
    }
}

// ============================================================================
// Multiple File Pair Tests
// ============================================================================

mod file_pair_tests {
    use super::*;

    #[test]
    fn test_idx_pairs_are_concatenated() {
        let dir = TempDir::new().unwrap();
        let train = write_named_pair(&dir, "train", &idx_images(3, 2, &[0; 12]), &idx_labels(&[1, 2, 3]));
        let test = write_named_pair(&dir, "test", &idx_images(2, 2, &[255; 8]), &idx_labels(&[7, 8]));

        let samples = load_idx_pairs(&[train, test]).unwrap();
        assert_eq!(samples.len(), 5);
        let labels: Vec<usize> = samples.iter().map(|image| image.label()).collect();
        assert_eq!(labels, vec![1, 2, 3, 7, 8]);
        assert_relative_eq!(samples[4].pixels()[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_raw_pairs_are_concatenated() {
        let dir = TempDir::new().unwrap();
        let first = write_named_pair(&dir, "first", &[0u8; 8], &[0, 1]);
        let second = write_named_pair(&dir, "second", &[0u8; 12], &[2, 3, 4]);

        let samples = load_raw_pairs(&[first, second], 2).unwrap();
        assert_eq!(samples.len(), 5);
    }

    #[test]
    fn test_idx_pairs_with_different_sides() {
        let dir = TempDir::new().unwrap();
        let small = write_named_pair(&dir, "small", &idx_images(1, 2, &[0; 4]), &idx_labels(&[1]));
        let large = write_named_pair(&dir, "large", &idx_images(1, 3, &[0; 9]), &idx_labels(&[1]));

        assert!(matches!(
            load_idx_pairs(&[small, large]),
            Err(NetworkError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_no_pairs_gives_no_samples() {
        let pairs: [(PathBuf, PathBuf); 0] = [];
        assert!(load_idx_pairs(&pairs).unwrap().is_empty());
    }
}
