//! Dataset decoding
//!
//! Turns encoded image/label bytes into [`Image`] records. Two encodings are
//! supported:
//!
//! - raw: one byte per pixel, images back to back, one byte per label;
//! - IDX (the MNIST distribution format): the same payload preceded by a
//!   big-endian header.
//!
//! Pixel normalization and per-image slicing are independent per sample and
//! run in parallel with rayon.

use std::fs;
use std::path::Path;

use log::info;
use rayon::prelude::*;

use super::image::Image;
use crate::error::{NetworkError, Result};

const IDX_IMAGE_MAGIC: u32 = 2051;
const IDX_LABEL_MAGIC: u32 = 2049;
const PIXEL_SCALE: f64 = 1.0 / 255.0;

/// Decodes raw pixel and label bytes into images of `side_length²` pixels.
///
/// Produces `min(image_bytes.len() / side_length², label_bytes.len())`
/// images; trailing bytes that do not form a whole image are ignored. Pixel
/// bytes are scaled by `1/255`.
///
/// # Errors
///
/// Returns [`NetworkError::InvalidDataset`] for a zero side length and
/// [`NetworkError::InvalidLabel`] if any used label byte is not a valid class.
pub fn decode_images(
    image_bytes: &[u8],
    label_bytes: &[u8],
    side_length: usize,
) -> Result<Vec<Image>> {
    if side_length == 0 {
        return Err(NetworkError::InvalidDataset(
            "image side length must be greater than 0".to_string(),
        ));
    }

    let bytes_per_image = side_length.checked_mul(side_length).ok_or_else(|| {
        NetworkError::InvalidDataset(format!("image side length {side_length} is too large"))
    })?;
    let num_images = image_bytes.len() / bytes_per_image;
    let count = num_images.min(label_bytes.len());

    let pixel_values: Vec<f64> = image_bytes[..count * bytes_per_image]
        .par_iter()
        .map(|&byte| byte as f64 * PIXEL_SCALE)
        .collect();

    pixel_values
        .par_chunks_exact(bytes_per_image)
        .zip(label_bytes[..count].par_iter())
        .map(|(pixels, &label)| Image::new(side_length, pixels.to_vec(), label as usize))
        .collect()
}

/// Reads header-less image and label files and decodes them.
pub fn load_raw<P: AsRef<Path>>(
    images_path: P,
    labels_path: P,
    side_length: usize,
) -> Result<Vec<Image>> {
    let image_bytes = fs::read(images_path.as_ref())?;
    let label_bytes = fs::read(labels_path.as_ref())?;
    let images = decode_images(&image_bytes, &label_bytes, side_length)?;
    info!(
        "loaded {} raw images ({}x{}) from {}",
        images.len(),
        side_length,
        side_length,
        images_path.as_ref().display()
    );
    Ok(images)
}

/// Reads an IDX image file and its IDX label file and decodes them.
///
/// Images must be square. The sample count is the smaller of the two
/// header counts.
pub fn load_idx<P: AsRef<Path>>(images_path: P, labels_path: P) -> Result<Vec<Image>> {
    let image_data = fs::read(images_path.as_ref())?;
    let label_data = fs::read(labels_path.as_ref())?;
    let images = decode_idx(&image_data, &label_data)?;
    info!(
        "loaded {} IDX images from {}",
        images.len(),
        images_path.as_ref().display()
    );
    Ok(images)
}

/// Loads several raw image/label file pairs and concatenates their samples
/// in the order given.
pub fn load_raw_pairs<P: AsRef<Path>>(
    pairs: &[(P, P)],
    side_length: usize,
) -> Result<Vec<Image>> {
    concat_pairs(pairs, |images_path, labels_path| {
        load_raw(images_path, labels_path, side_length)
    })
}

/// Loads several IDX image/label file pairs and concatenates their samples
/// in the order given.
///
/// # Errors
///
/// [`NetworkError::InvalidDataset`] if the pairs hold images of different
/// side lengths, besides the errors of [`load_idx`].
pub fn load_idx_pairs<P: AsRef<Path>>(pairs: &[(P, P)]) -> Result<Vec<Image>> {
    concat_pairs(pairs, |images_path, labels_path| load_idx(images_path, labels_path))
}

fn concat_pairs<P, F>(pairs: &[(P, P)], mut load_pair: F) -> Result<Vec<Image>>
where
    P: AsRef<Path>,
    F: FnMut(&Path, &Path) -> Result<Vec<Image>>,
{
    let mut samples: Vec<Image> = Vec::new();
    for (images_path, labels_path) in pairs {
        let images = load_pair(images_path.as_ref(), labels_path.as_ref())?;
        if let (Some(first), Some(next)) = (samples.first(), images.first()) {
            if first.side_length() != next.side_length() {
                return Err(NetworkError::InvalidDataset(format!(
                    "{} holds {}x{} images, earlier files hold {}x{}",
                    images_path.as_ref().display(),
                    next.side_length(),
                    next.side_length(),
                    first.side_length(),
                    first.side_length()
                )));
            }
        }
        samples.extend(images);
    }
    if pairs.len() > 1 {
        info!("combined {} samples from {} file pairs", samples.len(), pairs.len());
    }
    Ok(samples)
}

/// Decodes in-memory IDX image and label buffers.
pub fn decode_idx(image_data: &[u8], label_data: &[u8]) -> Result<Vec<Image>> {
    let mut offset = 0usize;
    let magic = read_be_u32(image_data, &mut offset)?;
    if magic != IDX_IMAGE_MAGIC {
        return Err(NetworkError::InvalidDataset(format!(
            "image file magic number {magic}, expected {IDX_IMAGE_MAGIC}"
        )));
    }
    let total_images = read_be_u32(image_data, &mut offset)? as usize;
    let rows = read_be_u32(image_data, &mut offset)? as usize;
    let cols = read_be_u32(image_data, &mut offset)? as usize;
    if rows != cols {
        return Err(NetworkError::InvalidDataset(format!(
            "images must be square, got {rows}x{cols}"
        )));
    }
    let image_payload = &image_data[offset..];

    let mut label_offset = 0usize;
    let label_magic = read_be_u32(label_data, &mut label_offset)?;
    if label_magic != IDX_LABEL_MAGIC {
        return Err(NetworkError::InvalidDataset(format!(
            "label file magic number {label_magic}, expected {IDX_LABEL_MAGIC}"
        )));
    }
    let total_labels = read_be_u32(label_data, &mut label_offset)? as usize;
    let label_payload = &label_data[label_offset..];

    let count = total_images.min(total_labels);
    let image_bytes = count
        .checked_mul(rows)
        .and_then(|bytes| bytes.checked_mul(cols))
        .ok_or_else(|| {
            NetworkError::InvalidDataset(format!(
                "IDX header describes {count} images of {rows}x{cols}, which overflows"
            ))
        })?;
    if image_payload.len() < image_bytes {
        return Err(NetworkError::InvalidDataset("IDX image file is truncated".to_string()));
    }
    if label_payload.len() < count {
        return Err(NetworkError::InvalidDataset("IDX label file is truncated".to_string()));
    }

    decode_images(&image_payload[..image_bytes], &label_payload[..count], rows)
}

fn read_be_u32(data: &[u8], offset: &mut usize) -> Result<u32> {
    let end = *offset + 4;
    let bytes: [u8; 4] = data
        .get(*offset..end)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| NetworkError::InvalidDataset("IDX header is truncated".to_string()))?;
    *offset = end;
    Ok(u32::from_be_bytes(bytes))
}
