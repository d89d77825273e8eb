//! Training samples: image records, batch construction and dataset decoding.

pub mod batch;
pub mod image;
pub mod loader;

pub use batch::{build_batches, Batch};
pub use image::Image;
pub use loader::{decode_idx, decode_images, load_idx, load_idx_pairs, load_raw, load_raw_pairs};
