//! Binary model persistence
//!
//! Layout, all little-endian:
//!
//! ```text
//! u32          number of layer widths (k + 1)
//! u32 × (k+1)  widths n0..nk
//! per layer, in order:
//!   u64 + f64 × len   weights (row-major by output neuron)
//!   u64 + f64 × len   biases
//! ```
//!
//! Only parameters are stored. Velocities, gradient accumulators and the
//! running score start fresh on load.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::info;

use crate::error::{NetworkError, Result};
use crate::layers::DenseLayer;
use crate::network::Network;
use crate::optimizers::MomentumSgd;

// Arrays longer than this grow as their values are read.
const MAX_PREALLOCATED_VALUES: usize = 1 << 16;

/// Writes the parameters of `network` to `writer`.
pub fn write_model<W: Write>(network: &Network, writer: &mut W) -> Result<()> {
    let sizes = network.layer_sizes();
    write_u32(writer, sizes.len())?;
    for &size in &sizes {
        write_u32(writer, size)?;
    }

    for layer in network.layers() {
        write_f64_array(writer, layer.weights())?;
        write_f64_array(writer, layer.biases())?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a network written by [`write_model`].
///
/// # Errors
///
/// [`NetworkError::CorruptModel`] if the stream ends early or array lengths
/// disagree with the stored widths.
pub fn read_model<R: Read>(reader: &mut R, optimizer: MomentumSgd) -> Result<Network> {
    let width_count = read_u32(reader)? as usize;
    if width_count < 2 {
        return Err(NetworkError::CorruptModel(format!(
            "model stores {width_count} layer widths"
        )));
    }

    let mut sizes = Vec::new();
    for _ in 0..width_count {
        sizes.push(read_u32(reader)? as usize);
    }

    let mut layers = Vec::with_capacity(sizes.len() - 1);
    for (index, pair) in sizes.windows(2).enumerate() {
        let weight_count = pair[0].checked_mul(pair[1]).ok_or_else(|| {
            NetworkError::CorruptModel(format!(
                "layer {index} widths {} x {} overflow",
                pair[0], pair[1]
            ))
        })?;
        let weights = read_f64_array(reader, weight_count, index, "weights")?;
        let biases = read_f64_array(reader, pair[1], index, "biases")?;
        layers.push(DenseLayer::from_parameters(pair[0], pair[1], weights, biases)?);
    }

    Network::from_layers(layers, optimizer)
}

/// Saves `network` to the file at `path`.
pub fn save_model<P: AsRef<Path>>(network: &Network, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    write_model(network, &mut writer)?;
    info!("model saved to {}", path.as_ref().display());
    Ok(())
}

/// Loads a network from the file at `path`.
pub fn load_model<P: AsRef<Path>>(path: P, optimizer: MomentumSgd) -> Result<Network> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    let network = read_model(&mut reader, optimizer)?;
    info!(
        "model with layer sizes {:?} loaded from {}",
        network.layer_sizes(),
        path.as_ref().display()
    );
    Ok(network)
}

fn write_u32<W: Write>(writer: &mut W, value: usize) -> Result<()> {
    let value = u32::try_from(value)
        .map_err(|_| NetworkError::CorruptModel(format!("width {value} does not fit in u32")))?;
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn write_f64_array<W: Write>(writer: &mut W, values: &[f64]) -> Result<()> {
    writer.write_all(&(values.len() as u64).to_le_bytes())?;
    for value in values {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

fn read_exact<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N]> {
    let mut buffer = [0u8; N];
    reader.read_exact(&mut buffer).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            NetworkError::CorruptModel("unexpected end of model data".to_string())
        } else {
            NetworkError::Io(err)
        }
    })?;
    Ok(buffer)
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    Ok(u32::from_le_bytes(read_exact(reader)?))
}

fn read_f64_array<R: Read>(
    reader: &mut R,
    expected: usize,
    layer: usize,
    what: &str,
) -> Result<Vec<f64>> {
    let len = u64::from_le_bytes(read_exact(reader)?);
    if len != expected as u64 {
        return Err(NetworkError::CorruptModel(format!(
            "layer {layer} {what}: expected {expected} values, found {len}"
        )));
    }

    let mut values = Vec::with_capacity(expected.min(MAX_PREALLOCATED_VALUES));
    for _ in 0..expected {
        values.push(f64::from_le_bytes(read_exact(reader)?));
    }
    Ok(values)
}
