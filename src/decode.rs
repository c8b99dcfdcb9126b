//! Helpers for decoding block data payloads into measurement values.
//!
//! Instruments send trace and waveform data as a flat sequence of 64-bit floats in the payload
//! of a block data response. These functions reinterpret such a payload; they are pure and
//! stateless, operating on whatever byte slice they are given.
//!
//! Byte order follows the host. Instruments let you pick the byte order of binary transfers
//! (e.g., `FORM:BORD`), so configure the instrument to match the controlling machine.

/// Convert a payload to a vector of `f64` values.
///
/// Interprets the bytes as consecutive native-endian 64-bit floats. A trailing remainder of
/// fewer than eight bytes is ignored.
///
/// # Arguments
/// * `data` - The payload bytes, e.g., from [`crate::BlockData::payload`].
pub fn to_f64_vector(data: &[u8]) -> Vec<f64> {
    data.chunks_exact(size_of::<f64>())
        .map(|chunk| {
            let mut bytes = [0u8; size_of::<f64>()];
            bytes.copy_from_slice(chunk);
            f64::from_ne_bytes(bytes)
        })
        .collect()
}

/// Convert a payload to a vector of complex values as `(re, im)` pairs.
///
/// The payload is assumed to be of the format `<re1><im1><re2><im2>...`, each value a
/// native-endian 64-bit float. A trailing unpaired value is ignored.
///
/// # Arguments
/// * `data` - The payload bytes, e.g., from [`crate::BlockData::payload`].
pub fn to_complex_vector(data: &[u8]) -> Vec<(f64, f64)> {
    to_f64_vector(data)
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect()
}
