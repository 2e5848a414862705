//! Binary array encoding for the XML library format
//!
//! Spectrum arrays are stored as text fields:
//!
//! 1. Write each value as a little-endian IEEE-754 float64
//! 2. Base64 encode the bytes (standard alphabet, padded)

use base64::prelude::*;
use byteorder::{LittleEndian, ReadBytesExt};

/// Errors that can occur decoding an encoded array
#[derive(Debug, thiserror::Error)]
pub enum BinaryDecodeError {
    /// Text is not valid base64
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// Byte stream could not be read
    #[error("Read error: {0}")]
    ReadError(#[from] std::io::Error),

    /// Byte count is not a multiple of 8
    #[error("Invalid data length: {0} bytes is not a whole number of float64 values")]
    InvalidLength(usize),
}

/// Encode values as base64 little-endian float64.
pub fn encode_f64_array(values: &[f64]) -> String {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for &value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    BASE64_STANDARD.encode(bytes)
}

/// Decode a base64 little-endian float64 array.
pub fn decode_f64_array(text: &str) -> Result<Vec<f64>, BinaryDecodeError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let bytes = BASE64_STANDARD.decode(trimmed)?;
    if bytes.len() % 8 != 0 {
        return Err(BinaryDecodeError::InvalidLength(bytes.len()));
    }

    let count = bytes.len() / 8;
    let mut values = Vec::with_capacity(count);
    let mut cursor = std::io::Cursor::new(bytes);
    for _ in 0..count {
        values.push(cursor.read_f64::<LittleEndian>()?);
    }
    Ok(values)
}
