//! Byte-level helpers shared by the encoders
//!
//! Every function here borrows its input and returns a freshly allocated
//! buffer. Nothing mutates caller-owned bytes.

use crate::error::{ErrorCategory, ErrorKind, Result, SqrlError};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Return a copy of `data` with its byte order reversed.
pub fn reverse(data: &[u8]) -> Vec<u8> {
    data.iter().rev().copied().collect()
}

/// Decode hex text into bytes. Either case is accepted.
pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>> {
    hex::decode(text).map_err(|e| {
        SqrlError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MalformedHex,
            format!("invalid hex: {}", e),
            e,
        )
    })
}

/// Encode bytes as lower-case hex with no separators.
pub fn bytes_to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Byte-wise exclusive-or of two equal-length buffers.
pub fn xor(a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
    if a.len() != b.len() {
        return Err(SqrlError::with_kind(
            ErrorCategory::User,
            ErrorKind::LengthMismatch,
            format!("cannot xor buffers of length {} and {}", a.len(), b.len()),
        ));
    }

    Ok(a.iter().zip(b).map(|(x, y)| x ^ y).collect())
}

/// Encode bytes as base64url without padding.
pub fn url_safe_base64_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode unpadded base64url text.
pub fn url_safe_base64_decode(text: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(text).map_err(|e| {
        SqrlError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Base64Decode,
            format!("base64 decoding failed: {}", e),
            e,
        )
    })
}
