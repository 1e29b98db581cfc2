//! Payload extraction from raw QR code scans
//!
//! Scanners hand back the full data codewords of a QR symbol: a mode
//! indicator and length prefix, the payload, a terminator, and `0xEC 0x11`
//! pad codewords filling the rest of the symbol. The mode indicator is four
//! bits wide, so the payload usually starts half-way through a byte. All
//! searching is therefore done on the hex string, one nibble at a time.

use crate::codec::{bytes_to_hex, hex_to_bytes};
use crate::error::{ErrorCategory, ErrorKind, Result, SqrlError};

/// Hex of the start markers, in the order they are tried:
/// `sqrldata`, `sqrl://` and `qrl://`.
const START_MARKERS: [&str; 3] = ["7371726c64617461", "7371726c3a2f2f", "71726c3a2f2f"];

/// Hex of the QR pad codeword pair.
const PADDING: &str = "ec11";

/// Extract the SQRL payload from a raw QR scan.
///
/// The returned bytes begin with the start marker that was found, since
/// the identity parser and URL handler both expect it.
pub fn extract(raw: &[u8]) -> Result<Vec<u8>> {
    let hex = bytes_to_hex(raw);

    let start = START_MARKERS
        .iter()
        .find_map(|marker| hex.find(marker))
        .ok_or_else(|| {
            SqrlError::with_kind(
                ErrorCategory::User,
                ErrorKind::MarkerNotFound,
                "no sqrldata, sqrl:// or qrl:// marker found in scan",
            )
        })?;

    let end = hex[start..]
        .rfind(PADDING)
        .map(|offset| start + offset)
        .ok_or_else(|| {
            SqrlError::with_kind(
                ErrorCategory::User,
                ErrorKind::PaddingNotFound,
                "no padding after the start marker; scan likely truncated",
            )
        })?;

    let mut payload = &hex[start..end];
    while let Some(stripped) = payload.strip_suffix(PADDING) {
        payload = stripped;
    }
    payload = payload.trim_end_matches('0');

    // Stripping zero nibbles can cut into the last payload byte.
    let mut payload = payload.to_owned();
    if payload.len() % 2 == 1 {
        payload.push('0');
    }

    hex_to_bytes(&payload).map_err(|e| e.with_context("failed to decode extracted payload"))
}

/// Extract the payload and return it as text.
///
/// Extraction errors are returned as from [`extract`]. A payload that is
/// not printable ASCII gives an empty string.
pub fn extract_text(raw: &[u8]) -> Result<String> {
    let payload = extract(raw)?;
    if !payload.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        return Ok(String::new());
    }
    Ok(payload.into_iter().map(char::from).collect())
}
