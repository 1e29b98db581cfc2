//! Checksummed base56 encoding for hand-transcribed secrets
//!
//! The input buffer is read as one unsigned integer with its first byte
//! least significant, and written out in base 56, least significant digit
//! first. The output is cut into lines of 19 digits, each followed by one
//! checksum digit:
//!
//! - the checksum of a line is SHA-256 over that line's digit characters
//!   followed by the zero-based line number as a single byte,
//! - the digest is read as a little-endian integer and reduced modulo 56.
//!
//! Every code ends with a checksum digit, so the empty value encodes to a
//! single character. The line number never appears in the output.

use crate::codec::reverse;
use crate::error::{ErrorCategory, ErrorKind, Result, SqrlError};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::ToPrimitive;
use sha2::{Digest, Sha256};

/// Digit alphabet, in value order. Leaves out 0, 1, I, O and l.
pub const ALPHABET: &[u8; 56] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz";

/// Number of data digits in a full line.
pub const DATA_DIGITS_PER_LINE: usize = 19;

/// Characters in a full line: data digits plus the checksum digit.
pub const LINE_LEN: usize = DATA_DIGITS_PER_LINE + 1;

/// Largest buffer [`decode`] will produce.
pub const MAX_DECODED_LEN: usize = 64 * 1024;

const BASE: u32 = 56;

/// Encode `data` as a checksummed base56 string.
pub fn encode(data: &[u8]) -> String {
    let base = BigUint::from(BASE);
    let mut value = BigUint::from_bytes_be(&reverse(data));
    let mut encoded = String::new();
    let mut hasher = Sha256::new();
    let mut line: u8 = 0;
    let mut digits = 0;

    while value.bits() != 0 {
        if digits == DATA_DIGITS_PER_LINE {
            encoded.push(checksum_symbol(std::mem::take(&mut hasher), line));
            line = line.wrapping_add(1);
            digits = 0;
        }

        let (quotient, remainder) = value.div_rem(&base);
        value = quotient;
        let symbol = ALPHABET[digit_index(&remainder)];
        encoded.push(char::from(symbol));
        hasher.update([symbol]);
        digits += 1;
    }
    encoded.push(checksum_symbol(hasher, line));

    encoded
}

/// Decode a checksummed base56 string into exactly `byte_len` bytes.
///
/// ASCII whitespace is ignored. Every line checksum is verified before any
/// value is reconstructed, and the first bad line fails the whole decode.
/// `byte_len` may not exceed [`MAX_DECODED_LEN`].
pub fn decode(text: &str, byte_len: usize) -> Result<Vec<u8>> {
    if byte_len > MAX_DECODED_LEN {
        return Err(SqrlError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidParameter,
            format!(
                "cannot decode into {} bytes; the limit is {}",
                byte_len, MAX_DECODED_LEN
            ),
        ));
    }

    let symbols = normalize(text)?;
    verify_lines(&symbols)?;

    let base = BigUint::from(BASE);
    let mut value = BigUint::default();
    for line in symbols.chunks(LINE_LEN).rev() {
        let data = line.split_last().map_or(&[][..], |(_, data)| data);
        for &symbol in data.iter().rev() {
            value = value * &base + BigUint::from(digit_value(symbol).unwrap_or(0) as u32);
        }
    }

    let mut decoded = if value.bits() == 0 {
        Vec::new()
    } else {
        value.to_bytes_le()
    };
    if decoded.len() > byte_len {
        return Err(SqrlError::with_kind(
            ErrorCategory::User,
            ErrorKind::ValueOverflow,
            format!(
                "code holds a {}-byte value, more than the expected {} bytes",
                decoded.len(),
                byte_len
            ),
        ));
    }
    decoded.resize(byte_len, 0);

    if encode(&decoded).as_bytes() != symbols.as_slice() {
        return Err(SqrlError::with_kind(
            ErrorCategory::User,
            ErrorKind::NonCanonical,
            "code is not the canonical encoding of its value",
        ));
    }

    Ok(decoded)
}

/// Check every symbol and line checksum in `text` without decoding it.
pub fn verify(text: &str) -> Result<()> {
    let symbols = normalize(text)?;
    verify_lines(&symbols)
}

/// Split a code into its 20-character lines, one per output line.
pub fn group_lines(code: &str) -> String {
    code.as_bytes()
        .chunks(LINE_LEN)
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join("\n")
}

fn checksum_symbol(mut hasher: Sha256, line: u8) -> char {
    hasher.update([line]);
    let digest = reverse(&hasher.finalize());
    let remainder = BigUint::from_bytes_be(&digest) % BigUint::from(BASE);
    char::from(ALPHABET[digit_index(&remainder)])
}

fn line_checksum(data: &[u8], line: u8) -> char {
    let mut hasher = Sha256::new();
    hasher.update(data);
    checksum_symbol(hasher, line)
}

// Only called on remainders modulo BASE, which always fit.
fn digit_index(remainder: &BigUint) -> usize {
    remainder.to_usize().unwrap_or_default()
}

fn digit_value(symbol: u8) -> Option<usize> {
    ALPHABET.iter().position(|&s| s == symbol)
}

fn normalize(text: &str) -> Result<Vec<u8>> {
    let mut symbols = Vec::with_capacity(text.len());
    for (position, c) in text.chars().enumerate() {
        if c.is_ascii_whitespace() {
            continue;
        }
        if !c.is_ascii() || digit_value(c as u8).is_none() {
            return Err(SqrlError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidSymbol,
                format!("invalid character {:?} at position {}", c, position),
            ));
        }
        symbols.push(c as u8);
    }

    if symbols.is_empty() {
        return Err(SqrlError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidSymbol,
            "code is empty; even the empty value has a checksum digit",
        ));
    }

    Ok(symbols)
}

fn verify_lines(symbols: &[u8]) -> Result<()> {
    let line_count = symbols.len().div_ceil(LINE_LEN);
    for (index, line) in symbols.chunks(LINE_LEN).enumerate() {
        if line.len() == 1 && line_count > 1 {
            return Err(SqrlError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidSymbol,
                format!("line {} has a checksum digit but no data digits", index),
            ));
        }

        let Some((&checksum, data)) = line.split_last() else {
            continue;
        };
        if line_checksum(data, index as u8) != char::from(checksum) {
            return Err(SqrlError::with_kind(
                ErrorCategory::User,
                ErrorKind::ChecksumMismatch,
                format!("checksum mismatch on line {}", index),
            ));
        }
    }

    Ok(())
}
