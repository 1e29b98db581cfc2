//! SQRL identity primitives
//!
//! - [`base56`]: checksummed base56 encoding used for rescue codes
//! - [`enscrypt`]: iterated scrypt key stretching
//! - [`qrcode`]: payload extraction from raw QR code scans
//!
//! These do no I/O and no logging. Every function borrows its input and
//! returns newly allocated output. [`commands`] and [`password`] hold the
//! file and terminal handling for the `sqrlcode` binary.

#![forbid(unsafe_code)]

pub mod base56;
pub mod codec;
pub mod commands;
pub mod enscrypt;
pub mod error;
pub mod password;
pub mod progress;
pub mod qrcode;
