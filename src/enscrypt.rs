//! Iterated scrypt key stretching (EnScrypt)
//!
//! The first scrypt call is salted with the caller's salt. Every following
//! call is salted with the previous call's output, and all outputs are
//! XORed together:
//!
//! ```text
//! k1 = scrypt(pw, salt)     acc = k1
//! k2 = scrypt(pw, k1)       acc = acc ^ k2
//! ...
//! kn = scrypt(pw, kn-1)     acc = acc ^ kn
//! ```
//!
//! Each call depends on the one before, so the iterations cannot be run in
//! parallel or precomputed.

use crate::codec::xor;
use crate::error::{ErrorCategory, ErrorKind, Result, SqrlError};
use crate::progress::ProgressReporter;
use scrypt::{Params, scrypt};
use zeroize::Zeroizing;

/// scrypt r parameter (block size)
pub const SCRYPT_R: u32 = 256;

/// scrypt p parameter (parallelization)
pub const SCRYPT_P: u32 = 1;

/// Default log2 of the scrypt N parameter (CPU/memory cost)
pub const DEFAULT_LOG_N: u8 = 9;

/// Default length of derived key in bytes
pub const DEFAULT_KEY_LEN: usize = 32;

/// Default number of chained scrypt calls
pub const DEFAULT_ITERATIONS: u32 = 100;

/// Derive one `output_len`-byte scrypt output with the fixed r and p.
fn derive_once(
    password: &[u8],
    salt: &[u8],
    params: &Params,
    output_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut key = Zeroizing::new(vec![0u8; output_len]);
    scrypt(password, salt, params, &mut key).map_err(|e| {
        SqrlError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::ScryptFailure,
            format!("scrypt key derivation failed: {}", e),
            e,
        )
    })?;
    Ok(key)
}

/// Stretch `password` into an `output_len`-byte key.
///
/// Runs `iterations` chained scrypt calls with N = 2^`log_n`, r = 256 and
/// p = 1. `progress` is timed around the first call and incremented after
/// every call. There is no way to abort a running derivation.
pub fn stretch(
    password: &[u8],
    salt: &[u8],
    log_n: u8,
    output_len: usize,
    iterations: u32,
    progress: &mut dyn ProgressReporter,
) -> Result<Zeroizing<Vec<u8>>> {
    if iterations < 1 {
        return Err(SqrlError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidParameter,
            "iteration count must be at least 1",
        ));
    }

    // The length given to Params only bounds PHC hash strings; the raw
    // output length comes from the buffer handed to scrypt().
    let params = Params::new(log_n, SCRYPT_R, SCRYPT_P, Params::RECOMMENDED_LEN).map_err(|e| {
        SqrlError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::ScryptFailure,
            format!("invalid scrypt parameters: {}", e),
            e,
        )
    })?;

    progress.start_timer();
    let mut key = derive_once(password, salt, &params, output_len)?;
    progress.end_timer();
    progress.increment_progress();

    let mut folded = key.clone();
    for _ in 1..iterations {
        key = derive_once(password, &key, &params, output_len)?;
        folded = Zeroizing::new(xor(&key, &folded).map_err(|e| {
            SqrlError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::InvalidParameter,
                "output length changed between iterations",
                e,
            )
        })?);
        progress.increment_progress();
    }

    Ok(folded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;

    // N = 16 keeps each call at 512 KiB with r = 256.
    const TEST_LOG_N: u8 = 4;

    #[derive(Default)]
    struct RecordingProgress {
        events: Vec<&'static str>,
    }

    impl ProgressReporter for RecordingProgress {
        fn start_timer(&mut self) {
            self.events.push("start");
        }

        fn end_timer(&mut self) {
            self.events.push("end");
        }

        fn increment_progress(&mut self) {
            self.events.push("increment");
        }
    }

    fn direct_scrypt(password: &[u8], salt: &[u8], log_n: u8, len: usize) -> Vec<u8> {
        let params = Params::new(log_n, SCRYPT_R, SCRYPT_P, Params::RECOMMENDED_LEN).unwrap();
        let mut out = vec![0u8; len];
        scrypt(password, salt, &params, &mut out).unwrap();
        out
    }

    #[test]
    fn test_single_iteration_is_plain_scrypt() {
        let key = stretch(b"password", b"salt", TEST_LOG_N, 32, 1, &mut NoProgress).unwrap();
        assert_eq!(&*key, &direct_scrypt(b"password", b"salt", TEST_LOG_N, 32)[..]);
    }

    #[test]
    fn test_two_iterations_chain_and_fold() {
        let first = direct_scrypt(b"password", b"salt", TEST_LOG_N, 32);
        let second = direct_scrypt(b"password", &first, TEST_LOG_N, 32);
        let expected = xor(&first, &second).unwrap();

        let key = stretch(b"password", b"salt", TEST_LOG_N, 32, 2, &mut NoProgress).unwrap();
        assert_eq!(&*key, &expected[..]);
    }

    #[test]
    fn test_output_length() {
        for len in [16usize, 32, 64] {
            let key = stretch(b"pw", b"salt", TEST_LOG_N, len, 3, &mut NoProgress).unwrap();
            assert_eq!(key.len(), len);
        }
    }

    #[test]
    fn test_lengths_outside_phc_range() {
        for len in [1usize, 8, 65, 128] {
            let key = stretch(b"password", b"salt", TEST_LOG_N, len, 1, &mut NoProgress).unwrap();
            assert_eq!(&*key, &direct_scrypt(b"password", b"salt", TEST_LOG_N, len)[..]);
        }

        let first = direct_scrypt(b"password", b"salt", TEST_LOG_N, 128);
        let second = direct_scrypt(b"password", &first, TEST_LOG_N, 128);
        let key = stretch(b"password", b"salt", TEST_LOG_N, 128, 2, &mut NoProgress).unwrap();
        assert_eq!(&*key, &xor(&first, &second).unwrap()[..]);
    }

    #[test]
    fn test_deterministic() {
        let a = stretch(b"password", b"salt", TEST_LOG_N, 32, 3, &mut NoProgress).unwrap();
        let b = stretch(b"password", b"salt", TEST_LOG_N, 32, 3, &mut NoProgress).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_input_matters() {
        let base = stretch(b"password", b"salt", TEST_LOG_N, 32, 2, &mut NoProgress).unwrap();

        let other_password =
            stretch(b"Password", b"salt", TEST_LOG_N, 32, 2, &mut NoProgress).unwrap();
        let other_salt = stretch(b"password", b"salT", TEST_LOG_N, 32, 2, &mut NoProgress).unwrap();
        let other_cost =
            stretch(b"password", b"salt", TEST_LOG_N + 1, 32, 2, &mut NoProgress).unwrap();
        let other_count = stretch(b"password", b"salt", TEST_LOG_N, 32, 3, &mut NoProgress).unwrap();

        assert_ne!(base, other_password);
        assert_ne!(base, other_salt);
        assert_ne!(base, other_cost);
        assert_ne!(base, other_count);
    }

    #[test]
    fn test_progress_signals() {
        let mut progress = RecordingProgress::default();
        stretch(b"password", b"salt", TEST_LOG_N, 32, 3, &mut progress).unwrap();
        assert_eq!(
            progress.events,
            vec!["start", "end", "increment", "increment", "increment"]
        );
    }

    #[test]
    fn test_zero_iterations() {
        let mut progress = RecordingProgress::default();
        let err = stretch(b"password", b"salt", TEST_LOG_N, 32, 0, &mut progress)
            .expect_err("expected parameter error");

        assert_eq!(err.kind, Some(ErrorKind::InvalidParameter));
        assert!(progress.events.is_empty());
    }

    #[test]
    fn test_invalid_scrypt_params() {
        let err = stretch(b"password", b"salt", 64, 32, 1, &mut NoProgress)
            .expect_err("expected scrypt parameter error");
        assert_eq!(err.kind, Some(ErrorKind::ScryptFailure));
        assert!(err.source_error().is_some());
    }

    #[test]
    fn test_empty_output_rejected() {
        let err = stretch(b"password", b"salt", TEST_LOG_N, 0, 1, &mut NoProgress)
            .expect_err("expected scrypt failure");
        assert_eq!(err.kind, Some(ErrorKind::ScryptFailure));
    }
}
