use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// In particular this means that use of Internal is never a guarantee
    /// the error is not, for example due to a user error - merely that it
    /// cannot be confidently determined by the code.
    Internal,

    /// The caller provided invalid input or requested an operation that is
    /// unsupported or impossible to complete.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Hex text had odd length or contained a non-hex digit.
    MalformedHex,
    /// Two buffers that must be the same length were not.
    LengthMismatch,
    /// Base64url decoding failed.
    Base64Decode,
    /// A base56 code contained a character outside the alphabet, or was
    /// structured in a way no encoder could have produced.
    InvalidSymbol,
    /// A base56 line failed its checksum. Most likely a transcription error.
    ChecksumMismatch,
    /// The decoded value does not fit in the requested number of bytes.
    ValueOverflow,
    /// The code decodes, but is not the canonical encoding of its value.
    NonCanonical,
    /// None of the known start markers occur in a scanned QR payload.
    MarkerNotFound,
    /// A scanned QR payload has no trailing padding marker after its start.
    PaddingNotFound,
    /// A derivation parameter was out of range.
    InvalidParameter,
    /// Low-level scrypt key derivation failed.
    ScryptFailure,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct SqrlError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl SqrlError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that retains the originating source error.
    pub fn with_source(
        category: ErrorCategory,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: None,
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SqrlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_category_and_kind() {
        let err = SqrlError::with_kind(
            ErrorCategory::User,
            ErrorKind::ChecksumMismatch,
            "checksum mismatch on line 2",
        )
        .with_context("failed to decode rescue code");

        assert_eq!(err.category, ErrorCategory::User);
        assert_eq!(err.kind, Some(ErrorKind::ChecksumMismatch));
        assert_eq!(err.message(), "failed to decode rescue code");
        assert_eq!(
            err.source_error().unwrap().to_string(),
            "checksum mismatch on line 2"
        );
    }

    #[test]
    fn test_with_source_keeps_message_and_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = SqrlError::with_source(ErrorCategory::Internal, "failed to read scan", io);

        assert_eq!(err.kind, None);
        assert_eq!(err.to_string(), "failed to read scan");
        assert!(err.source_error().is_some());
    }
}
