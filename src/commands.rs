//! Command implementations behind the `sqrlcode` binary
//!
//! Each command produces its output as text. [`write_output`] sends it to
//! stdout or to a file created with owner-only permissions, since most of
//! what passes through here is secret material.

use crate::base56;
use crate::codec::{bytes_to_hex, hex_to_bytes, url_safe_base64_encode};
use crate::enscrypt;
use crate::error::{ErrorCategory, ErrorKind, Result, SqrlError};
use crate::password::PasswordReader;
use crate::progress::ProgressReporter;
use crate::qrcode;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Where a command takes its input from.
#[derive(Debug, Clone)]
pub enum Input {
    /// Read from a file.
    File(PathBuf),
    /// Given directly on the command line.
    Inline(String),
}

/// Parameters for [`stretch`].
#[derive(Debug, Clone)]
pub struct StretchOptions {
    /// Salt to use; a random 16-byte salt is drawn when absent.
    pub salt: Option<Vec<u8>>,
    pub log_n: u8,
    pub length: usize,
    pub iterations: u32,
}

impl Default for StretchOptions {
    fn default() -> Self {
        Self {
            salt: None,
            log_n: enscrypt::DEFAULT_LOG_N,
            length: enscrypt::DEFAULT_KEY_LEN,
            iterations: enscrypt::DEFAULT_ITERATIONS,
        }
    }
}

/// Length of the salt drawn when none is supplied.
pub const RANDOM_SALT_LEN: usize = 16;

/// Encode raw file bytes, or inline hex, as a base56 rescue code.
pub fn encode(input: &Input, group: bool) -> Result<Zeroizing<String>> {
    let data = match input {
        Input::File(path) => Zeroizing::new(fs::read(path).map_err(|e| read_error(path, e))?),
        Input::Inline(hex) => Zeroizing::new(
            hex_to_bytes(hex.trim()).map_err(|e| e.with_context("failed to parse input hex"))?,
        ),
    };

    let code = base56::encode(&data);
    let code = if group {
        base56::group_lines(&code)
    } else {
        code
    };
    Ok(Zeroizing::new(code + "\n"))
}

/// Decode a rescue code into `length` bytes, returned as hex.
pub fn decode(input: &Input, length: usize) -> Result<Zeroizing<String>> {
    let text = match input {
        Input::File(path) => Zeroizing::new(read_utf8(path)?),
        Input::Inline(code) => Zeroizing::new(code.clone()),
    };

    let data = Zeroizing::new(
        base56::decode(&text, length).map_err(|e| e.with_context("failed to decode rescue code"))?,
    );
    Ok(Zeroizing::new(bytes_to_hex(&data) + "\n"))
}

/// Derive a key from the password supplied by `reader`.
///
/// Output is two lines, `salt <base64url>` and `key <base64url>`, so a
/// randomly drawn salt is never lost.
pub fn stretch(
    options: &StretchOptions,
    reader: &mut dyn PasswordReader,
    progress: &mut dyn ProgressReporter,
) -> Result<Zeroizing<String>> {
    let salt = match &options.salt {
        Some(salt) => salt.clone(),
        None => rand::random::<[u8; RANDOM_SALT_LEN]>().to_vec(),
    };
    let password = reader.read_password()?;

    let key = enscrypt::stretch(
        &password,
        &salt,
        options.log_n,
        options.length,
        options.iterations,
        progress,
    )
    .map_err(|e| e.with_context("key stretching failed"))?;

    Ok(Zeroizing::new(format!(
        "salt {}\nkey {}\n",
        url_safe_base64_encode(&salt),
        url_safe_base64_encode(&key)
    )))
}

/// Extract the payload of a raw QR scan, as hex or as text.
///
/// In text mode a payload that is not printable yields an empty line.
/// Scans with no payload to extract fail in both modes.
pub fn extract(input: &Path, text: bool) -> Result<String> {
    let raw = fs::read(input).map_err(|e| read_error(input, e))?;

    let rendered = if text {
        qrcode::extract_text(&raw)
    } else {
        qrcode::extract(&raw).map(|payload| bytes_to_hex(&payload))
    };
    let rendered = rendered.map_err(|e| e.with_context("failed to extract payload"))?;
    Ok(rendered + "\n")
}

/// Write command output to `path`, or to stdout when no path is given.
///
/// Files are created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => write_file_secure(path, contents.as_bytes())
            .map_err(|e| e.with_context(format!("failed to write to {}", path.display()))),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(contents.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|e| {
                    SqrlError::with_kind_and_source(
                        ErrorCategory::Internal,
                        ErrorKind::Io,
                        "failed to write to stdout",
                        e,
                    )
                })
        }
    }
}

fn read_utf8(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| read_error(path, e))?;
    String::from_utf8(bytes).map_err(|e| {
        SqrlError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("{} is not valid UTF-8", path.display()),
            e,
        )
    })
}

/// Write file with secure permissions (0o600 on Unix)
///
/// An existing file is narrowed to 0o600 before anything is written to it.
fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::fs::{OpenOptions, Permissions};
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let open_error = |e: io::Error| {
            SqrlError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to open {}", path.display()),
                e,
            )
        };
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o600)
            .open(path)
            .map_err(open_error)?;
        // mode() only applies when the file is created.
        file.set_permissions(Permissions::from_mode(0o600))
            .and_then(|_| file.set_len(0))
            .map_err(open_error)?;
        file.write_all(contents).map_err(|e| {
            SqrlError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to write output",
                e,
            )
        })?;
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents).map_err(|e| {
            SqrlError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
    }

    Ok(())
}

fn read_error(path: &Path, e: io::Error) -> SqrlError {
    SqrlError::with_kind_and_source(
        ErrorCategory::User,
        ErrorKind::Io,
        format!("failed to read {}", path.display()),
        e,
    )
}
