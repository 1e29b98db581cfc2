//! Where the password for `stretch` comes from
//!
//! Interactive use prompts on the terminal. Scripts pipe the password in,
//! which also allows passwords that are not valid UTF-8.

use crate::error::{ErrorCategory, ErrorKind, Result, SqrlError};
use std::io::{self, IsTerminal, Read};
use zeroize::Zeroizing;

/// Prompt shown when reading from the terminal.
pub const PROMPT: &str = "Password (sqrlcode): ";

/// A source of the password bytes fed to [`crate::enscrypt::stretch`].
pub trait PasswordReader {
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Reads a password from the terminal with no echo.
pub struct TerminalPasswordReader {
    prompt: String,
}

impl TerminalPasswordReader {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl PasswordReader for TerminalPasswordReader {
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(SqrlError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read password from terminal - stdin is not a terminal \
                 (use --passphrase-stdin to pipe it in)",
            ));
        }

        let password = rpassword::prompt_password(&self.prompt).map_err(|e| {
            SqrlError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                "failed to read password from terminal",
                e,
            )
        })?;
        Ok(Zeroizing::new(password.into_bytes()))
    }
}

/// Reads everything from a byte stream as the password.
///
/// One trailing `\n` or `\r\n` is dropped so that
/// `echo secret | sqrlcode stretch --passphrase-stdin` stretches `secret`.
/// All other bytes are kept as they are.
pub struct StreamPasswordReader<R> {
    reader: R,
}

impl<R: Read> StreamPasswordReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> PasswordReader for StreamPasswordReader<R> {
    fn read_password(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            SqrlError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to read password from stdin",
                e,
            )
        })?;

        if data.ends_with(b"\r\n") {
            let len = data.len();
            data.truncate(len - 2);
        } else if data.ends_with(b"\n") {
            let len = data.len();
            data.truncate(len - 1);
        }
        Ok(data)
    }
}

/// The reader selected by the `--passphrase-stdin` switch.
pub fn reader_for(use_stdin: bool) -> Box<dyn PasswordReader> {
    if use_stdin {
        Box::new(StreamPasswordReader::new(io::stdin()))
    } else {
        Box::new(TerminalPasswordReader::new(PROMPT))
    }
}
