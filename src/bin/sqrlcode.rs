//! sqrlcode CLI - SQRL rescue codes, EnScrypt and QR payloads
//!
//! Command-line front end for the sqrlcode library. Log output goes to
//! stderr and is controlled with `RUST_LOG` (default `warn`).

use clap::{Parser, Subcommand};
use std::error::Error as StdError;
use std::path::PathBuf;
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use sqrlcode::codec::hex_to_bytes;
use sqrlcode::commands::{self, Input, StretchOptions};
use sqrlcode::enscrypt::{DEFAULT_ITERATIONS, DEFAULT_KEY_LEN, DEFAULT_LOG_N};
use sqrlcode::error::{Result, SqrlError};
use sqrlcode::password;
use sqrlcode::progress::{ProgressReporter, TimingProgress};

#[derive(Parser)]
#[command(name = "sqrlcode")]
#[command(version)]
#[command(about = "SQRL rescue codes, EnScrypt key stretching and QR payloads.", long_about = None)]
struct Cli {
    /// Read password from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Path to write output to instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode bytes as a checksummed base56 rescue code
    #[command(alias = "e")]
    Encode {
        /// Path to the file whose raw bytes are to be encoded
        #[arg(short, long, value_name = "FILE", conflicts_with = "hex")]
        input: Option<PathBuf>,

        /// Bytes to encode, given as hex
        #[arg(long, value_name = "HEX", required_unless_present = "input")]
        hex: Option<String>,

        /// Break the code into its 20-character lines
        #[arg(long)]
        group: bool,
    },

    /// Verify and decode a base56 rescue code, printing the bytes as hex
    #[command(alias = "d")]
    Decode {
        /// Number of bytes the code holds
        #[arg(short, long)]
        length: usize,

        /// Path to a file containing the code
        #[arg(short, long, value_name = "FILE", conflicts_with = "code")]
        input: Option<PathBuf>,

        /// The code itself; whitespace is ignored
        #[arg(value_name = "CODE", required_unless_present = "input")]
        code: Option<String>,
    },

    /// Derive a key from a password with iterated scrypt
    #[command(alias = "s")]
    Stretch {
        /// Salt as hex; a random salt is generated when omitted
        #[arg(long, value_name = "HEX")]
        salt: Option<String>,

        /// log2 of the scrypt cost parameter N
        #[arg(long, default_value_t = DEFAULT_LOG_N)]
        log_n: u8,

        /// Length of the derived key in bytes
        #[arg(short, long, default_value_t = DEFAULT_KEY_LEN)]
        length: usize,

        /// Number of chained scrypt calls
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: u32,
    },

    /// Extract the SQRL payload from a raw QR code scan
    #[command(alias = "x")]
    Extract {
        /// Path to the raw scanned bytes
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Print the payload as text; prints an empty line if it is not printable
        #[arg(long)]
        text: bool,
    },
}

/// Logs derivation progress through `tracing`.
struct LogProgress {
    inner: TimingProgress,
}

impl ProgressReporter for LogProgress {
    fn start_timer(&mut self) {
        self.inner.start_timer();
    }

    fn end_timer(&mut self) {
        self.inner.end_timer();
        if let Some(elapsed) = self.inner.first_iteration() {
            info!(
                elapsed_ms = elapsed.as_millis() as u64,
                total = self.inner.total(),
                "first scrypt iteration finished"
            );
        }
    }

    fn increment_progress(&mut self) {
        self.inner.increment_progress();
        debug!(
            completed = self.inner.completed(),
            total = self.inner.total(),
            remaining_ms = self
                .inner
                .estimated_remaining()
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default(),
            "scrypt iteration finished"
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", chain(&e));
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let output = match cli.command {
        Commands::Encode { input, hex, group } => {
            commands::encode(&input_from(input, hex), group)?
        }
        Commands::Decode {
            length,
            input,
            code,
        } => commands::decode(&input_from(input, code), length)?,
        Commands::Stretch {
            salt,
            log_n,
            length,
            iterations,
        } => {
            let salt = salt
                .map(|s| hex_to_bytes(&s).map_err(|e| e.with_context("failed to parse salt")))
                .transpose()?;
            let options = StretchOptions {
                salt,
                log_n,
                length,
                iterations,
            };
            let mut reader = password::reader_for(cli.passphrase_stdin);
            let mut progress = LogProgress {
                inner: TimingProgress::new(iterations),
            };
            debug!(log_n, length, iterations, "stretching password");
            commands::stretch(&options, &mut *reader, &mut progress)?
        }
        Commands::Extract { input, text } => {
            zeroize::Zeroizing::new(commands::extract(&input, text)?)
        }
    };

    commands::write_output(cli.output.as_deref(), &output)
}

// clap guarantees exactly one of the two is present.
fn input_from(path: Option<PathBuf>, inline: Option<String>) -> Input {
    match path {
        Some(path) => Input::File(path),
        None => Input::Inline(inline.unwrap_or_default()),
    }
}

/// Render an error and its sources as `outer: inner: innermost`.
fn chain(e: &SqrlError) -> String {
    let mut rendered = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        rendered.push_str(": ");
        rendered.push_str(&inner.to_string());
        source = inner.source();
    }
    rendered
}
