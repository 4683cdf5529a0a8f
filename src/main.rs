//! tcp-client: send one transformation request to a TCP server
//!
//! The client opens a single connection, sends
//! `<action> <message_length> <message>`, reads the reply until the server
//! closes the connection, prints it, and exits.
//!
//! Actions: uppercase, lowercase, reverse, shuffle, random.
//!
//! Configuration comes from CLI arguments or a TOML file.

mod client;
mod config;
mod protocol;
mod session;

use client::ResponseBuffer;
use config::{Config, ConfigError};
use session::Session;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        // Usage errors and --help print themselves and pick their own status
        Err(ConfigError::Arguments(e)) => e.exit(),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging; stdout is reserved for the response
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!(
        host = %config.host,
        port = config.port,
        action = %config.action,
        "Starting tcp-client"
    );

    let mut buffer = ResponseBuffer::default();
    let mut session = Session::new(&config);

    match session.run(&mut buffer) {
        Ok(response) => match write_response(&mut io::stdout().lock(), response) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %e, "Could not write response");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!(kind = ?e.kind(), state = ?session.state(), "{e}");
            ExitCode::FAILURE
        }
    }
}

/// Print the response and a newline, replacing invalid UTF-8.
fn write_response<W: Write>(out: &mut W, response: &[u8]) -> io::Result<()> {
    writeln!(out, "{}", String::from_utf8_lossy(response))?;
    out.flush()
}
