//! Configuration module for tcp-client.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use crate::protocol::{self, Action, MAX_PAYLOAD_SIZE};
use clap::{ArgAction, Parser};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments for the client
#[derive(Parser, Debug)]
#[command(name = "tcp-client")]
#[command(author = "tcp-client authors")]
#[command(version = "0.1.0")]
#[command(about = "Send one transformation request to a TCP server", long_about = None)]
#[command(disable_help_flag = true)]
pub struct CliArgs {
    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Server host name or address [default: localhost]
    #[arg(short = 'h', long, value_name = "HOSTNAME")]
    pub host: Option<String>,

    /// Server port, 1-65535 [default: 8080]
    #[arg(short = 'p', long, value_name = "PORT", value_parser = parse_port)]
    pub port: Option<u16>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error) [default: warn]
    #[arg(long)]
    pub log_level: Option<String>,

    /// Transformation for the server to apply
    #[arg(value_enum)]
    pub action: Action,

    /// Message to send to the server
    pub message: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server to connect to
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Kept wide so out-of-range values reach port validation
    #[serde(default = "default_port")]
    pub port: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> i64 {
    8080
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn parse_port(s: &str) -> Result<u16, String> {
    match s.parse::<i64>() {
        Ok(port) => validate_port(port).map_err(|e| e.to_string()),
        Err(_) => Err(format!(
            "'{s}' is not a number. Port must be a number between 1 and 65535."
        )),
    }
}

fn validate_port(port: i64) -> Result<u16, ConfigError> {
    match u16::try_from(port) {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(ConfigError::InvalidPort(port)),
    }
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub action: Action,
    pub message: String,
    pub verbose: bool,
    pub log_level: String,
}

impl Config {
    /// Load configuration from process arguments and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(std::env::args_os())
    }

    /// Load configuration from the given arguments and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = CliArgs::try_parse_from(args).map_err(ConfigError::Arguments)?;

        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let port = match cli.port {
            Some(port) => port,
            None => validate_port(toml_config.server.port)?,
        };

        let encoded = protocol::encoded_len(cli.action, &cli.message);
        if encoded > MAX_PAYLOAD_SIZE {
            return Err(ConfigError::MessageTooLong {
                len: encoded,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        // Merge CLI args with TOML config (CLI takes precedence)
        Ok(Config {
            host: cli.host.unwrap_or(toml_config.server.host),
            port,
            action: cli.action,
            message: cli.message,
            verbose: cli.verbose,
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        })
    }

    /// Log filter directive, raised to `debug` in verbose mode.
    pub fn log_filter(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    Arguments(clap::Error),
    InvalidPort(i64),
    MessageTooLong { len: usize, max: usize },
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Arguments(e) => write!(f, "{e}"),
            ConfigError::InvalidPort(port) => write!(
                f,
                "Invalid port number {port}. Port must be a number between 1 and 65535."
            ),
            ConfigError::MessageTooLong { len, max } => {
                write!(f, "Message too long: request is {len} bytes, limit is {max}")
            }
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
