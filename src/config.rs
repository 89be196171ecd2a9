use std::fmt;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::constants::{DEFAULT_HOST, DEFAULT_LOG_FILE, STREAM_PATH};

#[derive(Parser, Debug)]
#[command(name = "mem_watch")]
#[command(about = "Live memory usage chart for a profiler stream")]
#[command(version)]
pub struct Cli {
    /// Host (and port) of the profiler server
    #[arg(default_value = DEFAULT_HOST)]
    pub host: String,

    /// Where diagnostics are written while the chart owns the terminal
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("expected a bare host like `localhost:3000`, got `{0}`")]
    NotBareHost(String),
}

/// `ws://<host>/ws` for a plain (non-TLS) profiler server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn from_host(host: &str) -> Result<Self, ConfigError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if host.contains("://") || host.contains('/') || host.chars().any(char::is_whitespace) {
            return Err(ConfigError::NotBareHost(host.to_string()));
        }
        Ok(Endpoint(format!("ws://{host}{STREAM_PATH}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: Endpoint,
    pub log_file: PathBuf,
}

impl TryFrom<Cli> for Config {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        Ok(Config {
            endpoint: Endpoint::from_host(&cli.host)?,
            log_file: cli.log_file,
        })
    }
}
