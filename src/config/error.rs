//! Errors raised while reading `DALGURAK_*` settings.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// `DALGURAK_PORT` parsed but is zero.
    #[error("DALGURAK_PORT '{value}' is out of range (1-65535)")]
    InvalidPort { value: String },

    #[error("DALGURAK_PORT '{value}' is not a port number: {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("DALGURAK_BIND_ADDR '{value}' is not an IP address: {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A setting that failed to parse or fell outside its range.
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("corpus path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    #[error("corpus path is not a file: {path}")]
    NotAFile { path: PathBuf },
}
