//! Configuration error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read bridge config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write bridge config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed bridge config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot encode bridge config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An `EXTBRIDGE_*` override that does not parse
    #[error("Environment override {var} is invalid: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    #[error("Inconsistent bridge config: {0}")]
    Invalid(String),
}
