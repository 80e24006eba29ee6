//! Common error types for requencer

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for requencer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across requencer crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be read
    #[error("Failed to read config file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
