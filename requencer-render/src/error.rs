//! Error types for requencer-render
//!
//! Every failure aborts the render. Variants follow the render error taxonomy:
//! descriptor validation, clip format, I/O, and encoder failures.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the rendering engine
#[derive(Error, Debug)]
pub enum RenderError {
    /// Malformed or incomplete clip descriptor
    #[error("Invalid clip descriptor{}: '{field}' {problem}", describe_index(.index))]
    Validation {
        /// Position of the descriptor in the input list, if known
        index: Option<usize>,
        /// Offending field name
        field: String,
        /// What is wrong with it
        problem: String,
    },

    /// Clip file failed container or audio-format validation
    #[error("Bad audio format in '{}': {constraint}", .path.display())]
    Format { path: PathBuf, constraint: String },

    /// File open/read/write failure
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File contained fewer bytes than its header declares
    #[error("Short read from '{}': expected {expected} bytes, got {actual}", .path.display())]
    ShortRead {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// Output sink accepted fewer bytes than were encoded
    #[error("Short write to output: {written} of {expected} bytes written")]
    ShortWrite { expected: usize, written: usize },

    /// Output sink write failure
    #[error("Output write error: {0}")]
    Sink(#[from] std::io::Error),

    /// Encoder rejected input or failed to flush
    #[error("Encoder error: {0}")]
    Encode(String),

    /// Mix buffer too large to allocate
    #[error("Cannot allocate a mix buffer of {samples} samples")]
    Allocation { samples: usize },

    /// Invalid render configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Broken internal invariant
    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" at index {}", i),
        None => String::new(),
    }
}

/// Broad error category, used by callers that only care about the class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Format,
    Io,
    Encode,
    Config,
    Internal,
}

impl RenderError {
    /// Shorthand for a validation failure on one descriptor field
    pub fn validation(index: Option<usize>, field: &str, problem: impl Into<String>) -> Self {
        RenderError::Validation {
            index,
            field: field.to_string(),
            problem: problem.into(),
        }
    }

    /// Shorthand for a format failure on one clip file
    pub fn format(path: impl Into<PathBuf>, constraint: impl Into<String>) -> Self {
        RenderError::Format {
            path: path.into(),
            constraint: constraint.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RenderError::Validation { .. } => ErrorKind::Validation,
            RenderError::Format { .. } => ErrorKind::Format,
            RenderError::Io { .. }
            | RenderError::ShortRead { .. }
            | RenderError::ShortWrite { .. }
            | RenderError::Sink(_) => ErrorKind::Io,
            RenderError::Encode(_) => ErrorKind::Encode,
            RenderError::Config(_) => ErrorKind::Config,
            RenderError::Allocation { .. } | RenderError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<requencer_common::Error> for RenderError {
    fn from(err: requencer_common::Error) -> Self {
        match err {
            requencer_common::Error::ConfigRead { path, source } => RenderError::Io { path, source },
            requencer_common::Error::Config(msg) => RenderError::Config(msg),
        }
    }
}

/// Convenience Result type using RenderError
pub type Result<T> = std::result::Result<T, RenderError>;
