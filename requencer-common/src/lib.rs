//! # Requencer Common Library
//!
//! Shared code for the requencer crates:
//! - Error type for configuration and file handling
//! - Configuration file resolution and TOML loading
//! - Human-readable duration formatting for log output

pub mod config;
pub mod error;
pub mod human_time;

pub use error::{Error, Result};
