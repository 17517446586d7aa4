//! CLI error types
//!
//! Everything surfaced here is fatal: the process reports it on stderr and
//! exits 1.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::rotation::RotationError;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Fatal CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rotation(#[from] RotationError),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),
}
