//! Rotation engine errors
//!
//! Only file *creation* failures are fatal: losing the ability to open the
//! next output file means the stream has nowhere to go. Per-chunk write,
//! flush and stat failures are logged by the engine and streaming continues.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for rotation operations
pub type RotationResult<T> = Result<T, RotationError>;

/// Fatal rotation errors
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("failed to create output file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write captured header to {path}: {source}")]
    WriteHeader {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
