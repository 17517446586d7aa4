//! Block-header format errors
//!
//! All format errors are configuration errors: they are reported before any
//! stream processing begins and never occur mid-stream.

use thiserror::Error;

/// Result type for block-header format operations
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors produced while compiling a block-header format string
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("no recognizable fields in block header format: {0:?}")]
    NoFields(String),

    #[error("invalid field width: {0} (must be 8, 16, 32 or 64)")]
    InvalidWidth(String),

    #[error("unknown field type: {0:?}")]
    UnknownType(String),

    #[error("invalid magic number literal: {0:?}")]
    InvalidMagic(String),

    #[error("more than one length field in block header format")]
    DuplicateLength,
}
