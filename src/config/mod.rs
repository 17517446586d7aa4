//! Runtime configuration
//!
//! All knobs are supplied once at startup and validated before any stream
//! processing begins; the resulting `Config` is immutable for the life of
//! the process. No partial output is ever produced on a configuration error.

use chrono::format::{Item, StrftimeItems};
use thiserror::Error;

use crate::block::{BlockFormat, FormatError};

/// Result type for configuration validation
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors; always fatal, reported before processing starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("invalid block header format: {0}")]
    Format(#[from] FormatError),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Validated, immutable runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Output filename prefix; an existing final extension is preserved
    /// before the `.gz` suffix
    pub file_prefix: String,
    /// Rotation threshold in compressed bytes on disk
    pub max_file_size: u64,
    /// Retention limit: at most this many output files are kept
    pub max_num_files: usize,
    /// strftime layout for the filename timestamp
    pub time_format: String,
    /// Render timestamps in local time instead of UTC
    pub use_local_time: bool,
    /// Bytes captured from the stream start and replayed into every file
    /// after the first; 0 disables header capture
    pub header_bytes: usize,
    /// Compiled block-header format for boundary-aware rotation, if any
    pub block_format: Option<BlockFormat>,
    /// Upper bound on a declared block payload, and on the boundary-search
    /// window
    pub max_block_size: usize,
    /// Size of read and processing chunks
    pub read_buffer_size: usize,
    /// Gzip effort level, 0 (store) through 9 (best)
    pub compression_level: u32,
    /// Adopt matching files already on disk at startup
    pub resume_existing: bool,
    /// Suppress non-error diagnostics
    pub quiet: bool,
}

impl Config {
    /// Validates cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first violated
    /// constraint.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.file_prefix.is_empty() {
            return Err(ConfigError::invalid("file prefix must not be empty"));
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::invalid("file size must be positive"));
        }
        if self.max_num_files == 0 {
            return Err(ConfigError::invalid("number of files must be positive"));
        }
        if self.read_buffer_size == 0 {
            return Err(ConfigError::invalid("read buffer size must be positive"));
        }
        if self.max_block_size == 0 {
            return Err(ConfigError::invalid("max block size must be positive"));
        }
        if self.compression_level > 9 {
            return Err(ConfigError::invalid(
                "compression level must be between 0 and 9",
            ));
        }
        if self.header_bytes > self.read_buffer_size {
            return Err(ConfigError::invalid(
                "read buffer size must be at least as large as header bytes",
            ));
        }
        if self.max_block_size > self.read_buffer_size {
            return Err(ConfigError::invalid(
                "read buffer size must be at least as large as max block size",
            ));
        }
        if self.time_format.is_empty() {
            return Err(ConfigError::invalid("time format must not be empty"));
        }
        if !time_format_is_valid(&self.time_format) {
            return Err(ConfigError::invalid(format!(
                "time format {:?} is not a valid strftime layout",
                self.time_format
            )));
        }

        Ok(())
    }
}

/// Checks a strftime layout without rendering it; chrono panics at render
/// time on unknown specifiers, so this must run before any file is named.
fn time_format_is_valid(layout: &str) -> bool {
    StrftimeItems::new(layout).all(|item| !matches!(item, Item::Error))
}
