//! Block-header mini-language
//!
//! Compiles a textual field-format specification (e.g.
//! `<u32:sec><u32:usec><u32:length><u32>` for pcap records) into an immutable
//! descriptor, and scans byte windows for validated record boundaries so the
//! rotation engine never tears a record across files.

pub mod errors;
pub mod format;
pub mod scanner;

pub use errors::{FormatError, FormatResult};
pub use format::{BlockFormat, ByteOrder, FieldKind, HeaderField};
