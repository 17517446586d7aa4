//! gzspool - stream stdin into rotating, size-bounded gzip files
//!
//! Reads an unbounded byte stream, compresses it, and persists it as a
//! retention-limited series of files, optionally cutting only at validated
//! record boundaries so structured records are never torn across files.

pub mod block;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod rotation;
pub mod shutdown;
