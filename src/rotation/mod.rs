//! Boundary-aware rotation engine
//!
//! Owns the current output file and gzip encoder, decides when and where to
//! cut the stream, and manages retention and startup resume. Rotation
//! thresholds compare *compressed* bytes on disk (flush + stat per chunk),
//! not logical input volume: compression ratio varies, and the guarantee is
//! about output footprint.
//!
//! The engine is single-threaded by contract. It is driven only by the
//! pipeline's processor task, which serializes all access; no internal
//! locking exists or is needed.

pub mod errors;
pub mod filename;

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, error, info, warn};

use crate::block::{scanner, BlockFormat};
use crate::config::Config;

pub use errors::{RotationError, RotationResult};

/// The currently open output file wrapped in its gzip encoder
struct OpenFile {
    path: PathBuf,
    encoder: GzEncoder<File>,
}

/// Rotation engine state; exactly one open file at a time, or none
pub struct RotationEngine {
    config: Arc<Config>,
    format: Option<BlockFormat>,
    /// Bytes captured once from the stream start, replayed into every file
    /// after the first
    header: Vec<u8>,
    header_captured: bool,
    /// Open output files, oldest first; never longer than `max_num_files`
    active_files: VecDeque<PathBuf>,
    /// Counter embedded in the next filename; strictly increasing, never
    /// reused
    file_counter: u64,
    current: Option<OpenFile>,
    /// Not-yet-committed bytes while searching for a cut point; empty
    /// outside boundary search
    pending: Vec<u8>,
    /// First unscanned candidate offset within `pending`
    pending_scan_pos: usize,
    /// First validated header in `pending` whose payload is still arriving
    pending_candidate: Option<(usize, usize)>,
}

impl RotationEngine {
    /// Creates an engine with no open file.
    pub fn new(config: Arc<Config>) -> Self {
        let format = config.block_format.clone();
        Self {
            config,
            format,
            header: Vec::new(),
            header_captured: false,
            active_files: VecDeque::new(),
            file_counter: 0,
            current: None,
            pending: Vec::new(),
            pending_scan_pos: 0,
            pending_candidate: None,
        }
    }

    /// Adopts files from an earlier run that match the naming pattern.
    ///
    /// Files beyond the retention limit are deleted (smallest counters
    /// first); the counter resumes one past the highest survivor.
    pub fn resume(&mut self) {
        let resumed =
            filename::scan_existing(&self.config.file_prefix, self.config.max_num_files);
        if resumed.active_files.is_empty() {
            return;
        }

        info!(
            files = resumed.active_files.len(),
            next_counter = resumed.next_counter,
            "resuming with existing files"
        );
        self.active_files = resumed.active_files;
        self.file_counter = resumed.next_counter;
    }

    /// Opens the next output file, evicting the oldest if the retention
    /// limit is reached, and replays the captured header into it.
    ///
    /// # Errors
    ///
    /// File creation and header-replay failures are fatal; the stream would
    /// have nowhere to go.
    pub fn open_file(&mut self) -> RotationResult<()> {
        if self.active_files.len() >= self.config.max_num_files {
            if let Some(oldest) = self.active_files.pop_front() {
                match fs::remove_file(&oldest) {
                    Ok(()) => info!(file = %oldest.display(), "deleted oldest file"),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!(file = %oldest.display(), error = %e, "failed to delete oldest file");
                    }
                }
            }
        }

        let path = filename::generate(
            &self.config.file_prefix,
            self.file_counter,
            &self.config.time_format,
            self.config.use_local_time,
        );

        let file = File::create(&path).map_err(|e| RotationError::CreateFile {
            path: path.clone(),
            source: e,
        })?;
        let mut encoder = GzEncoder::new(file, Compression::new(self.config.compression_level));

        info!(
            file = %path.display(),
            counter = self.file_counter,
            level = self.config.compression_level,
            "created new output file"
        );

        // The first file receives the header bytes naturally as part of the
        // live stream; capture happens on the first chunk, after that file
        // is already open, so this replays into every later file only.
        if self.header_captured && !self.header.is_empty() {
            encoder
                .write_all(&self.header)
                .map_err(|e| RotationError::WriteHeader {
                    path: path.clone(),
                    source: e,
                })?;
            debug!(bytes = self.header.len(), "replayed captured header");
        }

        self.file_counter += 1;
        self.active_files.push_back(path.clone());
        self.current = Some(OpenFile { path, encoder });

        Ok(())
    }

    /// Finishes the gzip stream and closes the current file. Idempotent.
    pub fn close_file(&mut self) {
        let Some(open) = self.current.take() else {
            return;
        };
        if let Err(e) = open.encoder.finish() {
            error!(file = %open.path.display(), error = %e, "failed to finish gzip stream");
        }
    }

    /// Writes one chunk, rotating as needed.
    ///
    /// Write, flush and stat failures are logged and streaming continues;
    /// only opening the next file can fail fatally.
    pub fn write_chunk(&mut self, data: &[u8]) -> RotationResult<()> {
        self.capture_header(data);

        // An in-progress boundary search consumes every chunk until a cut
        // is found or the scan window overflows.
        if !self.pending.is_empty() {
            self.pending.extend_from_slice(data);
            return self.try_cut();
        }

        let over_limit = self
            .flush_and_stat()
            .is_some_and(|size| size >= self.config.max_file_size);

        if over_limit {
            if self.format.is_some() {
                self.pending.extend_from_slice(data);
                self.pending_scan_pos = 0;
                self.pending_candidate = None;
                return self.try_cut();
            }
            // No block format: cut immediately at the start of this chunk.
            self.close_file();
            self.open_file()?;
        }

        self.write_to_current(data);
        Ok(())
    }

    /// Flushes any pending bytes into the current file and closes it.
    pub fn close(&mut self) {
        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            debug!(bytes = pending.len(), "flushing pending bytes before close");
            self.write_to_current(&pending);
            self.pending_scan_pos = 0;
            self.pending_candidate = None;
        }
        self.close_file();
    }

    /// Output files currently within retention, oldest first
    pub fn active_files(&self) -> &VecDeque<PathBuf> {
        &self.active_files
    }

    /// Counter that will be embedded in the next filename
    pub fn next_counter(&self) -> u64 {
        self.file_counter
    }

    /// Captures the first `header_bytes` bytes of the stream, once.
    fn capture_header(&mut self, data: &[u8]) {
        if self.header_captured || self.config.header_bytes == 0 {
            return;
        }

        let take = self.config.header_bytes.min(data.len());
        if take < self.config.header_bytes {
            error!(
                needed = self.config.header_bytes,
                got = data.len(),
                "insufficient data to capture full header"
            );
        }
        self.header = data[..take].to_vec();
        self.header_captured = true;
        info!(bytes = take, "captured header bytes from stream");
    }

    /// Advances the boundary search over the pending buffer and rotates if a
    /// usable cut point (or the forced-rotation fallback) is reached.
    fn try_cut(&mut self) -> RotationResult<()> {
        let Some(format) = self.format.as_ref() else {
            return Ok(());
        };
        let total_bytes = format.total_bytes();

        // Scan new candidate offsets only; earlier offsets already failed.
        if self.pending_candidate.is_none() && self.pending.len() >= total_bytes {
            let now = Utc::now().timestamp();
            match scanner::find_boundary(
                &self.pending[self.pending_scan_pos..],
                format,
                self.config.max_block_size,
                now,
            ) {
                Some((offset, payload_len)) => {
                    self.pending_scan_pos += offset;
                    self.pending_candidate = Some((self.pending_scan_pos, payload_len));
                }
                // Nothing in the scanned window; resume right after it once
                // more bytes arrive.
                None => self.pending_scan_pos = self.pending.len() - total_bytes + 1,
            }
        }

        // A validated header inside another record's payload is noise, so
        // once a candidate is found the search waits for its payload rather
        // than trying later offsets.
        if let Some((offset, payload_len)) = self.pending_candidate {
            let cut = offset + total_bytes + payload_len;
            if cut <= self.pending.len() {
                let pending = std::mem::take(&mut self.pending);
                self.pending_scan_pos = 0;
                self.pending_candidate = None;

                self.write_to_current(&pending[..cut]);
                self.close_file();
                self.open_file()?;
                self.write_to_current(&pending[cut..]);
                return Ok(());
            }
        }

        // Bounded lookahead: give up and split mid-record rather than let
        // the pending buffer grow without limit.
        if self.pending.len() > self.config.max_block_size + total_bytes {
            warn!(
                buffered = self.pending.len(),
                "no usable block boundary within scan window; forcing rotation"
            );
            let pending = std::mem::take(&mut self.pending);
            self.pending_scan_pos = 0;
            self.pending_candidate = None;

            self.write_to_current(&pending);
            self.close_file();
            self.open_file()?;
        }

        Ok(())
    }

    /// Flushes the encoder and returns the file's on-disk size.
    /// Failures are logged; `None` skips the rotation check for this chunk.
    fn flush_and_stat(&mut self) -> Option<u64> {
        let open = self.current.as_mut()?;

        if let Err(e) = open.encoder.flush() {
            error!(file = %open.path.display(), error = %e, "failed to flush gzip stream");
            return None;
        }

        match open.encoder.get_ref().metadata() {
            Ok(meta) => Some(meta.len()),
            Err(e) => {
                error!(file = %open.path.display(), error = %e, "failed to stat output file");
                None
            }
        }
    }

    /// Best-effort write to the current file; errors are logged and the
    /// stream keeps going.
    fn write_to_current(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let Some(open) = self.current.as_mut() else {
            error!(bytes = data.len(), "dropping bytes: no open output file");
            return;
        };
        if let Err(e) = open.encoder.write_all(data) {
            error!(file = %open.path.display(), error = %e, "failed to write to gzip stream");
        }
    }
}
