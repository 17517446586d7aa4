//! Shared helpers for integration tests: config construction, output
//! discovery, and gzip verification against a real filesystem.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use gzspool::config::Config;

/// A config pointing at `<dir>/output` with test-friendly defaults.
pub fn test_config(dir: &Path) -> Config {
    Config {
        file_prefix: dir.join("output").to_string_lossy().into_owned(),
        max_file_size: 100 * 1024,
        max_num_files: 100,
        time_format: "%Y%m%d%H%M%S".to_string(),
        use_local_time: false,
        header_bytes: 0,
        block_format: None,
        max_block_size: 4096,
        read_buffer_size: 8192,
        compression_level: 6,
        resume_existing: false,
        quiet: true,
    }
}

/// Output files in the directory, sorted by filename; zero-padded counters
/// make that counter order.
pub fn sorted_outputs(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "gz"))
        .collect();
    files.sort();
    files
}

/// Decompresses one output file.
pub fn decompress(path: &Path) -> Vec<u8> {
    let mut decoder = GzDecoder::new(File::open(path).unwrap());
    let mut payload = Vec::new();
    decoder.read_to_end(&mut payload).unwrap();
    payload
}

/// Concatenates all files' payloads in counter order, stripping
/// `replayed_header` bytes from every file after the first.
pub fn reassemble(dir: &Path, replayed_header: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    for (i, path) in sorted_outputs(dir).iter().enumerate() {
        let payload = decompress(path);
        let skip = if i == 0 { 0 } else { replayed_header };
        stream.extend_from_slice(&payload[skip..]);
    }
    stream
}

/// Deterministic incompressible payload.
pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}
