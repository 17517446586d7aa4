//! Output filename generation and resume directory scan
//!
//! Filenames follow `{base}_{counter:06}_{timestamp}{ext}.gz`, where base and
//! ext come from splitting the configured prefix at its final path extension.
//! Resume reconstructs rotation state purely by matching that pattern against
//! the output directory; no other state is persisted.

use std::collections::VecDeque;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use regex::Regex;
use tracing::warn;

/// Rotation state reconstructed from filenames already on disk
#[derive(Debug, Default)]
pub struct ResumedState {
    /// Surviving files within the retention limit, oldest first
    pub active_files: VecDeque<PathBuf>,
    /// One past the highest surviving counter; 0 when nothing matched
    pub next_counter: u64,
}

/// Splits a prefix into (base, extension) at the final extension of its last
/// path component. The extension includes the leading dot, or is empty.
pub fn split_prefix(prefix: &str) -> (&str, &str) {
    let component_start = prefix
        .rfind(std::path::MAIN_SEPARATOR)
        .map(|i| i + 1)
        .unwrap_or(0);
    match prefix[component_start..].rfind('.') {
        Some(dot) => prefix.split_at(component_start + dot),
        None => (prefix, ""),
    }
}

/// Generates the next output filename for the given counter.
///
/// The timestamp is rendered with the configured strftime layout, in local
/// time or UTC; the layout was validated at configuration time.
pub fn generate(prefix: &str, counter: u64, time_format: &str, use_local_time: bool) -> PathBuf {
    let timestamp = if use_local_time {
        Local::now().format(time_format).to_string()
    } else {
        Utc::now().format(time_format).to_string()
    };

    let (base, ext) = split_prefix(prefix);
    PathBuf::from(format!("{base}_{counter:06}_{timestamp}{ext}.gz"))
}

/// Scans the prefix directory for files produced by an earlier run.
///
/// Matching files are sorted by their embedded counter; files beyond the
/// retention limit are deleted, smallest counters first. Scan and deletion
/// failures are logged and never fatal: resume is best-effort and a missing
/// directory simply means there is nothing to adopt.
pub fn scan_existing(prefix: &str, max_num_files: usize) -> ResumedState {
    let (base, ext) = split_prefix(prefix);

    let dir = Path::new(prefix)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let base_name = Path::new(base)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| base.to_string());

    let pattern = format!(
        r"^{}_(\d{{6}})_.*{}\.gz$",
        regex::escape(&base_name),
        regex::escape(ext)
    );
    let matcher = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(error = %e, "failed to compile resume pattern");
            return ResumedState::default();
        }
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return ResumedState::default(),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to read output directory");
            return ResumedState::default();
        }
    };

    let mut matched: Vec<(u64, PathBuf)> = Vec::new();
    for entry in entries.flatten() {
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let Some(caps) = matcher.captures(&name) else {
            continue;
        };
        let Ok(counter) = caps[1].parse::<u64>() else {
            continue;
        };
        matched.push((counter, dir.join(name.as_ref())));
    }

    matched.sort_by_key(|(counter, _)| *counter);

    // Enforce retention on the survivors of the previous run.
    if matched.len() > max_num_files {
        let excess = matched.len() - max_num_files;
        for (_, path) in matched.drain(..excess) {
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != ErrorKind::NotFound {
                    warn!(file = %path.display(), error = %e, "failed to delete excess file");
                }
            }
        }
    }

    let next_counter = matched.last().map(|(c, _)| c + 1).unwrap_or(0);

    ResumedState {
        active_files: matched.into_iter().map(|(_, path)| path).collect(),
        next_counter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_prefix_with_extension() {
        assert_eq!(split_prefix("capture.pcap"), ("capture", ".pcap"));
        assert_eq!(split_prefix("out/logs.txt"), ("out/logs", ".txt"));
    }

    #[test]
    fn splits_prefix_without_extension() {
        assert_eq!(split_prefix("output"), ("output", ""));
        assert_eq!(split_prefix("some.dir/output"), ("some.dir/output", ""));
    }

    #[test]
    fn generated_name_embeds_counter_and_extension() {
        let name = generate("capture.pcap", 42, "%Y%m%d", false);
        let name = name.to_string_lossy();
        assert!(name.starts_with("capture_000042_"), "got {name}");
        assert!(name.ends_with(".pcap.gz"), "got {name}");
    }

    #[test]
    fn generated_name_without_extension() {
        let name = generate("output", 0, "%Y%m%d", false);
        let name = name.to_string_lossy();
        assert!(name.starts_with("output_000000_"), "got {name}");
        assert!(name.ends_with(".gz"), "got {name}");
        assert!(!name.contains(".pcap"));
    }

    #[test]
    fn counter_widens_past_six_digits() {
        let name = generate("output", 1_000_000, "%Y%m%d", false);
        assert!(name.to_string_lossy().contains("_1000000_"));
    }

    #[test]
    fn scan_of_missing_directory_is_empty() {
        let state = scan_existing("no-such-dir/output", 5);
        assert!(state.active_files.is_empty());
        assert_eq!(state.next_counter, 0);
    }
}
