//! CLI entry: argument parsing, configuration, and pipeline startup
//!
//! Configuration is fully validated before any file is touched; no partial
//! output exists after a configuration failure. All diagnostics go to
//! stderr, leaving stdin as the sole data channel.

pub mod args;
pub mod errors;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::block::{BlockFormat, ByteOrder};
use crate::config::{Config, ConfigResult};
use crate::pipeline;
use crate::rotation::RotationEngine;
use crate::shutdown::{self, ShutdownHandle};

pub use args::{Args, Endianness};
pub use errors::{CliError, CliResult};

/// Parses arguments, validates configuration, and runs the pipeline to
/// completion.
///
/// # Errors
///
/// Returns a `CliError` on configuration failure or an unrecoverable setup
/// I/O error; the caller exits 1.
pub fn run() -> CliResult<()> {
    let args = Args::parse_args();

    let config = Arc::new(build_config(args)?);
    init_logging(config.quiet);

    if let Some(format) = &config.block_format {
        info!(
            header_bytes = format.total_bytes(),
            fields = format.fields().len(),
            byte_order = ?format.byte_order(),
            "block header format compiled"
        );
    }

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    runtime.block_on(async {
        let mut engine = RotationEngine::new(Arc::clone(&config));
        if config.resume_existing {
            engine.resume();
        }

        let handle = ShutdownHandle::new();
        shutdown::spawn_signal_listener(handle.clone());

        pipeline::run(
            tokio::io::stdin(),
            engine,
            config.read_buffer_size,
            handle,
        )
        .await
    })?;

    info!("shutdown complete");
    Ok(())
}

/// Builds and validates the immutable runtime configuration.
fn build_config(args: Args) -> ConfigResult<Config> {
    let byte_order = match args.endianness {
        Endianness::Little => ByteOrder::Little,
        Endianness::Big => ByteOrder::Big,
    };

    let block_format = args
        .block_header
        .as_deref()
        .map(|spec| BlockFormat::parse(spec, byte_order))
        .transpose()?;

    let config = Config {
        file_prefix: args.file_prefix,
        max_file_size: args.file_size * 1024,
        max_num_files: args.num_files,
        time_format: args.time_format,
        use_local_time: args.local_time,
        header_bytes: args.header_bytes,
        block_format,
        max_block_size: args.max_block_size,
        read_buffer_size: args.read_buffer_size,
        compression_level: args.compression_level,
        resume_existing: args.resume_existing,
        quiet: args.quiet,
    };
    config.validate()?;

    Ok(config)
}

/// Initializes stderr logging; `--quiet` keeps errors only.
fn init_logging(quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec![
            "gzspool",
            "--file-size",
            "100",
            "--num-files",
            "3",
            "--file-prefix",
            "output",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn builds_config_from_minimal_args() {
        let config = build_config(parse(&[])).unwrap();
        assert_eq!(config.max_file_size, 100 * 1024);
        assert_eq!(config.max_num_files, 3);
        assert!(config.block_format.is_none());
    }

    #[test]
    fn rejects_invalid_block_header() {
        let args = parse(&["--block-header", "<u24:sec>"]);
        assert!(build_config(args).is_err());
    }

    #[test]
    fn compiles_block_header_with_endianness() {
        let args = parse(&[
            "--block-header",
            "<u16:length>",
            "--endianness",
            "big",
            "--max-block-size",
            "4096",
            "--read-buffer-size",
            "8192",
        ]);
        let config = build_config(args).unwrap();
        let format = config.block_format.unwrap();
        assert_eq!(format.byte_order(), ByteOrder::Big);
        assert_eq!(format.total_bytes(), 2);
    }

    #[test]
    fn quiet_flag_reaches_config() {
        assert!(build_config(parse(&["--quiet"])).unwrap().quiet);
        assert!(!build_config(parse(&[])).unwrap().quiet);
    }

    #[test]
    fn rejects_scan_window_exceeding_read_buffer() {
        let args = parse(&["--max-block-size", "999999999"]);
        assert!(build_config(args).is_err());
    }
}
