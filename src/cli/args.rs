//! Command-line argument definitions using clap

use clap::{Parser, ValueEnum};

const AFTER_HELP: &str = "\
Filename format:
  prefix_NNNNNN_TIMESTAMP[.ext].gz
  where NNNNNN is a zero-padded counter and .ext is the prefix's original
  extension, if any.

Block header format:
  Describes block/packet boundaries so rotation never splits mid-block.
  A concatenation of <uN:type> or <sN:type> tokens, N in {8, 16, 32, 64}.
  Types:
    sec     Unix timestamp seconds (accepted within +/-48 hours of now)
    usec    microseconds (0-999999)
    nsec    nanoseconds (0-999999999)
    length  block payload length in bytes (bounded by --max-block-size)
    0xHEX   magic number, exact match required
    (none)  any value is accepted
  Multi-byte fields follow --endianness; 8-bit fields are order-independent.
  Example for pcap: '<u32:sec><u32:usec><u32:length><u32>'
  Example with magic: '<u8:0xAA><u8:0xBB><u16:length><u32>'

Examples:
  cat data.bin | gzspool --file-size 10240 --num-files 5 --file-prefix output
  cat video.mp4 | gzspool --file-size 102400 --num-files 5 \\
      --file-prefix video.mp4 --header-bytes 1024 --compression-level 1
  tcpdump -w - | gzspool --file-size 102400 --num-files 10 \\
      --file-prefix capture.pcap --block-header '<u32:sec><u32:usec><u32:length><u32>'";

/// Stream stdin to rotating gzip-compressed files.
///
/// Reads binary data from stdin, compresses it with gzip, and writes it to a
/// series of rotating files. When a file reaches the configured on-disk size
/// it is closed and a new one starts. At most --num-files files are kept;
/// the oldest is deleted to make room.
#[derive(Parser, Debug)]
#[command(name = "gzspool", version, about, after_help = AFTER_HELP)]
pub struct Args {
    /// Maximum size per file in kilobytes (compressed, on disk)
    #[arg(long)]
    pub file_size: u64,

    /// Maximum number of files to keep
    #[arg(long)]
    pub num_files: usize,

    /// Prefix for output files
    #[arg(long)]
    pub file_prefix: String,

    /// strftime layout for filename timestamps
    #[arg(long, default_value = "%Y-%m-%dT%H:%M:%S%.3fZ")]
    pub time_format: String,

    /// Use local time instead of UTC for timestamps
    #[arg(long)]
    pub local_time: bool,

    /// Bytes from the stream start to replay at the head of each file after
    /// the first (0 disables)
    #[arg(long, default_value_t = 0)]
    pub header_bytes: usize,

    /// Block header format for boundary detection
    /// (e.g. '<u32:sec><u32:usec><u32:length><u32>')
    #[arg(long)]
    pub block_header: Option<String>,

    /// Maximum block size in bytes when scanning for boundaries
    #[arg(long, default_value_t = 262_144)]
    pub max_block_size: usize,

    /// Read buffer size in bytes
    #[arg(long, default_value_t = 262_144)]
    pub read_buffer_size: usize,

    /// Gzip compression level: 0 (none) through 9 (best compression)
    #[arg(long, default_value_t = 6)]
    pub compression_level: u32,

    /// Byte order for multi-byte header fields
    #[arg(long, value_enum, default_value = "little")]
    pub endianness: Endianness,

    /// Resume with existing files (WARNING: may delete matching files if
    /// their count exceeds --num-files)
    #[arg(long)]
    pub resume_existing: bool,

    /// Suppress non-error output
    #[arg(long)]
    pub quiet: bool,
}

/// Byte order flag values
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }
}
