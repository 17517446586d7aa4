//! gzspool CLI entry point
//!
//! A minimal entrypoint: argument parsing, configuration, and the pipeline
//! all live in the cli module; main only reports the error and sets the
//! exit code.

use gzspool::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
