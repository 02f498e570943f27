//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--layout <file>`: Use a non-default form layout

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reweave - flatten and reconstitute cross-referenced object batches
#[derive(Parser, Debug)]
#[command(name = "rw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Form layout TOML file (defaults to the built-in layout)
    #[arg(long, global = true, value_name = "FILE")]
    pub layout: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a batch of objects into data forms plus a manifest
    Convert {
        /// Input file or directory of JSON objects
        input: PathBuf,

        /// Working directory to write forms and the manifest into
        #[arg(long, value_name = "DIR")]
        out: PathBuf,

        /// Directory of per-kind template documents
        #[arg(long, value_name = "DIR")]
        templates: PathBuf,
    },

    /// Rebuild objects from a working directory's forms and manifest
    Reconstitute {
        /// Working directory produced by `convert`
        workdir: PathBuf,

        /// Directory of per-kind template documents
        #[arg(long, value_name = "DIR")]
        templates: PathBuf,
    },

    /// Convert and immediately reconstitute in one run
    Roundtrip {
        /// Input file or directory of JSON objects
        input: PathBuf,

        /// Working directory for forms, manifest, and outputs
        #[arg(long, value_name = "DIR")]
        workdir: PathBuf,

        /// Directory of per-kind template documents
        #[arg(long, value_name = "DIR")]
        templates: PathBuf,
    },
}
