//! cli
//!
//! Command-line interface layer for Reweave.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT touch forms or objects directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! the [`crate::engine`] for execution. Per-object failures are reported
//! on the batch report and never turn into a non-zero exit.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use anyhow::{Context as _, Result};

use crate::core::layout::FormLayout;
use crate::ui::output::Verbosity;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);

    let layout = match &cli.layout {
        Some(path) => FormLayout::load(path)
            .with_context(|| format!("failed to load layout `{}`", path.display()))?,
        None => FormLayout::default(),
    };

    commands::dispatch(cli.command, &layout, verbosity)
}
