//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the template catalog and form layout
//! 2. Calls the engine to run the batch
//! 3. Writes exchange files through the store and prints the summary
//!
//! Handlers exit zero even when individual objects fail; per-object
//! failures are reported, not fatal.

mod convert;
mod reconstitute;
mod roundtrip;

pub use convert::convert;
pub use reconstitute::reconstitute;
pub use roundtrip::roundtrip;

use anyhow::{Context as _, Result};
use std::path::Path;

use crate::core::layout::FormLayout;
use crate::core::template::TemplateCatalog;
use crate::ui::output::{self, Verbosity};

use super::args::Command;

/// Dispatch a parsed command.
pub fn dispatch(command: Command, layout: &FormLayout, verbosity: Verbosity) -> Result<()> {
    match command {
        Command::Convert {
            input,
            out,
            templates,
        } => convert(&input, &out, &templates, layout, verbosity),
        Command::Reconstitute { workdir, templates } => {
            reconstitute(&workdir, &templates, layout, verbosity)
        }
        Command::Roundtrip {
            input,
            workdir,
            templates,
        } => roundtrip(&input, &workdir, &templates, layout, verbosity),
    }
}

/// Load the template catalog every command needs.
pub(crate) fn load_catalog(templates: &Path) -> Result<TemplateCatalog> {
    let catalog = TemplateCatalog::load_dir(templates)
        .with_context(|| format!("failed to load templates from `{}`", templates.display()))?;
    anyhow::ensure!(
        !catalog.is_empty(),
        "no templates found in `{}`",
        templates.display()
    );
    Ok(catalog)
}

/// Print the failures a report carries.
pub(crate) fn report_failures(
    report: &crate::engine::report::BatchReport,
    verbosity: Verbosity,
) {
    for failure in &report.failures {
        output::warn(
            format!("{}: {}", failure.object, failure.reason),
            verbosity,
        );
    }
}
