//! roundtrip command - convert and reconstitute in one run

use anyhow::{Context as _, Result};
use std::path::Path;

use crate::core::layout::FormLayout;
use crate::engine::materialize::GenericMaterializer;
use crate::engine::runner::Runner;
use crate::store::{self, WorkDirs};
use crate::ui::output::{self, Verbosity};

use super::{load_catalog, report_failures};

/// Convert a batch and immediately reconstitute it.
pub fn roundtrip(
    input: &Path,
    workdir: &Path,
    templates: &Path,
    layout: &FormLayout,
    verbosity: Verbosity,
) -> Result<()> {
    let catalog = load_catalog(templates)?;
    let objects = store::load_objects(input)
        .with_context(|| format!("failed to load objects from `{}`", input.display()))?;

    let dirs = WorkDirs::new(workdir);
    dirs.ensure()?;
    store::copy_inputs(&dirs, &objects)?;

    let runner = Runner::new(&catalog, layout, GenericMaterializer, verbosity);
    let outcome = runner
        .run_batch(&objects)
        .context("manifest is not usable")?;

    store::write_forms(&dirs, &outcome.forms)?;
    store::write_manifest(&dirs, &outcome.manifest)?;
    store::write_outputs(&dirs, &outcome.objects)?;

    report_failures(&outcome.report, verbosity);
    output::print(outcome.report.summary(), verbosity);
    output::print(
        format!(
            "wrote {} to {}",
            output::format_count(outcome.objects.len(), "object"),
            dirs.output_objects().display()
        ),
        verbosity,
    );
    Ok(())
}
