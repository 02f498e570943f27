//! reconstitute command - rebuild objects from forms and a manifest

use anyhow::{Context as _, Result};
use std::path::Path;

use crate::core::layout::FormLayout;
use crate::engine::materialize::GenericMaterializer;
use crate::engine::runner::Runner;
use crate::store::{self, WorkDirs};
use crate::ui::output::{self, Verbosity};

use super::{load_catalog, report_failures};

/// Rebuild objects from a working directory produced by `convert`.
pub fn reconstitute(
    workdir: &Path,
    templates: &Path,
    layout: &FormLayout,
    verbosity: Verbosity,
) -> Result<()> {
    let catalog = load_catalog(templates)?;
    let dirs = WorkDirs::new(workdir);
    dirs.ensure()?;
    let manifest = store::read_manifest(&dirs)
        .with_context(|| format!("failed to read manifest in `{}`", workdir.display()))?;
    let forms = store::read_forms(&dirs, &manifest)?;

    let runner = Runner::new(&catalog, layout, GenericMaterializer, verbosity);
    let outcome = runner
        .reconstitute_batch(&manifest, &forms)
        .context("manifest is not usable")?;

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
