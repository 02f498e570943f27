//! convert command - flatten objects into data forms

use anyhow::{Context as _, Result};
use std::path::Path;

use crate::core::layout::FormLayout;
use crate::engine::materialize::GenericMaterializer;
use crate::engine::runner::Runner;
use crate::store::{self, WorkDirs};
use crate::ui::output::{self, Verbosity};

use super::{load_catalog, report_failures};

/// Convert a batch of objects into forms plus a manifest.
pub fn convert(
    input: &Path,
    out: &Path,
    templates: &Path,
    layout: &FormLayout,
    verbosity: Verbosity,
) -> Result<()> {
    let catalog = load_catalog(templates)?;
    let objects = store::load_objects(input)
        .with_context(|| format!("failed to load objects from `{}`", input.display()))?;

    let dirs = WorkDirs::new(out);
    dirs.ensure()?;
    store::copy_inputs(&dirs, &objects)?;

    let runner = Runner::new(&catalog, layout, GenericMaterializer, verbosity);
    let outcome = runner.convert_batch(&objects);

    store::write_forms(&dirs, &outcome.forms)?;
    store::write_manifest(&dirs, &outcome.manifest)?;

    report_failures(&outcome.report, verbosity);
    output::print(outcome.report.summary(), verbosity);
    output::print(
        format!(
            "wrote {} to {}",
            output::format_count(outcome.forms.len(), "form"),
            dirs.data_forms().display()
        ),
        verbosity,
    );
    Ok(())
}
