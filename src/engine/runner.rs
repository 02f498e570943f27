//! engine::runner
//!
//! The batch orchestrator.
//!
//! # Architecture
//!
//! A batch moves through fixed stages:
//!
//! ```text
//! Loading -> FormBuilding -> GraphBuilding -> Sequencing
//!         -> Materializing(0..n) -> Done
//! ```
//!
//! Conversion covers the first four stages and yields forms plus a
//! manifest; reconstitution replays the manifest through the
//! materializing stages. Failures never abort a batch: a bad object is
//! recorded on the report and the stage machine moves on.
//!
//! # Invariants
//!
//! - Objects materialize strictly in creation-sequence order
//! - Each object's replacement identifier is minted (or adopted from the
//!   shared map) before its references are restored
//! - Identifier mappings are shared across the whole batch and never
//!   reassigned

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::core::form::DataForm;
use crate::core::layout::FormLayout;
use crate::core::template::TemplateCatalog;
use crate::core::types::ObjectId;
use crate::ui::output::{self, Verbosity};

use super::build;
use super::graph::DependencyGraph;
use super::manifest::{ExtractionRecord, Manifest, ManifestError};
use super::materialize::Materializer;
use super::remap::IdentifierMap;
use super::report::{BatchReport, Deferral, FailureReason, SkippedField};
use super::restore::Restorer;
use super::sequence::CreationSequence;

/// Where a batch currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    FormBuilding,
    GraphBuilding,
    Sequencing,
    /// Materializing the object at this sequence position.
    Materializing(usize),
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Loading => write!(f, "loading"),
            Stage::FormBuilding => write!(f, "form building"),
            Stage::GraphBuilding => write!(f, "graph building"),
            Stage::Sequencing => write!(f, "sequencing"),
            Stage::Materializing(i) => write!(f, "materializing #{}", i),
            Stage::Done => write!(f, "done"),
        }
    }
}

/// One converted object: its form and where it will live on disk.
#[derive(Debug, Clone)]
pub struct ConvertedForm {
    pub object_id: ObjectId,
    pub kind: String,
    pub form: DataForm,
    pub form_name: String,
    pub file_name: String,
}

/// Conversion results for one batch.
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    pub forms: Vec<ConvertedForm>,
    pub manifest: Manifest,
    pub report: BatchReport,
}

/// One reconstituted object under its replacement identifier.
#[derive(Debug, Clone)]
pub struct ReconstitutedObject {
    pub old_id: ObjectId,
    pub new_id: ObjectId,
    pub object: Value,
}

/// Reconstitution results for one batch.
#[derive(Debug, Clone)]
pub struct ReconstituteOutcome {
    pub objects: Vec<ReconstitutedObject>,
    pub report: BatchReport,
}

/// Full conversion-then-reconstitution results.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub forms: Vec<ConvertedForm>,
    pub manifest: Manifest,
    pub objects: Vec<ReconstitutedObject>,
    pub report: BatchReport,
}

/// Drives batches through the stage machine.
pub struct Runner<'a, M: Materializer> {
    catalog: &'a TemplateCatalog,
    layout: &'a FormLayout,
    materializer: M,
    verbosity: Verbosity,
}

impl<'a, M: Materializer> Runner<'a, M> {
    pub fn new(
        catalog: &'a TemplateCatalog,
        layout: &'a FormLayout,
        materializer: M,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            catalog,
            layout,
            materializer,
            verbosity,
        }
    }

    fn enter(&self, stage: Stage) {
        output::debug(format!("stage: {}", stage), self.verbosity);
    }

    /// Convert a batch of objects into forms plus a manifest.
    ///
    /// Never fails as a whole: objects without a usable identifier, with
    /// an unregistered kind, or that will not build are recorded on the
    /// report and excluded.
    pub fn convert_batch(&self, objects: &[Value]) -> ConvertOutcome {
        self.enter(Stage::Loading);
        let mut report = BatchReport {
            total: objects.len(),
            ..Default::default()
        };

        self.enter(Stage::FormBuilding);
        let mut forms = Vec::new();
        let mut records = Vec::new();
        let mut seen = BTreeSet::new();

        for (position, object) in objects.iter().enumerate() {
            let raw_id = object.get("id").and_then(Value::as_str).unwrap_or("");
            let Ok(object_id) = ObjectId::new(raw_id) else {
                report.fail(format!("#{}", position), FailureReason::MissingIdentifier);
                continue;
            };
            if !seen.insert(object_id.clone()) {
                report.fail(object_id.as_str(), FailureReason::DuplicateIdentifier);
                continue;
            }

            let kind = object_id.kind().to_string();
            let Some(template) = self.catalog.lookup(&kind) else {
                report.fail(
                    object_id.as_str(),
                    FailureReason::UnknownKind { kind },
                );
                continue;
            };

            match build::build(object, template, self.layout) {
                Ok(built) => {
                    records.push(ExtractionRecord {
                        object_id: object_id.clone(),
                        kind: kind.clone(),
                        filename: built.file_name.clone(),
                        form_name: built.form_name.clone(),
                        references: built.references.clone(),
                    });
                    forms.push(ConvertedForm {
                        object_id,
                        kind,
                        form: built.form,
                        form_name: built.form_name,
                        file_name: built.file_name,
                    });
                }
                Err(err) => {
                    report.fail(
                        object_id.as_str(),
                        FailureReason::Build {
                            message: err.to_string(),
                        },
                    );
                }
            }
        }
        report.succeeded = forms.len();

        self.enter(Stage::GraphBuilding);
        let graph = DependencyGraph::from_extractions(
            records.iter().map(|r| (&r.object_id, &r.references)),
        );

        self.enter(Stage::Sequencing);
        let sequence = CreationSequence::compute(&graph);
        for (object_id, depends_on) in sequence.deferrals() {
            report.deferrals.push(Deferral {
                object_id: object_id.clone(),
                depends_on: depends_on.clone(),
            });
        }

        output::debug(
            format!(
                "converted {} into {}",
                output::format_count(report.total, "object"),
                output::format_count(forms.len(), "form"),
            ),
            self.verbosity,
        );

        ConvertOutcome {
            manifest: Manifest::new(records, graph.edges(), &sequence),
            forms,
            report,
        }
    }

    /// Reconstitute a batch from its manifest and loaded forms.
    ///
    /// Objects materialize in manifest sequence order; an object whose
    /// form is missing is excluded, and anything that referenced it gets a
    /// minted replacement that nothing backs.
    ///
    /// # Errors
    ///
    /// Fails only when the manifest itself is unusable.
    pub fn reconstitute_batch(
        &self,
        manifest: &Manifest,
        forms: &BTreeMap<ObjectId, DataForm>,
    ) -> Result<ReconstituteOutcome, ManifestError> {
        manifest.verify()?;

        let mut report = BatchReport {
            total: manifest.sequence.len(),
            ..Default::default()
        };
        for entry in &manifest.sequence {
            for depends_on in &entry.deferred {
                report.deferrals.push(Deferral {
                    object_id: entry.object_id.clone(),
                    depends_on: depends_on.clone(),
                });
            }
        }

        // Only objects whose forms actually loaded count as present;
        // references to the rest resolve like out-of-batch targets.
        let batch: BTreeSet<ObjectId> = manifest
            .object_ids()
            .filter(|id| forms.contains_key(*id))
            .cloned()
            .collect();

        let mut map = IdentifierMap::new();
        let mut unresolved = BTreeSet::new();
        let mut objects = Vec::new();

        for entry in &manifest.sequence {
            self.enter(Stage::Materializing(entry.order));
            let old_id = &entry.object_id;

            // verify() guarantees the record exists.
            let Some(record) = manifest.record(old_id) else {
                continue;
            };
            let Some(form) = forms.get(old_id) else {
                report.fail(old_id.as_str(), FailureReason::MissingForm);
                continue;
            };

            // Mint (or adopt) this object's replacement before touching
            // its references, so self-references resolve to it.
            let new_id = map.remap(old_id);

            let mut restored = form.clone();
            let outcome = {
                let mut restorer = Restorer::new(&mut map, &batch, self.layout);
                restorer.restore(&mut restored, &record.references)
            };
            for path in outcome.skipped {
                output::warn(
                    format!("{}: no slot for `{}`", old_id, path),
                    self.verbosity,
                );
                report.skipped_fields.push(SkippedField {
                    object_id: old_id.clone(),
                    path,
                });
            }
            unresolved.extend(outcome.unresolved);

            match self
                .materializer
                .materialize(&record.kind, &restored, &new_id, self.layout)
            {
                Ok(object) => {
                    report.succeeded += 1;
                    objects.push(ReconstitutedObject {
                        old_id: old_id.clone(),
                        new_id,
                        object,
                    });
                }
                Err(err) => {
                    report.fail(
                        old_id.as_str(),
                        FailureReason::Materialize {
                            message: err.to_string(),
                        },
                    );
                }
            }
        }

        report.unresolved_references = unresolved.into_iter().collect();
        self.enter(Stage::Done);

        Ok(ReconstituteOutcome { objects, report })
    }

    /// Convert and immediately reconstitute one batch.
    ///
    /// # Errors
    ///
    /// Fails only when the freshly built manifest fails verification,
    /// which indicates a bug rather than bad input.
    pub fn run_batch(&self, objects: &[Value]) -> Result<RunOutcome, ManifestError> {
        let converted = self.convert_batch(objects);

        let forms: BTreeMap<ObjectId, DataForm> = converted
            .forms
            .iter()
            .map(|f| (f.object_id.clone(), f.form.clone()))
            .collect();
        let reconstituted = self.reconstitute_batch(&converted.manifest, &forms)?;

        let mut report = BatchReport {
            total: converted.report.total,
            succeeded: reconstituted.report.succeeded,
            failed: converted.report.failed + reconstituted.report.failed,
            deferrals: converted.report.deferrals,
            skipped_fields: reconstituted.report.skipped_fields,
            unresolved_references: reconstituted.report.unresolved_references,
            failures: converted.report.failures,
        };
        report.failures.extend(reconstituted.report.failures);

        Ok(RunOutcome {
            forms: converted.forms,
            manifest: converted.manifest,
            objects: reconstituted.objects,
            report,
        })
    }
}
