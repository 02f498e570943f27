//! engine
//!
//! The extract -> build -> graph -> sequence -> restore -> materialize
//! pipeline.
//!
//! # Modules
//!
//! - [`extract`] - Recursive reference extraction
//! - [`build`] - Object-to-form projection against a template
//! - [`graph`] - The "must exist before" dependency graph
//! - [`sequence`] - Deterministic creation-order computation
//! - [`remap`] - The append-only old-to-new identifier map
//! - [`restore`] - Reference restoration into forms
//! - [`materialize`] - Object assembly from restored forms
//! - [`manifest`] - The conversion record reconstitution replays
//! - [`report`] - Per-batch outcomes and failures
//! - [`runner`] - The batch stage machine

pub mod build;
pub mod extract;
pub mod graph;
pub mod manifest;
pub mod materialize;
pub mod remap;
pub mod report;
pub mod restore;
pub mod runner;
pub mod sequence;

pub use build::{build, BuildError, BuiltForm};
pub use extract::{extract, ExtractedReference, Extraction};
pub use graph::{DependencyEdge, DependencyGraph};
pub use manifest::{ExtractionRecord, Manifest, ManifestError, MANIFEST_VERSION};
pub use materialize::{GenericMaterializer, MaterializeError, Materializer};
pub use remap::IdentifierMap;
pub use report::{BatchReport, Deferral, Failure, FailureReason, SkippedField};
pub use restore::{RestoreOutcome, Restorer};
pub use runner::{
    ConvertOutcome, ConvertedForm, ReconstituteOutcome, ReconstitutedObject, RunOutcome, Runner,
    Stage,
};
pub use sequence::{CreationSequence, SequenceEntry};
