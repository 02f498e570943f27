//! engine::manifest
//!
//! The conversion-side record that makes reconstitution possible.
//!
//! A manifest carries, for every converted object: its extraction
//! side-table, the form file it landed in, the dependency edges, and the
//! computed creation sequence. Reconstitution replays the manifest; it
//! never re-derives any of this from the forms.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::path::FieldPath;
use crate::core::types::ObjectId;

use super::extract::ExtractedReference;
use super::graph::DependencyEdge;
use super::sequence::{CreationSequence, SequenceEntry};

/// Current manifest schema version.
pub const MANIFEST_VERSION: u32 = 1;

/// Errors from manifest validation.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("unsupported manifest version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("manifest sequence names `{0}` but no extraction record exists for it")]
    DanglingSequenceEntry(ObjectId),
}

/// Everything recorded for one converted object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub object_id: ObjectId,
    pub kind: String,
    /// The form's on-disk file name.
    pub filename: String,
    /// The wrapper key of the form document.
    pub form_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub references: BTreeMap<FieldPath, ExtractedReference>,
}

/// The conversion record for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,

    pub records: Vec<ExtractionRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub graph: Vec<DependencyEdge>,

    pub sequence: Vec<SequenceEntry>,
}

impl Manifest {
    /// Assemble a manifest from conversion results.
    pub fn new(
        records: Vec<ExtractionRecord>,
        graph: Vec<DependencyEdge>,
        sequence: &CreationSequence,
    ) -> Self {
        Self {
            version: MANIFEST_VERSION,
            records,
            graph,
            sequence: sequence.entries().to_vec(),
        }
    }

    /// Validate version and internal consistency.
    ///
    /// # Errors
    ///
    /// Fails on a version mismatch or a sequence entry with no extraction
    /// record behind it.
    pub fn verify(&self) -> Result<(), ManifestError> {
        if self.version != MANIFEST_VERSION {
            return Err(ManifestError::Version {
                found: self.version,
                expected: MANIFEST_VERSION,
            });
        }
        for entry in &self.sequence {
            if self.record(&entry.object_id).is_none() {
                return Err(ManifestError::DanglingSequenceEntry(entry.object_id.clone()));
            }
        }
        Ok(())
    }

    /// The extraction record for an identifier.
    pub fn record(&self, id: &ObjectId) -> Option<&ExtractionRecord> {
        self.records.iter().find(|r| &r.object_id == id)
    }

    /// Identifiers of every recorded object, record order.
    pub fn object_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.records.iter().map(|r| &r.object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graph::DependencyGraph;

    fn id(s: &str) -> ObjectId {
        ObjectId::new(s).unwrap()
    }

    fn record(oid: &str, kind: &str) -> ExtractionRecord {
        ExtractionRecord {
            object_id: id(oid),
            kind: kind.into(),
            filename: format!("{}_00000000_data_form.json", kind),
            form_name: format!("{}_form", kind),
            references: BTreeMap::new(),
        }
    }

    fn manifest_with(records: Vec<ExtractionRecord>) -> Manifest {
        let mut graph = DependencyGraph::new();
        for r in &records {
            graph.add_node(r.object_id.clone());
        }
        let sequence = CreationSequence::compute(&graph);
        Manifest::new(records, graph.edges(), &sequence)
    }

    #[test]
    fn verify_accepts_consistent_manifest() {
        let manifest = manifest_with(vec![record("identity--1", "identity")]);
        assert!(manifest.verify().is_ok());
        assert!(manifest.record(&id("identity--1")).is_some());
    }

    #[test]
    fn verify_rejects_version_mismatch() {
        let mut manifest = manifest_with(vec![]);
        manifest.version = 99;
        assert!(matches!(
            manifest.verify(),
            Err(ManifestError::Version { found: 99, .. })
        ));
    }

    #[test]
    fn verify_rejects_dangling_sequence_entry() {
        let mut manifest = manifest_with(vec![record("identity--1", "identity")]);
        manifest.records.clear();
        assert!(matches!(
            manifest.verify(),
            Err(ManifestError::DanglingSequenceEntry(_))
        ));
    }

    #[test]
    fn json_roundtrip() {
        let manifest = manifest_with(vec![
            record("identity--1", "identity"),
            record("indicator--2", "indicator"),
        ]);
        let text = serde_json::to_string_pretty(&manifest).unwrap();
        let parsed: Manifest = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, manifest);
    }
}
