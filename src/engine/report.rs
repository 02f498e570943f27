//! engine::report
//!
//! The per-batch outcome report.
//!
//! Failures are data, not control flow: one bad object never aborts a
//! batch, it lands here instead. The report also carries the softer
//! diagnostics a reader wants after a run: references whose targets were
//! outside the batch, fields whose slot vanished, and cycle deferrals.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::path::FieldPath;
use crate::core::types::ObjectId;

/// Why one object was excluded from a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("no template registered for kind `{kind}`")]
    UnknownKind { kind: String },

    #[error("object has no usable identifier")]
    MissingIdentifier,

    #[error("identifier already seen earlier in the batch")]
    DuplicateIdentifier,

    #[error("no form is available for this object")]
    MissingForm,

    #[error("form building failed: {message}")]
    Build { message: String },

    #[error("materialization failed: {message}")]
    Materialize { message: String },
}

/// One excluded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// The object's claimed identifier, or its position in the batch when
    /// no identifier could be read.
    pub object: String,
    #[serde(flatten)]
    pub reason: FailureReason,
}

/// A reference restored into a form whose slot no longer existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedField {
    pub object_id: ObjectId,
    pub path: FieldPath,
}

/// A dependency that was still unsequenced when its dependent was emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deferral {
    pub object_id: ObjectId,
    pub depends_on: ObjectId,
}

/// Everything a batch run reports besides its outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Objects presented to the batch.
    pub total: usize,
    /// Objects that made it all the way through.
    pub succeeded: usize,
    /// Objects excluded, with reasons.
    pub failed: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<Failure>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_fields: Vec<SkippedField>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deferrals: Vec<Deferral>,

    /// Old identifiers whose targets were not in the batch. Their
    /// replacements exist but nothing was materialized under them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_references: Vec<ObjectId>,
}

impl BatchReport {
    /// Record one failure.
    pub fn fail(&mut self, object: impl Into<String>, reason: FailureReason) {
        self.failed += 1;
        self.failures.push(Failure {
            object: object.into(),
            reason,
        });
    }

    /// Fraction of presented objects that succeeded.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.succeeded as f64 / self.total as f64
        }
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} of {} objects processed, {} failed",
            self.succeeded, self.total, self.failed
        );
        if !self.unresolved_references.is_empty() {
            line.push_str(&format!(
                ", {} unresolved reference(s)",
                self.unresolved_references.len()
            ));
        }
        if !self.deferrals.is_empty() {
            line.push_str(&format!(", {} cycle deferral(s)", self.deferrals.len()));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_accumulate() {
        let mut report = BatchReport {
            total: 3,
            succeeded: 2,
            ..Default::default()
        };
        report.fail(
            "widget--1",
            FailureReason::UnknownKind {
                kind: "widget".into(),
            },
        );

        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].object, "widget--1");
        assert!((report.success_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_batch_counts_as_full_success() {
        let report = BatchReport::default();
        assert_eq!(report.success_rate(), 1.0);
    }

    #[test]
    fn summary_mentions_diagnostics() {
        let mut report = BatchReport {
            total: 2,
            succeeded: 2,
            ..Default::default()
        };
        report
            .unresolved_references
            .push(ObjectId::new("identity--gone").unwrap());
        let summary = report.summary();
        assert!(summary.contains("2 of 2"));
        assert!(summary.contains("1 unresolved"));
    }

    #[test]
    fn report_serializes_with_tagged_reasons() {
        let mut report = BatchReport {
            total: 1,
            ..Default::default()
        };
        report.fail("#0", FailureReason::MissingIdentifier);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["failures"][0]["reason"], "missing_identifier");
        assert_eq!(value["failures"][0]["object"], "#0");

        let parsed: BatchReport = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, report);
    }
}
