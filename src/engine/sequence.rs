//! engine::sequence
//!
//! Deterministic creation-order computation.
//!
//! # Algorithm
//!
//! Kahn's topological sort with a stable tie-break: among all ready nodes
//! (every dependency already sequenced), the one earliest in original
//! encounter order goes next. The same batch in the same order always
//! yields the same sequence.
//!
//! # Cycles
//!
//! A cycle never aborts the batch. When no node is ready, the node with
//! the fewest unsatisfied dependencies (earliest encounter order on ties)
//! is emitted anyway, and those unsatisfied dependencies are recorded on
//! its entry as deferred. Restoration resolves deferred targets by
//! minting their replacement identifiers ahead of materialization, so
//! every cycle member still ends up fully wired.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::ObjectId;

use super::graph::DependencyGraph;

/// One position in the creation sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceEntry {
    /// Zero-based position.
    pub order: usize,

    pub object_id: ObjectId,

    /// Dependencies that were not yet sequenced when this entry was
    /// emitted. Non-empty only for entries that broke a cycle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deferred: Vec<ObjectId>,
}

/// The computed creation order for a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreationSequence {
    entries: Vec<SequenceEntry>,
    position: BTreeMap<ObjectId, usize>,
}

impl CreationSequence {
    /// Sequence a dependency graph.
    pub fn compute(graph: &DependencyGraph) -> Self {
        let n = graph.len();
        let mut remaining: Vec<usize> = (0..n)
            .map(|i| graph.dependencies_of(i).len())
            .collect();
        let mut emitted = vec![false; n];

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();

        let mut entries = Vec::with_capacity(n);
        let mut position = BTreeMap::new();

        while entries.len() < n {
            let (next, deferred) = match ready.pop_first() {
                Some(next) => (next, Vec::new()),
                None => {
                    // Cycle: force the node with the fewest unsatisfied
                    // dependencies, earliest encounter order on ties.
                    let next = (0..n)
                        .filter(|&i| !emitted[i])
                        .min_by_key(|&i| (remaining[i], i))
                        .unwrap_or(0);
                    let deferred = graph
                        .dependencies_of(next)
                        .iter()
                        .filter(|&&dep| !emitted[dep])
                        .map(|&dep| graph.node(dep).clone())
                        .collect();
                    (next, deferred)
                }
            };

            emitted[next] = true;
            let id = graph.node(next).clone();
            position.insert(id.clone(), entries.len());
            entries.push(SequenceEntry {
                order: entries.len(),
                object_id: id,
                deferred,
            });

            for &dependent in graph.dependents_of(next) {
                if emitted[dependent] {
                    continue;
                }
                remaining[dependent] = remaining[dependent].saturating_sub(1);
                if remaining[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        CreationSequence { entries, position }
    }

    /// Entries in creation order.
    pub fn entries(&self) -> &[SequenceEntry] {
        &self.entries
    }

    /// The sequence position of an identifier.
    pub fn position(&self, id: &ObjectId) -> Option<usize> {
        self.position.get(id).copied()
    }

    /// Number of sequenced objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the batch was empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every deferred dependency across the sequence, with the entry that
    /// carried it.
    pub fn deferrals(&self) -> impl Iterator<Item = (&ObjectId, &ObjectId)> {
        self.entries
            .iter()
            .flat_map(|entry| entry.deferred.iter().map(move |dep| (&entry.object_id, dep)))
    }
}
