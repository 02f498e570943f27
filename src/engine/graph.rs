//! engine::graph
//!
//! The "must exist before" dependency graph.
//!
//! # Architecture
//!
//! Nodes are the batch's objects in original encounter order; an edge
//! `from -> to` means `from` references `to`, so `to` must be created
//! first. Edges are derived from extraction side-tables:
//!
//! - one edge per distinct referenced identifier per object
//! - self-references never produce edges
//! - targets absent from the batch never produce edges (they cannot
//!   constrain ordering; restoration mints for them on demand)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::path::FieldPath;
use crate::core::types::ObjectId;

use super::extract::ExtractedReference;

/// One dependency: `from` requires `to` to exist first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: ObjectId,
    pub to: ObjectId,
}

/// The batch dependency graph.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<ObjectId>,
    index: BTreeMap<ObjectId, usize>,
    /// Per node: indices of the nodes it depends on.
    dependencies: Vec<BTreeSet<usize>>,
    /// Per node: indices of the nodes depending on it.
    dependents: Vec<BTreeSet<usize>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a batch.
    ///
    /// `batch` pairs each object identifier with its extraction
    /// side-table, in original encounter order. Duplicate identifiers
    /// keep their first position.
    pub fn from_extractions<'a, I>(batch: I) -> Self
    where
        I: IntoIterator<Item = (&'a ObjectId, &'a BTreeMap<FieldPath, ExtractedReference>)>,
    {
        let batch: Vec<_> = batch.into_iter().collect();

        let mut graph = Self::new();
        for (id, _) in &batch {
            graph.add_node((*id).clone());
        }
        for (id, references) in &batch {
            for reference in references.values() {
                for target in reference.ids() {
                    if let Ok(target) = ObjectId::new(target) {
                        graph.add_edge(id, &target);
                    }
                }
            }
        }
        graph
    }

    /// Add a node, returning its encounter index.
    ///
    /// Adding an already-present node is a no-op returning its original
    /// index.
    pub fn add_node(&mut self, id: ObjectId) -> usize {
        if let Some(&index) = self.index.get(&id) {
            return index;
        }
        let index = self.nodes.len();
        self.index.insert(id.clone(), index);
        self.nodes.push(id);
        self.dependencies.push(BTreeSet::new());
        self.dependents.push(BTreeSet::new());
        index
    }

    /// Add an edge `from -> to`.
    ///
    /// Ignored when either endpoint is not a node, when the endpoints are
    /// equal, or when the edge already exists.
    pub fn add_edge(&mut self, from: &ObjectId, to: &ObjectId) {
        if from == to {
            return;
        }
        let (Some(&f), Some(&t)) = (self.index.get(from), self.index.get(to)) else {
            return;
        };
        self.dependencies[f].insert(t);
        self.dependents[t].insert(f);
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when the identifier is a node.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.index.contains_key(id)
    }

    /// The node at an encounter index.
    pub fn node(&self, index: usize) -> &ObjectId {
        &self.nodes[index]
    }

    /// Nodes in encounter order.
    pub fn nodes(&self) -> &[ObjectId] {
        &self.nodes
    }

    /// Indices this node depends on.
    pub fn dependencies_of(&self, index: usize) -> &BTreeSet<usize> {
        &self.dependencies[index]
    }

    /// Indices depending on this node.
    pub fn dependents_of(&self, index: usize) -> &BTreeSet<usize> {
        &self.dependents[index]
    }

    /// All edges, deduplicated, in (from, to) node order.
    pub fn edges(&self) -> Vec<DependencyEdge> {
        let mut edges = Vec::new();
        for (f, deps) in self.dependencies.iter().enumerate() {
            for &t in deps {
                edges.push(DependencyEdge {
                    from: self.nodes[f].clone(),
                    to: self.nodes[t].clone(),
                });
            }
        }
        edges
    }
}
