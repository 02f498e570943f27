//! engine::remap
//!
//! The append-only old-to-new identifier map.
//!
//! # Invariants
//!
//! - An old identifier is minted at most once; every later lookup returns
//!   the cached replacement
//! - Entries are never removed or overwritten within a batch
//! - Replacements keep the old identifier's kind prefix
//!
//! Identifiers minted for targets outside the batch are marked synthetic:
//! the replacement exists so referring fields stay well-formed, but no
//! materialized object backs it.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::ObjectId;

/// Old-to-new identifier assignments for one batch.
#[derive(Debug, Clone, Default)]
pub struct IdentifierMap {
    map: BTreeMap<ObjectId, ObjectId>,
    synthetic: BTreeSet<ObjectId>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The replacement for an old identifier, minting on first sight.
    pub fn remap(&mut self, old: &ObjectId) -> ObjectId {
        if let Some(new) = self.map.get(old) {
            return new.clone();
        }
        let new = old.mint_like();
        self.map.insert(old.clone(), new.clone());
        new
    }

    /// Like [`remap`](Self::remap), but marks the assignment synthetic:
    /// the target is not in the batch, so nothing will be materialized
    /// under the replacement.
    ///
    /// An identifier already mapped normally stays non-synthetic.
    pub fn remap_missing(&mut self, old: &ObjectId) -> ObjectId {
        if let Some(new) = self.map.get(old) {
            return new.clone();
        }
        let new = old.mint_like();
        self.map.insert(old.clone(), new.clone());
        self.synthetic.insert(old.clone());
        new
    }

    /// The cached replacement, if one was already minted.
    pub fn get(&self, old: &ObjectId) -> Option<&ObjectId> {
        self.map.get(old)
    }

    /// True when the replacement was minted for an out-of-batch target.
    pub fn is_synthetic(&self, old: &ObjectId) -> bool {
        self.synthetic.contains(old)
    }

    /// Number of assignments.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when nothing has been remapped yet.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// All assignments, old identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &ObjectId)> {
        self.map.iter()
    }

    /// The old identifiers flagged synthetic.
    pub fn synthetic_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.synthetic.iter()
    }
}
