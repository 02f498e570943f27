//! engine::restore
//!
//! Replays extraction side-tables into forms, remapping identifiers.
//!
//! # Resolution
//!
//! For each recorded value, in order:
//!
//! 1. not identifier-shaped: passes through unchanged
//! 2. already mapped: the cached replacement is reused
//! 3. target is in the batch: a replacement is minted now, even if the
//!    target has not been materialized yet (forward and cycle-deferred
//!    references); when the target's turn comes it adopts the same
//!    replacement from the map
//! 4. target is outside the batch: a replacement is minted, marked
//!    synthetic, and reported as unresolved
//!
//! # Placement
//!
//! A plain field path is located by searching the form's sections in the
//! layout's configured order; a nested path (`extensions.…`, `sub.…`) is
//! navigated segment by segment. The destination slot must already exist
//! in the form; a path that leads nowhere is skipped and reported, never
//! fatal.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::form::DataForm;
use crate::core::layout::FormLayout;
use crate::core::path::{FieldPath, PathSegment};
use crate::core::types::ObjectId;

use super::extract::ExtractedReference;
use super::remap::IdentifierMap;

/// What one form's restoration produced besides the form itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreOutcome {
    /// Paths whose destination slot no longer exists in the form.
    pub skipped: Vec<FieldPath>,
    /// Old identifiers that pointed outside the batch.
    pub unresolved: Vec<ObjectId>,
}

/// Restores references into forms against a shared identifier map.
pub struct Restorer<'a> {
    map: &'a mut IdentifierMap,
    batch: &'a BTreeSet<ObjectId>,
    layout: &'a FormLayout,
}

impl<'a> Restorer<'a> {
    pub fn new(
        map: &'a mut IdentifierMap,
        batch: &'a BTreeSet<ObjectId>,
        layout: &'a FormLayout,
    ) -> Self {
        Self { map, batch, layout }
    }

    /// Write every recorded reference back into the form, remapped.
    pub fn restore(
        &mut self,
        form: &mut DataForm,
        references: &BTreeMap<FieldPath, ExtractedReference>,
    ) -> RestoreOutcome {
        let mut outcome = RestoreOutcome::default();

        for (path, reference) in references {
            let restored = match reference {
                ExtractedReference::Single { value } => self.resolve(value, &mut outcome),
                ExtractedReference::List { values } => Value::Array(
                    values
                        .iter()
                        .map(|value| self.resolve(value, &mut outcome))
                        .collect(),
                ),
            };

            match self.slot(form, path) {
                Some(slot) => *slot = restored,
                None => outcome.skipped.push(path.clone()),
            }
        }

        outcome
    }

    /// Resolve one recorded value to its restored form.
    fn resolve(&mut self, raw: &str, outcome: &mut RestoreOutcome) -> Value {
        let Ok(old) = ObjectId::new(raw) else {
            return Value::String(raw.to_string());
        };
        if let Some(new) = self.map.get(&old) {
            return Value::String(new.to_string());
        }
        let new = if self.batch.contains(&old) {
            self.map.remap(&old)
        } else {
            outcome.unresolved.push(old.clone());
            self.map.remap_missing(&old)
        };
        Value::String(new.to_string())
    }

    /// The mutable slot a path addresses, if it still exists.
    fn slot<'f>(&self, form: &'f mut DataForm, path: &FieldPath) -> Option<&'f mut Value> {
        let segments = path.segments();
        match path.head_field() {
            Some("extensions") if segments.len() > 1 => {
                navigate(&mut form.extensions, &segments[1..])
            }
            Some("sub") if segments.len() > 1 => navigate(&mut form.sub, &segments[1..]),
            Some(field) if path.is_plain_field() => {
                let section = self
                    .layout
                    .search_order
                    .iter()
                    .find(|&&section| form.section(section).contains_key(field))
                    .copied()?;
                form.section_mut(section).get_mut(field)
            }
            Some(_) => {
                // Nested path under a plain section field.
                let head = path.head_field()?;
                let section = self
                    .layout
                    .search_order
                    .iter()
                    .find(|&&section| form.section(section).contains_key(head))
                    .copied()?;
                navigate(form.section_mut(section), segments)
            }
            None => None,
        }
    }
}

/// Walk segments inside a section map.
fn navigate<'f>(map: &'f mut Map<String, Value>, segments: &[PathSegment]) -> Option<&'f mut Value> {
    let (first, rest) = segments.split_first()?;
    let PathSegment::Field(name) = first else {
        return None;
    };
    let mut current = map.get_mut(name)?;
    for segment in rest {
        current = match segment {
            PathSegment::Field(name) => current.as_object_mut()?.get_mut(name)?,
            PathSegment::Index(i) => current.as_array_mut()?.get_mut(*i)?,
        };
    }
    Some(current)
}
