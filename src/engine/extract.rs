//! engine::extract
//!
//! Recursive reference extraction.
//!
//! # Detection rules
//!
//! Walking an object's attribute tree, an attribute is a reference when,
//! in precedence order:
//!
//! 1. its name ends `_ref` or `_refs` (explicit)
//! 2. its value is a bare string of identifier shape (implicit single)
//! 3. it is a list whose first element is an identifier-shaped string
//!    (implicit list)
//!
//! Detection follows the name; arity follows the value shape, so an
//! explicit `_ref` attribute holding a list is recorded and restored as a
//! list. The attribute literally named `id` is never a reference, at any
//! depth. Absent and empty values extract nothing.
//!
//! Every other map or list is walked recursively, extending the field
//! path with key names or `[i]` index notation, so references under
//! extensions and sub-object arrays are located precisely.
//!
//! # Invariants
//!
//! - The input object is never mutated; extraction works on a clone
//! - Extracted attributes are blanked in place: `""` single, `[]` list
//! - Extracting from an already-extracted tree finds nothing

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::core::path::FieldPath;
use crate::core::types::looks_like_object_id;

/// One extraction event: the identifier value(s) removed from a field.
///
/// List order is significant and preserved exactly through restoration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "arity", rename_all = "snake_case")]
pub enum ExtractedReference {
    Single { value: String },
    List { values: Vec<String> },
}

impl ExtractedReference {
    /// The identifier-shaped values carried by this reference.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        let values: Vec<&str> = match self {
            ExtractedReference::Single { value } => vec![value.as_str()],
            ExtractedReference::List { values } => values.iter().map(String::as_str).collect(),
        };
        values.into_iter().filter(|v| looks_like_object_id(v))
    }
}

/// The result of extracting one object.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// The object with every reference attribute blanked.
    pub cleaned: Value,
    /// Field path -> extraction event, for every reference found.
    pub references: BTreeMap<FieldPath, ExtractedReference>,
}

impl Extraction {
    /// True when the object carried no references.
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// Extract every reference from an object tree.
///
/// The input is cloned; callers keep their original intact.
pub fn extract(object: &Value) -> Extraction {
    let mut cleaned = object.clone();
    let mut references = BTreeMap::new();
    visit(&mut cleaned, &FieldPath::root(), &mut references);
    Extraction {
        cleaned,
        references,
    }
}

fn visit(value: &mut Value, path: &FieldPath, out: &mut BTreeMap<FieldPath, ExtractedReference>) {
    match value {
        Value::Object(map) => visit_map(map, path, out),
        Value::Array(items) => visit_list(items, path, out),
        _ => {}
    }
}

fn visit_map(
    map: &mut Map<String, Value>,
    path: &FieldPath,
    out: &mut BTreeMap<FieldPath, ExtractedReference>,
) {
    for (key, child) in map.iter_mut() {
        if key == "id" {
            continue;
        }
        let child_path = path.child(key);
        if key.ends_with("_ref") || key.ends_with("_refs") {
            take_explicit(child, &child_path, out);
        } else {
            take_implicit(child, &child_path, out);
        }
    }
}

fn visit_list(
    items: &mut [Value],
    path: &FieldPath,
    out: &mut BTreeMap<FieldPath, ExtractedReference>,
) {
    for (i, item) in items.iter_mut().enumerate() {
        visit(item, &path.index(i), out);
    }
}

/// An attribute named `_ref`/`_refs`: always a reference when non-empty.
fn take_explicit(
    value: &mut Value,
    path: &FieldPath,
    out: &mut BTreeMap<FieldPath, ExtractedReference>,
) {
    match value {
        Value::String(s) if !s.is_empty() => {
            out.insert(
                path.clone(),
                ExtractedReference::Single { value: s.clone() },
            );
            *value = Value::String(String::new());
        }
        Value::Array(items) if !items.is_empty() => {
            if let Some(values) = string_elements(items) {
                out.insert(path.clone(), ExtractedReference::List { values });
                *value = Value::Array(Vec::new());
            } else {
                // Unusual: a ref-named list of structures. Walk it so any
                // identifiers inside are still found at exact paths.
                visit(value, path, out);
            }
        }
        _ => {}
    }
}

/// Any other attribute: implicit detection by value shape, else recurse.
fn take_implicit(
    value: &mut Value,
    path: &FieldPath,
    out: &mut BTreeMap<FieldPath, ExtractedReference>,
) {
    match value {
        Value::String(s) if looks_like_object_id(s) => {
            out.insert(
                path.clone(),
                ExtractedReference::Single { value: s.clone() },
            );
            *value = Value::String(String::new());
        }
        Value::Array(items) if !items.is_empty() => {
            let first_is_id = matches!(
                items.first(),
                Some(Value::String(s)) if looks_like_object_id(s)
            );
            if first_is_id {
                if let Some(values) = string_elements(items) {
                    out.insert(path.clone(), ExtractedReference::List { values });
                    *value = Value::Array(Vec::new());
                    return;
                }
            }
            visit(value, path, out);
        }
        Value::Object(_) => visit(value, path, out),
        _ => {}
    }
}

/// All elements as strings, or `None` when any element is not a string.
fn string_elements(items: &[Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}
