//! core::form
//!
//! The flattened, reference-free data form.
//!
//! # Structure
//!
//! A form partitions an object's attributes into five sections:
//! `base_required`, `base_optional`, `object`, `extensions`, and `sub`.
//! Reference attributes appear blanked (`""` / `[]`); embedded sub-object
//! arrays found inside extensions are relocated into `sub` so the form
//! never nests un-extracted references.
//!
//! # Naming
//!
//! On disk a form is wrapped in its form name (`{ "identity_form": {...} }`),
//! and its file name is derived from the kind plus a digest of the form
//! content, so re-running a conversion overwrites rather than duplicates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::layout::Section;

/// Errors from form wrapping and naming.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("form document is not a single-key object")]
    NotWrapped,

    #[error("form body is malformed: {0}")]
    Malformed(serde_json::Error),
}

/// A flattened, reference-free projection of one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataForm {
    #[serde(default)]
    pub base_required: Map<String, Value>,

    #[serde(default)]
    pub base_optional: Map<String, Value>,

    #[serde(default)]
    pub object: Map<String, Value>,

    #[serde(default)]
    pub extensions: Map<String, Value>,

    #[serde(default)]
    pub sub: Map<String, Value>,
}

impl DataForm {
    /// Borrow one section.
    pub fn section(&self, section: Section) -> &Map<String, Value> {
        match section {
            Section::BaseRequired => &self.base_required,
            Section::BaseOptional => &self.base_optional,
            Section::Object => &self.object,
            Section::Extensions => &self.extensions,
            Section::Sub => &self.sub,
        }
    }

    /// Mutably borrow one section.
    pub fn section_mut(&mut self, section: Section) -> &mut Map<String, Value> {
        match section {
            Section::BaseRequired => &mut self.base_required,
            Section::BaseOptional => &mut self.base_optional,
            Section::Object => &mut self.object,
            Section::Extensions => &mut self.extensions,
            Section::Sub => &mut self.sub,
        }
    }

    /// The form name for a kind: hyphens become underscores, `_form` is
    /// appended (`observed-data` -> `observed_data_form`).
    pub fn form_name(kind: &str) -> String {
        format!("{}_form", kind.replace('-', "_"))
    }

    /// The content-derived file name for this form.
    ///
    /// `<kind>_<8 hex of sha256 of the form JSON>_data_form.json`. The
    /// digest covers the serialized form, so identical content always maps
    /// to the same file and re-runs overwrite instead of duplicating.
    pub fn file_name(&self, kind: &str) -> String {
        let body = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(body.as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("{}_{}_data_form.json", kind, &digest[..8])
    }

    /// The form as a bare JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Wrap in the named-form document format.
    pub fn wrapped(&self, form_name: &str) -> Value {
        let mut doc = Map::new();
        doc.insert(form_name.to_string(), self.to_value());
        Value::Object(doc)
    }

    /// Unwrap a named-form document, returning the form name and body.
    ///
    /// # Errors
    ///
    /// Fails when the document is not a single-key object or the body does
    /// not deserialize as a form.
    pub fn from_wrapped(doc: &Value) -> Result<(String, DataForm), FormError> {
        let map = doc.as_object().ok_or(FormError::NotWrapped)?;
        if map.len() != 1 {
            return Err(FormError::NotWrapped);
        }
        // Exactly one entry; the guard above makes this unwrap-free.
        let (name, body) = map.iter().next().ok_or(FormError::NotWrapped)?;
        let form: DataForm =
            serde_json::from_value(body.clone()).map_err(FormError::Malformed)?;
        Ok((name.clone(), form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_form() -> DataForm {
        let mut form = DataForm::default();
        form.base_required
            .insert("type".into(), json!("identity"));
        form.base_required.insert("id".into(), json!(""));
        form.object.insert("name".into(), json!("Acme"));
        form
    }

    #[test]
    fn form_name_from_kind() {
        assert_eq!(DataForm::form_name("identity"), "identity_form");
        assert_eq!(DataForm::form_name("observed-data"), "observed_data_form");
        assert_eq!(DataForm::form_name("email-addr"), "email_addr_form");
    }

    #[test]
    fn file_name_is_content_derived() {
        let form = sample_form();
        let name1 = form.file_name("identity");
        let name2 = form.file_name("identity");
        assert_eq!(name1, name2);
        assert!(name1.starts_with("identity_"));
        assert!(name1.ends_with("_data_form.json"));

        let mut changed = form.clone();
        changed.object.insert("name".into(), json!("Globex"));
        assert_ne!(changed.file_name("identity"), name1);
    }

    #[test]
    fn wrap_unwrap_roundtrip() {
        let form = sample_form();
        let doc = form.wrapped("identity_form");
        let (name, parsed) = DataForm::from_wrapped(&doc).unwrap();
        assert_eq!(name, "identity_form");
        assert_eq!(parsed, form);
    }

    #[test]
    fn unwrap_rejects_multi_key_documents() {
        let doc = json!({"a_form": {}, "b_form": {}});
        assert!(matches!(
            DataForm::from_wrapped(&doc),
            Err(FormError::NotWrapped)
        ));
        assert!(matches!(
            DataForm::from_wrapped(&json!([])),
            Err(FormError::NotWrapped)
        ));
    }

    #[test]
    fn missing_sections_default_empty() {
        let doc = json!({"task_form": {"object": {"name": "t"}}});
        let (_, form) = DataForm::from_wrapped(&doc).unwrap();
        assert!(form.base_required.is_empty());
        assert_eq!(form.object["name"], json!("t"));
    }
}
