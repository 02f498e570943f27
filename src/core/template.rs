//! core::template
//!
//! Per-kind field schemas and the template catalog.
//!
//! # Design
//!
//! A template describes the field layout of one object kind: which
//! attributes belong to each form section, and per-attribute reference and
//! collection flags. Templates are consumed as a read-only mapping table;
//! the engine never modifies them.
//!
//! The catalog is built once at startup (typically from a directory of
//! JSON documents, one per kind) and passed by reference everywhere.
//! There is no global registry.
//!
//! # Template document format
//!
//! ```json
//! {
//!   "kind": "identity",
//!   "base_required": { "type": {}, "spec_version": {}, "id": {}, "created": {}, "modified": {} },
//!   "base_optional": { "labels": { "collection": true } },
//!   "object": { "name": {}, "created_by_ref": { "reference": "single" } },
//!   "extensions": {},
//!   "sub": {}
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use super::layout::Section;

/// Errors from template loading.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template directory `{path}`: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse template `{path}`: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("duplicate template for kind `{0}`")]
    DuplicateKind(String),
}

/// How a reference-flagged attribute carries identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefArity {
    Single,
    List,
}

/// Per-attribute schema flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// The attribute holds a list.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub collection: bool,

    /// The attribute holds another object's identifier(s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<RefArity>,
}

/// The field layout of one object kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// The object kind this template describes.
    pub kind: String,

    #[serde(default)]
    pub base_required: BTreeMap<String, FieldDef>,

    #[serde(default)]
    pub base_optional: BTreeMap<String, FieldDef>,

    #[serde(default)]
    pub object: BTreeMap<String, FieldDef>,

    #[serde(default)]
    pub extensions: BTreeMap<String, FieldDef>,

    #[serde(default)]
    pub sub: BTreeMap<String, FieldDef>,
}

impl Template {
    /// The fields of one plain section.
    pub fn section(&self, section: Section) -> &BTreeMap<String, FieldDef> {
        match section {
            Section::BaseRequired => &self.base_required,
            Section::BaseOptional => &self.base_optional,
            Section::Object => &self.object,
            Section::Extensions => &self.extensions,
            Section::Sub => &self.sub,
        }
    }
}

/// Read-only lookup table from object kind to template.
///
/// # Invariants
///
/// - Populated once, never mutated afterwards
/// - Passed explicitly; never reached through ambient state
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, Template>,
}

impl TemplateCatalog {
    /// Build a catalog from already-parsed templates.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::DuplicateKind` when two templates claim the
    /// same kind.
    pub fn from_templates(
        templates: impl IntoIterator<Item = Template>,
    ) -> Result<Self, TemplateError> {
        let mut map = BTreeMap::new();
        for template in templates {
            let kind = template.kind.clone();
            if map.insert(kind.clone(), template).is_some() {
                return Err(TemplateError::DuplicateKind(kind));
            }
        }
        Ok(Self { templates: map })
    }

    /// Load every `*.json` template document in a directory.
    ///
    /// Non-JSON files are ignored. Subdirectories are not descended into;
    /// a catalog directory is flat.
    pub fn load_dir(dir: &Path) -> Result<Self, TemplateError> {
        let entries = std::fs::read_dir(dir).map_err(|source| TemplateError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let mut templates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| TemplateError::Io {
                path: dir.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let text = std::fs::read_to_string(&path).map_err(|source| TemplateError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let template: Template =
                serde_json::from_str(&text).map_err(|source| TemplateError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
            templates.push(template);
        }

        Self::from_templates(templates)
    }

    /// Look up the template for a kind.
    pub fn lookup(&self, kind: &str) -> Option<&Template> {
        self.templates.get(kind)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True when no templates are registered.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterate over registered kinds.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_template() -> Template {
        serde_json::from_value(serde_json::json!({
            "kind": "identity",
            "base_required": {
                "type": {}, "spec_version": {}, "id": {}, "created": {}, "modified": {}
            },
            "base_optional": {
                "labels": { "collection": true },
                "revoked": {}
            },
            "object": {
                "name": {},
                "created_by_ref": { "reference": "single" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn parses_template_document() {
        let template = identity_template();
        assert_eq!(template.kind, "identity");
        assert!(template.base_required.contains_key("id"));
        assert!(template.base_optional["labels"].collection);
        assert_eq!(
            template.object["created_by_ref"].reference,
            Some(RefArity::Single)
        );
        assert_eq!(template.object["name"].reference, None);
    }

    #[test]
    fn catalog_lookup() {
        let catalog = TemplateCatalog::from_templates([identity_template()]).unwrap();
        assert!(catalog.lookup("identity").is_some());
        assert!(catalog.lookup("malware-analysis").is_none());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn catalog_rejects_duplicates() {
        let result = TemplateCatalog::from_templates([identity_template(), identity_template()]);
        assert!(matches!(result, Err(TemplateError::DuplicateKind(k)) if k == "identity"));
    }

    #[test]
    fn load_dir_reads_json_documents() {
        let dir = tempfile::tempdir().unwrap();
        let doc = serde_json::to_string_pretty(&identity_template()).unwrap();
        std::fs::write(dir.path().join("identity.json"), doc).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = TemplateCatalog::load_dir(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.lookup("identity").is_some());
    }
}
