//! engine::build
//!
//! Projects one object plus its template into a data form.
//!
//! # Rules
//!
//! - Every reference is extracted first; the form holds only blanks
//! - Auto-managed attributes (`id`, `created`, `modified`) are always
//!   emitted as empty placeholders; they are regenerated on reconstitution
//! - Absent attributes get template defaults: `[]` for collections, a
//!   null sentinel in `base_optional`, `""` elsewhere
//! - An extension field holding a list of embedded sub-objects is
//!   relocated into the `sub` section (the extension keeps `[]`), and the
//!   affected reference paths are rewritten to address the new container
//!
//! # Idempotence
//!
//! Extracting references from a built form finds nothing: every
//! identifier the object carried is in the side-table, not the form.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::form::DataForm;
use crate::core::layout::{FormLayout, Section};
use crate::core::path::FieldPath;
use crate::core::template::{FieldDef, Template};

use super::extract::{extract, ExtractedReference};

/// Errors from form building.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("object is not a JSON map")]
    NotAnObject,
}

/// A built form plus everything needed to restore and materialize it.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltForm {
    pub form: DataForm,
    pub references: BTreeMap<FieldPath, ExtractedReference>,
    pub form_name: String,
    pub file_name: String,
}

/// Build the data form for one object.
///
/// # Errors
///
/// Returns `BuildError::NotAnObject` when the value is not a JSON map.
/// Template-versus-object mismatches never fail: attributes the template
/// does not know are dropped, attributes the object lacks are defaulted.
pub fn build(
    object: &Value,
    template: &Template,
    layout: &FormLayout,
) -> Result<BuiltForm, BuildError> {
    if !object.is_object() {
        return Err(BuildError::NotAnObject);
    }

    let extraction = extract(object);
    let cleaned = extraction
        .cleaned
        .as_object()
        .ok_or(BuildError::NotAnObject)?;

    let mut form = DataForm::default();

    for section in [Section::BaseRequired, Section::BaseOptional, Section::Object] {
        let fields = template.section(section);
        let target = form.section_mut(section);
        for (field, def) in fields {
            target.insert(
                field.clone(),
                projected_value(field, def, section, cleaned, template, layout),
            );
        }
    }

    // Rewrites accumulated while relocating embedded sub-object arrays.
    let mut rebases: Vec<(FieldPath, FieldPath)> = Vec::new();

    if let Some(Value::Object(extensions)) = cleaned.get("extensions") {
        let ext_root = FieldPath::field("extensions");
        let sub_root = FieldPath::field("sub");
        for (ext_id, ext_value) in extensions {
            let Some(ext_map) = ext_value.as_object() else {
                form.extensions.insert(ext_id.clone(), ext_value.clone());
                continue;
            };
            let mut projected = Map::new();
            for (key, value) in ext_map {
                if is_embedded_list(value) {
                    form.sub.insert(key.clone(), value.clone());
                    projected.insert(key.clone(), Value::Array(Vec::new()));
                    rebases.push((
                        ext_root.child(ext_id).child(key),
                        sub_root.child(key),
                    ));
                } else {
                    projected.insert(key.clone(), value.clone());
                }
            }
            form.extensions.insert(ext_id.clone(), Value::Object(projected));
        }
    }

    if let Some(Value::Object(sub)) = cleaned.get("sub") {
        for (key, value) in sub {
            form.sub.insert(key.clone(), value.clone());
        }
    }

    let mut references = BTreeMap::new();
    for (path, reference) in extraction.references {
        let rebased = rebases
            .iter()
            .find_map(|(prefix, replacement)| path.rebase(prefix, replacement))
            .unwrap_or(path);
        references.insert(rebased, reference);
    }

    let form_name = DataForm::form_name(&template.kind);
    let file_name = form.file_name(&template.kind);

    Ok(BuiltForm {
        form,
        references,
        form_name,
        file_name,
    })
}

/// The value one plain-section field takes in the form.
fn projected_value(
    field: &str,
    def: &FieldDef,
    section: Section,
    cleaned: &Map<String, Value>,
    template: &Template,
    layout: &FormLayout,
) -> Value {
    if layout.is_auto_managed(field) {
        return Value::String(String::new());
    }
    if let Some(value) = cleaned.get(field) {
        return value.clone();
    }
    if field == "type" {
        return Value::String(template.kind.clone());
    }
    if def.collection {
        return Value::Array(Vec::new());
    }
    match section {
        Section::BaseOptional => Value::Null,
        _ => Value::String(String::new()),
    }
}

/// True for a non-empty list whose first element is an embedded map.
fn is_embedded_list(value: &Value) -> bool {
    matches!(
        value.as_array().and_then(|items| items.first()),
        Some(Value::Object(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layout() -> FormLayout {
        FormLayout::default()
    }

    fn indicator_template() -> Template {
        serde_json::from_value(json!({
            "kind": "indicator",
            "base_required": {
                "type": {}, "spec_version": {}, "id": {}, "created": {}, "modified": {}
            },
            "base_optional": {
                "labels": { "collection": true },
                "confidence": {}
            },
            "object": {
                "name": {},
                "pattern": {},
                "created_by_ref": { "reference": "single" }
            }
        }))
        .unwrap()
    }

    fn identity_with_extension_template() -> Template {
        serde_json::from_value(json!({
            "kind": "identity",
            "base_required": { "type": {}, "id": {}, "created": {}, "modified": {} },
            "object": { "name": {} },
            "extensions": { "extension-definition--abc": {} }
        }))
        .unwrap()
    }

    #[test]
    fn auto_managed_fields_are_blanked() {
        let obj = json!({
            "type": "indicator",
            "spec_version": "2.1",
            "id": "indicator--2",
            "created": "2023-01-01T00:00:00.000Z",
            "modified": "2023-01-01T00:00:00.000Z",
            "name": "detect",
            "pattern": "[url:value = 'x']",
            "created_by_ref": "identity--1"
        });
        let built = build(&obj, &indicator_template(), &layout()).unwrap();

        assert_eq!(built.form.base_required["id"], json!(""));
        assert_eq!(built.form.base_required["created"], json!(""));
        assert_eq!(built.form.base_required["modified"], json!(""));
        assert_eq!(built.form.base_required["type"], json!("indicator"));
        assert_eq!(built.form.base_required["spec_version"], json!("2.1"));
    }

    #[test]
    fn references_are_blanked_and_recorded() {
        let obj = json!({
            "type": "indicator",
            "id": "indicator--2",
            "name": "detect",
            "created_by_ref": "identity--1"
        });
        let built = build(&obj, &indicator_template(), &layout()).unwrap();

        assert_eq!(built.form.object["created_by_ref"], json!(""));
        assert_eq!(
            built.references[&FieldPath::field("created_by_ref")],
            ExtractedReference::Single {
                value: "identity--1".into()
            }
        );
    }

    #[test]
    fn absent_fields_get_section_defaults() {
        let obj = json!({
            "type": "indicator",
            "id": "indicator--2"
        });
        let built = build(&obj, &indicator_template(), &layout()).unwrap();

        // collection -> [], base_optional -> null, object -> ""
        assert_eq!(built.form.base_optional["labels"], json!([]));
        assert_eq!(built.form.base_optional["confidence"], json!(null));
        assert_eq!(built.form.object["name"], json!(""));
        assert_eq!(built.form.object["created_by_ref"], json!(""));
    }

    #[test]
    fn embedded_extension_lists_relocate_to_sub() {
        let obj = json!({
            "type": "identity",
            "id": "identity--1",
            "name": "Acme",
            "extensions": {
                "extension-definition--abc": {
                    "team": "vendor",
                    "contacts": [
                        { "name": "ops", "email_ref": "email-addr--7" }
                    ]
                }
            }
        });
        let built = build(&obj, &identity_with_extension_template(), &layout()).unwrap();

        let ext = built.form.extensions["extension-definition--abc"]
            .as_object()
            .unwrap();
        assert_eq!(ext["team"], json!("vendor"));
        assert_eq!(ext["contacts"], json!([]));

        let sub = built.form.sub["contacts"].as_array().unwrap();
        assert_eq!(sub[0]["name"], json!("ops"));
        assert_eq!(sub[0]["email_ref"], json!(""));

        // The reference path was rewritten to the relocated container.
        let path = FieldPath::parse("sub.contacts[0].email_ref").unwrap();
        assert_eq!(
            built.references[&path],
            ExtractedReference::Single {
                value: "email-addr--7".into()
            }
        );
    }

    #[test]
    fn building_is_idempotent_under_extraction() {
        let obj = json!({
            "type": "indicator",
            "id": "indicator--2",
            "name": "detect",
            "created_by_ref": "identity--1",
            "extensions": {
                "ext-a": { "contact_ref": "identity--9" }
            }
        });
        let built = build(&obj, &indicator_template(), &layout()).unwrap();
        let again = extract(&built.form.to_value());
        assert!(again.is_empty());
    }

    #[test]
    fn non_object_input_fails() {
        assert!(matches!(
            build(&json!([1, 2]), &indicator_template(), &layout()),
            Err(BuildError::NotAnObject)
        ));
    }

    #[test]
    fn file_name_stable_across_rebuilds() {
        let obj = json!({
            "type": "indicator",
            "id": "indicator--2",
            "name": "detect"
        });
        let a = build(&obj, &indicator_template(), &layout()).unwrap();
        let b = build(&obj, &indicator_template(), &layout()).unwrap();
        assert_eq!(a.file_name, b.file_name);
    }
}
