//! engine::materialize
//!
//! Rebuilds a concrete object from a restored form.
//!
//! # Rules
//!
//! - `base_required` is emitted verbatim, except the self identifier
//!   (replaced with the freshly minted one) and blank auto-managed
//!   timestamps (stamped with the current time)
//! - `base_optional` and `object` drop placeholder values the builder
//!   inserted for absent attributes (`""`, `null`, `[]`)
//! - Non-empty extensions are emitted under `extensions`
//! - `sub` containers are folded back into the extension that originally
//!   held them (its `[]` placeholder is replaced); a container with no
//!   claiming extension lands at the top level
//!
//! The trait seam exists so kinds with bespoke assembly rules can plug in
//! without touching the pipeline; the generic materializer covers every
//! template-described kind.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::form::DataForm;
use crate::core::layout::FormLayout;
use crate::core::types::ObjectId;

/// Errors from object materialization.
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("form claims kind `{form_kind}`, expected `{kind}`")]
    KindMismatch { kind: String, form_kind: String },
}

/// Assembles one object from a restored form.
pub trait Materializer {
    fn materialize(
        &self,
        kind: &str,
        form: &DataForm,
        new_id: &ObjectId,
        layout: &FormLayout,
    ) -> Result<Value, MaterializeError>;
}

/// The template-driven materializer used for every ordinary kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericMaterializer;

impl Materializer for GenericMaterializer {
    fn materialize(
        &self,
        kind: &str,
        form: &DataForm,
        new_id: &ObjectId,
        layout: &FormLayout,
    ) -> Result<Value, MaterializeError> {
        if let Some(form_kind) = form.base_required.get("type").and_then(Value::as_str) {
            if !form_kind.is_empty() && form_kind != kind {
                return Err(MaterializeError::KindMismatch {
                    kind: kind.to_string(),
                    form_kind: form_kind.to_string(),
                });
            }
        }

        // One timestamp for the whole object, so created == modified.
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut object = Map::new();
        for (field, value) in &form.base_required {
            let emitted = if field == "id" {
                Value::String(new_id.to_string())
            } else if is_blank(value)
                && layout.regenerated_timestamps().any(|f| f == field.as_str())
            {
                Value::String(now.clone())
            } else {
                value.clone()
            };
            object.insert(field.clone(), emitted);
        }

        for section in [&form.base_optional, &form.object] {
            for (field, value) in section {
                if is_placeholder(value) {
                    continue;
                }
                object.insert(field.clone(), value.clone());
            }
        }

        let mut extensions = Map::new();
        for (ext_id, ext_value) in &form.extensions {
            if is_placeholder(ext_value) || ext_value.as_object().is_some_and(Map::is_empty) {
                continue;
            }
            extensions.insert(ext_id.clone(), ext_value.clone());
        }

        for (key, container) in &form.sub {
            if is_placeholder(container) {
                continue;
            }
            let claimed = extensions.values_mut().find_map(|ext| {
                ext.as_object_mut()
                    .and_then(|ext| ext.get_mut(key.as_str()))
            });
            match claimed {
                Some(slot) => *slot = container.clone(),
                None => {
                    object.insert(key.clone(), container.clone());
                }
            }
        }

        if !extensions.is_empty() {
            object.insert("extensions".into(), Value::Object(extensions));
        }

        Ok(Value::Object(object))
    }
}

fn is_blank(value: &Value) -> bool {
    value.as_str() == Some("")
}

/// A value the builder inserted for an absent attribute.
fn is_placeholder(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn materialize(form: Value, kind: &str, new_id: &str) -> Value {
        let form: DataForm = serde_json::from_value(form).unwrap();
        GenericMaterializer
            .materialize(
                kind,
                &form,
                &ObjectId::new(new_id).unwrap(),
                &FormLayout::default(),
            )
            .unwrap()
    }

    #[test]
    fn id_and_timestamps_regenerated() {
        let object = materialize(
            json!({
                "base_required": {
                    "type": "identity", "id": "", "created": "", "modified": ""
                },
                "object": { "name": "Acme" }
            }),
            "identity",
            "identity--aaaaaaaa-1111-4222-8333-444444444444",
        );

        assert_eq!(
            object["id"],
            json!("identity--aaaaaaaa-1111-4222-8333-444444444444")
        );
        assert_eq!(object["created"], object["modified"]);
        let stamp = object["created"].as_str().unwrap();
        assert!(stamp.ends_with('Z'));
        assert!(stamp.contains('T'));
        assert_eq!(object["name"], json!("Acme"));
    }

    #[test]
    fn supplied_timestamps_kept() {
        let object = materialize(
            json!({
                "base_required": {
                    "type": "identity", "id": "",
                    "created": "2021-06-01T00:00:00.000Z", "modified": ""
                }
            }),
            "identity",
            "identity--1",
        );
        assert_eq!(object["created"], json!("2021-06-01T00:00:00.000Z"));
        assert_ne!(object["modified"], object["created"]);
    }

    #[test]
    fn placeholders_dropped() {
        let object = materialize(
            json!({
                "base_required": { "type": "indicator", "id": "" },
                "base_optional": { "labels": [], "confidence": null },
                "object": { "name": "detect", "pattern": "" }
            }),
            "indicator",
            "indicator--2",
        );

        let map = object.as_object().unwrap();
        assert!(!map.contains_key("labels"));
        assert!(!map.contains_key("confidence"));
        assert!(!map.contains_key("pattern"));
        assert_eq!(map["name"], json!("detect"));
    }

    #[test]
    fn sub_containers_fold_back_into_their_extension() {
        let object = materialize(
            json!({
                "base_required": { "type": "identity", "id": "" },
                "extensions": {
                    "extension-definition--abc": { "team": "vendor", "contacts": [] }
                },
                "sub": {
                    "contacts": [ { "name": "ops", "email_ref": "email-addr--new" } ]
                }
            }),
            "identity",
            "identity--1",
        );

        let ext = &object["extensions"]["extension-definition--abc"];
        assert_eq!(ext["team"], json!("vendor"));
        assert_eq!(ext["contacts"][0]["name"], json!("ops"));
        // The container lives in the extension, not at top level.
        assert!(!object.as_object().unwrap().contains_key("contacts"));
    }

    #[test]
    fn unclaimed_sub_container_lands_at_top_level() {
        let object = materialize(
            json!({
                "base_required": { "type": "event", "id": "" },
                "sub": {
                    "changed_objects": [ { "state": "new" } ]
                }
            }),
            "event",
            "event--1",
        );
        assert_eq!(object["changed_objects"][0]["state"], json!("new"));
        assert!(!object.as_object().unwrap().contains_key("extensions"));
    }

    #[test]
    fn empty_extensions_omitted() {
        let object = materialize(
            json!({
                "base_required": { "type": "identity", "id": "" },
                "extensions": { "extension-definition--abc": {} }
            }),
            "identity",
            "identity--1",
        );
        assert!(!object.as_object().unwrap().contains_key("extensions"));
    }

    #[test]
    fn kind_mismatch_rejected() {
        let form: DataForm = serde_json::from_value(json!({
            "base_required": { "type": "malware" }
        }))
        .unwrap();
        let result = GenericMaterializer.materialize(
            "identity",
            &form,
            &ObjectId::new("identity--1").unwrap(),
            &FormLayout::default(),
        );
        assert!(matches!(
            result,
            Err(MaterializeError::KindMismatch { .. })
        ));
    }
}
