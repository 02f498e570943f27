//! store
//!
//! Flat-file exchange between the two halves of the pipeline.
//!
//! # Layout
//!
//! A working directory holds three subdirectories plus two root files:
//!
//! ```text
//! workdir/
//!   input_objects/                one file per loaded input object
//!   data_forms/                   one wrapped form document per object
//!   data_forms/manifest.json      conversion record (extractions, graph,
//!                                 sequence)
//!   output_objects/               one file per reconstituted object
//!   output_objects/all_objects.json   combined array, creation order
//! ```
//!
//! Form file names are content-derived, so converting the same batch
//! twice overwrites instead of accumulating duplicates.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::form::DataForm;
use crate::core::types::ObjectId;
use crate::engine::manifest::Manifest;
use crate::engine::runner::{ConvertedForm, ReconstitutedObject};

/// Errors from file exchange.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access `{path}`: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse `{path}`: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("`{path}`: {message}")]
    Invalid { path: String, message: String },
}

fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn parse_err(path: &Path, source: serde_json::Error) -> StoreError {
    StoreError::Parse {
        path: path.display().to_string(),
        source,
    }
}

/// The fixed paths of one working directory.
#[derive(Debug, Clone)]
pub struct WorkDirs {
    root: PathBuf,
}

impl WorkDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_objects(&self) -> PathBuf {
        self.root.join("input_objects")
    }

    pub fn data_forms(&self) -> PathBuf {
        self.root.join("data_forms")
    }

    pub fn output_objects(&self) -> PathBuf {
        self.root.join("output_objects")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.data_forms().join("manifest.json")
    }

    pub fn all_objects_path(&self) -> PathBuf {
        self.output_objects().join("all_objects.json")
    }

    /// Create the directory tree if it does not exist.
    pub fn ensure(&self) -> Result<(), StoreError> {
        for dir in [
            self.root.clone(),
            self.input_objects(),
            self.data_forms(),
            self.output_objects(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        }
        Ok(())
    }
}

/// Load a batch of objects from a file or directory.
///
/// A directory is walked recursively; every `*.json` file is read in path
/// order. Within a file, a bare object counts once, an array contributes
/// each element, and a bundle document (`{ "objects": [...] }`)
/// contributes its members.
pub fn load_objects(path: &Path) -> Result<Vec<Value>, StoreError> {
    let mut files = Vec::new();
    if path.is_dir() {
        collect_json_files(path, &mut files)?;
    } else {
        files.push(path.to_path_buf());
    }

    let mut objects = Vec::new();
    for file in files {
        let text = std::fs::read_to_string(&file).map_err(|e| io_err(&file, e))?;
        let value: Value = serde_json::from_str(&text).map_err(|e| parse_err(&file, e))?;
        flatten_into(value, &file, &mut objects)?;
    }
    Ok(objects)
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), StoreError> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| io_err(dir, e))?
        .into_iter()
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    for entry in entries {
        if entry.is_dir() {
            collect_json_files(&entry, out)?;
        } else if entry.extension().and_then(|e| e.to_str()) == Some("json") {
            out.push(entry);
        }
    }
    Ok(())
}

fn flatten_into(value: Value, path: &Path, out: &mut Vec<Value>) -> Result<(), StoreError> {
    match value {
        Value::Array(items) => out.extend(items),
        Value::Object(mut map) => {
            // Bundle documents contribute their members, not themselves.
            match map.remove("objects") {
                Some(Value::Array(items)) => out.extend(items),
                Some(objects) => {
                    map.insert("objects".into(), objects);
                    out.push(Value::Object(map));
                }
                None => out.push(Value::Object(map)),
            }
        }
        _ => {
            return Err(StoreError::Invalid {
                path: path.display().to_string(),
                message: "document is neither an object nor an array".into(),
            })
        }
    }
    Ok(())
}

/// Snapshot the loaded inputs into `input_objects/`.
///
/// Objects with a usable identifier are named `<kind>_<short>.json`;
/// anything else is named by batch position.
pub fn copy_inputs(dirs: &WorkDirs, objects: &[Value]) -> Result<(), StoreError> {
    for (position, object) in objects.iter().enumerate() {
        let name = object
            .get("id")
            .and_then(Value::as_str)
            .and_then(|raw| ObjectId::new(raw).ok())
            .map(|id| format!("{}_{}.json", id.kind(), id.short()))
            .unwrap_or_else(|| format!("object_{}.json", position));
        write_json(&dirs.input_objects().join(name), object)?;
    }
    Ok(())
}

/// Write every converted form as a wrapped document in `data_forms/`.
pub fn write_forms(dirs: &WorkDirs, forms: &[ConvertedForm]) -> Result<(), StoreError> {
    for form in forms {
        let doc = form.form.wrapped(&form.form_name);
        write_json(&dirs.data_forms().join(&form.file_name), &doc)?;
    }
    Ok(())
}

/// Read back the forms a manifest names, keyed by old identifier.
///
/// A missing form file is not an error here; the object simply stays
/// absent from the map and fails per-object downstream.
pub fn read_forms(
    dirs: &WorkDirs,
    manifest: &Manifest,
) -> Result<BTreeMap<ObjectId, DataForm>, StoreError> {
    let mut forms = BTreeMap::new();
    for record in &manifest.records {
        let path = dirs.data_forms().join(&record.filename);
        if !path.exists() {
            continue;
        }
        let text = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let doc: Value = serde_json::from_str(&text).map_err(|e| parse_err(&path, e))?;
        let (_, form) = DataForm::from_wrapped(&doc).map_err(|e| StoreError::Invalid {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        forms.insert(record.object_id.clone(), form);
    }
    Ok(forms)
}

/// Write the manifest.
pub fn write_manifest(dirs: &WorkDirs, manifest: &Manifest) -> Result<(), StoreError> {
    write_json(&dirs.manifest_path(), manifest)
}

/// Read the manifest.
pub fn read_manifest(dirs: &WorkDirs) -> Result<Manifest, StoreError> {
    let path = dirs.manifest_path();
    let text = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_json::from_str(&text).map_err(|e| parse_err(&path, e))
}

/// Write each reconstituted object plus the combined `all_objects.json`.
///
/// Per-object files are named `<kind>_<short>.json` from the new
/// identifier; the combined file lists objects in creation order.
pub fn write_outputs(dirs: &WorkDirs, objects: &[ReconstitutedObject]) -> Result<(), StoreError> {
    for reconstituted in objects {
        let id = &reconstituted.new_id;
        let name = format!("{}_{}.json", id.kind(), id.short());
        write_json(&dirs.output_objects().join(name), &reconstituted.object)?;
    }
    let all: Vec<&Value> = objects.iter().map(|o| &o.object).collect();
    write_json(&dirs.all_objects_path(), &all)
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<(), StoreError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| StoreError::Invalid {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    std::fs::write(path, text).map_err(|e| io_err(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_flattens_files_arrays_and_bundles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            json!({ "type": "identity", "id": "identity--1" }).to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            json!([
                { "type": "task", "id": "task--4" },
                { "type": "task", "id": "task--5" }
            ])
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("c.json"),
            json!({
                "type": "bundle",
                "objects": [ { "type": "indicator", "id": "indicator--2" } ]
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let objects = load_objects(dir.path()).unwrap();
        assert_eq!(objects.len(), 4);
        // Path order: a.json, b.json, c.json.
        assert_eq!(objects[0]["id"], json!("identity--1"));
        assert_eq!(objects[3]["id"], json!("indicator--2"));
    }

    #[test]
    fn load_descends_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(
            dir.path().join("nested").join("x.json"),
            json!({ "type": "identity", "id": "identity--1" }).to_string(),
        )
        .unwrap();
        let objects = load_objects(dir.path()).unwrap();
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn load_rejects_scalar_documents() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.json");
        std::fs::write(&file, "42").unwrap();
        assert!(matches!(
            load_objects(&file),
            Err(StoreError::Invalid { .. })
        ));
    }

    #[test]
    fn ensure_creates_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = WorkDirs::new(dir.path().join("work"));
        dirs.ensure().unwrap();
        assert!(dirs.input_objects().is_dir());
        assert!(dirs.data_forms().is_dir());
        assert!(dirs.output_objects().is_dir());
    }

    #[test]
    fn input_snapshot_names_by_kind_and_short_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = WorkDirs::new(dir.path());
        dirs.ensure().unwrap();

        copy_inputs(
            &dirs,
            &[
                json!({ "type": "identity",
                        "id": "identity--ce31dd38-f69b-45ba-9bcd-2a208bbf8017" }),
                json!({ "type": "broken" }),
            ],
        )
        .unwrap();

        assert!(dirs.input_objects().join("identity_ce31dd38.json").exists());
        assert!(dirs.input_objects().join("object_1.json").exists());
    }

    #[test]
    fn manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = WorkDirs::new(dir.path());
        dirs.ensure().unwrap();

        let manifest = Manifest::new(
            Vec::new(),
            Vec::new(),
            &crate::engine::sequence::CreationSequence::default(),
        );
        write_manifest(&dirs, &manifest).unwrap();
        let read = read_manifest(&dirs).unwrap();
        assert_eq!(read, manifest);
    }

    #[test]
    fn forms_roundtrip_and_missing_files_are_skipped() {
        use crate::core::layout::FormLayout;
        use crate::core::template::{Template, TemplateCatalog};
        use crate::engine::materialize::GenericMaterializer;
        use crate::engine::runner::Runner;
        use crate::ui::output::Verbosity;

        let template: Template = serde_json::from_value(json!({
            "kind": "identity",
            "base_required": { "type": {}, "id": {}, "created": {}, "modified": {} },
            "object": { "name": {} }
        }))
        .unwrap();
        let catalog = TemplateCatalog::from_templates([template]).unwrap();
        let layout = FormLayout::default();
        let runner = Runner::new(&catalog, &layout, GenericMaterializer, Verbosity::Quiet);

        let converted = runner.convert_batch(&[
            json!({ "type": "identity", "id": "identity--1", "name": "Acme" }),
            json!({ "type": "identity", "id": "identity--2", "name": "Globex" }),
        ]);

        let dir = tempfile::tempdir().unwrap();
        let dirs = WorkDirs::new(dir.path());
        dirs.ensure().unwrap();
        write_forms(&dirs, &converted.forms).unwrap();

        // Remove one form file; read_forms should still succeed.
        std::fs::remove_file(dirs.data_forms().join(&converted.forms[1].file_name)).unwrap();

        let forms = read_forms(&dirs, &converted.manifest).unwrap();
        assert_eq!(forms.len(), 1);
        assert!(forms.contains_key(&ObjectId::new("identity--1").unwrap()));
    }
}
