//! core::layout
//!
//! Versioned form layout configuration.
//!
//! # Design
//!
//! The layout struct replaces the per-script attribute tables the legacy
//! tooling duplicated: which attributes are auto-managed, which sections a
//! plain field may live in, and in what order restoration searches them.
//! It is constructed once and threaded through the engine explicitly;
//! nothing reads it from ambient state.
//!
//! A layout can be loaded from a TOML file for deployments whose templates
//! use non-default auto-managed attributes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current layout schema version.
pub const LAYOUT_VERSION: u32 = 1;

/// Errors from layout loading.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read layout file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse layout file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unsupported layout version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

/// The five sections of a data form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    BaseRequired,
    BaseOptional,
    Object,
    Extensions,
    Sub,
}

impl Section {
    /// The JSON key for this section.
    pub fn key(self) -> &'static str {
        match self {
            Section::BaseRequired => "base_required",
            Section::BaseOptional => "base_optional",
            Section::Object => "object",
            Section::Extensions => "extensions",
            Section::Sub => "sub",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Form layout configuration.
///
/// # Invariants
///
/// - `auto_managed` attributes are always emitted as empty placeholders by
///   the builder and regenerated at materialization
/// - `search_order` lists the plain sections a single-segment reference
///   path may resolve into, in priority order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormLayout {
    /// Layout schema version.
    pub version: u32,

    /// Attributes regenerated on reconstitution (self identifier plus
    /// creation and modification times).
    pub auto_managed: Vec<String>,

    /// Search order for plain (single-segment) field paths.
    pub search_order: Vec<Section>,
}

impl Default for FormLayout {
    fn default() -> Self {
        Self {
            version: LAYOUT_VERSION,
            auto_managed: vec!["id".into(), "created".into(), "modified".into()],
            search_order: vec![
                Section::BaseRequired,
                Section::BaseOptional,
                Section::Object,
                Section::Sub,
            ],
        }
    }
}

impl FormLayout {
    /// Parse a layout from TOML text.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or a version mismatch.
    pub fn from_toml_str(text: &str) -> Result<Self, LayoutError> {
        let layout: FormLayout = toml::from_str(text)?;
        if layout.version != LAYOUT_VERSION {
            return Err(LayoutError::Version {
                found: layout.version,
                expected: LAYOUT_VERSION,
            });
        }
        Ok(layout)
    }

    /// Load a layout from a TOML file.
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// True when the attribute is regenerated at materialization.
    pub fn is_auto_managed(&self, field: &str) -> bool {
        self.auto_managed.iter().any(|f| f == field)
    }

    /// The auto-managed attributes other than the self identifier.
    ///
    /// These are the timestamp attributes the materializer regenerates.
    pub fn regenerated_timestamps(&self) -> impl Iterator<Item = &str> {
        self.auto_managed
            .iter()
            .map(String::as_str)
            .filter(|f| *f != "id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let layout = FormLayout::default();
        assert_eq!(layout.version, LAYOUT_VERSION);
        assert!(layout.is_auto_managed("id"));
        assert!(layout.is_auto_managed("created"));
        assert!(layout.is_auto_managed("modified"));
        assert!(!layout.is_auto_managed("name"));
        assert_eq!(layout.search_order.first(), Some(&Section::BaseRequired));
    }

    #[test]
    fn regenerated_timestamps_exclude_id() {
        let layout = FormLayout::default();
        let stamps: Vec<&str> = layout.regenerated_timestamps().collect();
        assert_eq!(stamps, vec!["created", "modified"]);
    }

    #[test]
    fn toml_roundtrip() {
        let layout = FormLayout::default();
        let text = toml::to_string(&layout).unwrap();
        let parsed = FormLayout::from_toml_str(&text).unwrap();
        assert_eq!(parsed, layout);
    }

    #[test]
    fn rejects_version_mismatch() {
        let text = r#"
            version = 99
            auto_managed = ["id"]
            search_order = ["object"]
        "#;
        let err = FormLayout::from_toml_str(text).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Version {
                found: 99,
                expected: LAYOUT_VERSION
            }
        ));
    }
}
