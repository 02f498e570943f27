//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ObjectId`] - Validated object identifier (`kind--suffix`)
//!
//! # Validation
//!
//! Identifiers are validated at construction time. Invalid values cannot
//! be represented, so downstream code never re-checks identifier shape.
//! The one shape predicate, [`looks_like_object_id`], is shared by
//! reference extraction and restoration; no other code probes strings
//! for identifier-ness.
//!
//! # Examples
//!
//! ```
//! use reweave::core::types::ObjectId;
//!
//! let id = ObjectId::new("identity--ce31dd38-f69b-45ba-9bcd-2a208bbf8017").unwrap();
//! assert_eq!(id.kind(), "identity");
//!
//! assert!(ObjectId::new("no separator").is_err());
//! assert!(ObjectId::new("identity--").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),
}

/// A validated object identifier.
///
/// Identifiers have the shape `kind--suffix`:
/// - `kind` starts with a lowercase letter and contains only lowercase
///   letters, digits, and single hyphens (e.g. `observed-data`)
/// - `suffix` is non-empty and contains only ASCII alphanumerics and
///   hyphens; it may not itself contain `--`
///
/// The kind is immutable for the life of the object: remapping mints a
/// fresh suffix under the same kind prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Create a new validated object identifier.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidObjectId` if the value does not have the
    /// `kind--suffix` shape described above.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    fn validate(id: &str) -> Result<(), TypeError> {
        let Some((kind, suffix)) = id.split_once("--") else {
            return Err(TypeError::InvalidObjectId(format!(
                "`{}` has no `--` separator",
                id
            )));
        };

        if kind.is_empty() || !kind.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
            return Err(TypeError::InvalidObjectId(format!(
                "`{}` kind must start with a lowercase letter",
                id
            )));
        }
        if !kind
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(TypeError::InvalidObjectId(format!(
                "`{}` kind contains invalid characters",
                id
            )));
        }

        if suffix.is_empty() {
            return Err(TypeError::InvalidObjectId(format!(
                "`{}` has an empty suffix",
                id
            )));
        }
        if suffix.contains("--") {
            return Err(TypeError::InvalidObjectId(format!(
                "`{}` suffix contains `--`",
                id
            )));
        }
        if !suffix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(TypeError::InvalidObjectId(format!(
                "`{}` suffix contains invalid characters",
                id
            )));
        }

        Ok(())
    }

    /// The kind prefix (the part before `--`).
    pub fn kind(&self) -> &str {
        // Validated at construction; the separator is always present.
        self.0.split_once("--").map(|(k, _)| k).unwrap_or(&self.0)
    }

    /// The unique suffix (the part after `--`).
    pub fn suffix(&self) -> &str {
        self.0.split_once("--").map(|(_, s)| s).unwrap_or("")
    }

    /// A short prefix of the suffix, used for deterministic file naming.
    pub fn short(&self) -> &str {
        let suffix = self.suffix();
        &suffix[..suffix.len().min(8)]
    }

    /// Mint a fresh identifier under the same kind prefix.
    ///
    /// The new suffix is a random v4 UUID, so minted identifiers differ
    /// between runs.
    pub fn mint_like(&self) -> ObjectId {
        ObjectId(format!("{}--{}", self.kind(), Uuid::new_v4()))
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The shared identifier-shape predicate.
///
/// Used by reference extraction to detect implicit references (strings
/// that carry an identifier without a `_ref`/`_refs` field name) and by
/// restoration to decide which list elements to remap.
pub fn looks_like_object_id(value: &str) -> bool {
    ObjectId::new(value).is_ok()
}
