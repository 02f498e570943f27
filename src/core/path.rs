//! core::path
//!
//! Dotted field paths with list-index segments.
//!
//! # Syntax
//!
//! A path is a sequence of field names joined by `.`, where any segment
//! may carry one or more `[i]` index suffixes:
//!
//! ```text
//! created_by_ref
//! extensions.extension-definition--abc.contacts[0].email_ref
//! sub.email_addresses[2].address_ref
//! ```
//!
//! Paths are recorded during reference extraction and replayed during
//! restoration, so parsing and display must round-trip exactly.
//!
//! # Examples
//!
//! ```
//! use reweave::core::path::FieldPath;
//!
//! let path = FieldPath::parse("sub.contacts[0].email_ref").unwrap();
//! assert_eq!(path.segments().len(), 4);
//! assert_eq!(path.to_string(), "sub.contacts[0].email_ref");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from path parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid field path: {0}")]
    Invalid(String),
}

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// A named attribute of a map.
    Field(String),
    /// A position in a list.
    Index(usize),
}

/// A parsed field path.
///
/// Paths are immutable; `child`/`index` return extended copies, which
/// keeps the recursive extraction walk free of mutable path state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path (the object itself).
    pub fn root() -> Self {
        FieldPath(Vec::new())
    }

    /// Build a single-field path.
    pub fn field(name: impl Into<String>) -> Self {
        FieldPath(vec![PathSegment::Field(name.into())])
    }

    /// Parse the dotted syntax.
    ///
    /// # Errors
    ///
    /// Returns `PathError::Invalid` for empty paths, empty segments, or
    /// malformed index suffixes.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        if text.is_empty() {
            return Err(PathError::Invalid("path is empty".into()));
        }

        let mut segments = Vec::new();
        for part in text.split('.') {
            let (name, indices) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if name.is_empty() {
                return Err(PathError::Invalid(format!(
                    "`{}` contains an empty segment",
                    text
                )));
            }
            segments.push(PathSegment::Field(name.to_string()));

            let mut rest = indices;
            while !rest.is_empty() {
                let Some(inner) = rest.strip_prefix('[') else {
                    return Err(PathError::Invalid(format!(
                        "`{}` has a malformed index",
                        text
                    )));
                };
                let Some(end) = inner.find(']') else {
                    return Err(PathError::Invalid(format!(
                        "`{}` has an unterminated index",
                        text
                    )));
                };
                let index: usize = inner[..end].parse().map_err(|_| {
                    PathError::Invalid(format!("`{}` has a non-numeric index", text))
                })?;
                segments.push(PathSegment::Index(index));
                rest = &inner[end + 1..];
            }
        }

        Ok(FieldPath(segments))
    }

    /// Extend with a named field.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.into()));
        FieldPath(segments)
    }

    /// Extend with a list index.
    pub fn index(&self, i: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(i));
        FieldPath(segments)
    }

    /// The path's segments, in order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// The first segment's field name, if the path starts with a field.
    pub fn head_field(&self) -> Option<&str> {
        match self.0.first() {
            Some(PathSegment::Field(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    /// True when the path is a single named field.
    pub fn is_plain_field(&self) -> bool {
        self.0.len() == 1 && matches!(self.0[0], PathSegment::Field(_))
    }

    /// Replace a leading `prefix` with `replacement`, if it matches.
    ///
    /// Used by the form builder when relocating embedded sub-object arrays
    /// out of extensions, so recorded reference paths keep addressing the
    /// container the value actually lives in.
    pub fn rebase(&self, prefix: &FieldPath, replacement: &FieldPath) -> Option<FieldPath> {
        if self.0.len() < prefix.0.len() || self.0[..prefix.0.len()] != prefix.0[..] {
            return None;
        }
        let mut segments = replacement.0.clone();
        segments.extend_from_slice(&self.0[prefix.0.len()..]);
        Some(FieldPath(segments))
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                }
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_field() {
        let path = FieldPath::parse("created_by_ref").unwrap();
        assert!(path.is_plain_field());
        assert_eq!(path.head_field(), Some("created_by_ref"));
    }

    #[test]
    fn parses_nested_with_indices() {
        let path = FieldPath::parse("sub.contacts[0].email_ref").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Field("sub".into()),
                PathSegment::Field("contacts".into()),
                PathSegment::Index(0),
                PathSegment::Field("email_ref".into()),
            ]
        );
    }

    #[test]
    fn display_round_trips() {
        for text in [
            "a",
            "a.b",
            "a[0]",
            "a.b[3].c",
            "extensions.extension-definition--abc.f_ref",
            "a[0][1].b",
        ] {
            let path = FieldPath::parse(text).unwrap();
            assert_eq!(path.to_string(), text);
            assert_eq!(FieldPath::parse(&path.to_string()).unwrap(), path);
        }
    }

    #[test]
    fn rejects_malformed() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse("a[").is_err());
        assert!(FieldPath::parse("a[x]").is_err());
        assert!(FieldPath::parse("a[1").is_err());
        assert!(FieldPath::parse("[0]").is_err());
    }

    #[test]
    fn child_and_index_extend() {
        let path = FieldPath::root().child("sub").child("items").index(2);
        assert_eq!(path.to_string(), "sub.items[2]");
    }

    #[test]
    fn rebase_swaps_matching_prefix() {
        let path = FieldPath::parse("extensions.ext-a.contacts[0].email_ref").unwrap();
        let prefix = FieldPath::parse("extensions.ext-a.contacts").unwrap();
        let replacement = FieldPath::parse("sub.contacts").unwrap();

        let rebased = path.rebase(&prefix, &replacement).unwrap();
        assert_eq!(rebased.to_string(), "sub.contacts[0].email_ref");

        let other = FieldPath::parse("extensions.ext-b.f").unwrap();
        assert!(other.rebase(&prefix, &replacement).is_none());
    }
}
