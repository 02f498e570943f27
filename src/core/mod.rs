//! core
//!
//! Domain types, templates, and form representations.
//!
//! # Modules
//!
//! - [`types`] - Validated identifiers and the shared id-shape predicate
//! - [`path`] - Dotted field paths with list-index segments
//! - [`layout`] - Versioned form layout configuration
//! - [`template`] - Per-kind field schemas and the template catalog
//! - [`form`] - The flattened, reference-free data form

pub mod form;
pub mod layout;
pub mod path;
pub mod template;
pub mod types;

pub use form::DataForm;
pub use layout::{FormLayout, Section};
pub use path::{FieldPath, PathSegment};
pub use template::{FieldDef, RefArity, Template, TemplateCatalog};
pub use types::{looks_like_object_id, ObjectId};
