//! Reweave - flatten and reconstitute cross-referenced object batches
//!
//! Reweave converts a batch of richly cross-referenced threat-intel objects
//! into flat, reference-free "data forms", and later rebuilds a fully
//! cross-referenced object graph from those forms under freshly minted
//! identifiers.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Extract -> Build -> Graph -> Sequence -> Restore -> Materialize pipeline
//! - [`core`] - Domain types: identifiers, field paths, templates, forms
//! - [`store`] - Flat-file exchange: batch loading, form files, manifest, outputs
//! - [`ui`] - User output utilities
//!
//! # Correctness Invariants
//!
//! Reweave maintains the following invariants:
//!
//! 1. Extraction never finds anything in a form it built (idempotence)
//! 2. Objects are materialized strictly in creation-sequence order
//! 3. Identifier mappings are append-only; once minted, never reassigned
//! 4. Failures are per-object; a batch run never aborts wholesale

pub mod cli;
pub mod core;
pub mod engine;
pub mod store;
pub mod ui;
