//! ui
//!
//! User output utilities.
//!
//! # Responsibilities
//!
//! - Verbosity-gated progress and warning output
//! - Batch report rendering

pub mod output;

pub use output::Verbosity;
