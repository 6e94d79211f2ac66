//! Domain layer types and invariants.

pub mod error;
pub mod file_set;
pub mod project;
