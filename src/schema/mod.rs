//! Field metadata inference
//!
//! Infers a value kind and string format for every top-level record field,
//! for registration alongside the compacted key map.

pub mod catalog;

pub use catalog::{FieldCatalog, FieldKind, FieldSummary};
