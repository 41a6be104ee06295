//! Table mappings and record flattening
//!
//! - [`model`] - Declarative descriptions and the validated mapping tree
//! - [`path`] - Dot-separated source path resolution
//! - [`flatten`] - Record to per-table rows
//! - [`catalog`] - Per-category mapping lookup

pub mod catalog;
pub mod flatten;
pub mod model;
pub mod path;

pub use catalog::{schema_catalog, MappingCatalog};
pub use flatten::{flatten, FlattenedRecordSet, Row};
pub use model::{MappingDescription, TableMapping, TableSchema};
