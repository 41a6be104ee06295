//! Output tables
//!
//! - [`table_sink`] - Lazily opened per-table CSV writers
//! - [`manifest`] - Table definitions and manifest files

pub mod manifest;
pub mod table_sink;

pub use manifest::{Manifest, TableDefinition};
pub use table_sink::{ExtraColumn, StreamingTableSink};
