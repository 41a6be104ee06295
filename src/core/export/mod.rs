//! Export orchestration
//!
//! This module provides the run-level logic of the extractor:
//! - Extraction window policy
//! - Export coordination and orchestration
//! - Summary and reporting

pub mod coordinator;
pub mod summary;
pub mod window;

pub use coordinator::ExportCoordinator;
pub use summary::ExportSummary;
pub use window::resolve_window;
