// Toast Extractor - Toast POS data extraction tool
// Copyright (c) 2025 Toast Extractor Contributors
// Licensed under the MIT License

//! # Toast Extractor - Toast POS to CSV tables
//!
//! Toast Extractor is an ETL tool built in Rust that pulls orders and
//! restaurant configuration from the Toast POS REST API and writes them as
//! relational CSV tables for downstream loading.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Extracting** records page by page under a two-window rate limit
//! - **Flattening** nested JSON documents into parent and child tables
//! - **Writing** streaming CSV tables with a manifest per table
//! - **Tracking** the last successful run for incremental extraction
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (fetching, mapping, sink, state, export)
//! - [`adapters`] - External integrations (Toast REST API)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use toast_extractor::config::load_config;
//! use toast_extractor::core::export::ExportCoordinator;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("toast.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//!     let coordinator = ExportCoordinator::new(config, shutdown_rx).await?;
//!     let summary = coordinator.execute_export().await?;
//!
//!     println!("Wrote {} rows", summary.total_rows());
//!     Ok(())
//! }
//! ```
//!
//! ## Flattening
//!
//! A table mapping describes how one JSON document decomposes into tables.
//! Child rows carry the parent's primary key as `<parent table>_<key>`:
//!
//! ```rust
//! use toast_extractor::core::mapping::{flatten, MappingCatalog};
//! use toast_extractor::domain::Category;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mapping = MappingCatalog::embedded()?.build(Category::Orders)?;
//! let order = json!({"guid": "o-1", "checks": [{"guid": "c-1"}]});
//!
//! let tables = flatten(&order, &mapping)?;
//! assert_eq!(tables.rows("orders").map(|rows| rows.len()), Some(1));
//! # Ok(())
//! # }
//! ```
//!
//! ## Incremental Sync
//!
//! In `resume` mode every run extracts from the start of the last successful
//! run up to its own start. The watermark only advances once every output
//! table has been finalized, so a failed or interrupted run is retried in
//! full by the next one.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
