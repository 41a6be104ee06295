//! Core extraction logic.
//!
//! # Modules
//!
//! - [`rate_limit`] - Dual sliding-window limiter for outbound calls
//! - [`fetch`] - Paginated fetching into record batches
//! - [`mapping`] - Table mapping model and record flattener
//! - [`sink`] - Streaming CSV output with manifests
//! - [`state`] - Watermark persistence for resumed runs
//! - [`export`] - Run orchestration and summary
//!
//! # Export Workflow
//!
//! 1. **Load State**: Read the watermark of the last successful run
//! 2. **Resolve**: Pick the extraction window and the restaurants
//! 3. **Fetch**: Page through each endpoint, rate limited, in batches
//! 4. **Flatten**: Turn each batch into rows of the mapped tables
//! 5. **Write**: Append the rows to one CSV per table
//! 6. **Commit**: Publish the tables and manifests, then advance the watermark
//!
//! # Example
//!
//! ```rust,no_run
//! use toast_extractor::config::load_config;
//! use toast_extractor::core::export::ExportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("toast.toml")?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let coordinator = ExportCoordinator::new(config, shutdown_rx).await?;
//! let summary = coordinator.execute_export().await?;
//!
//! println!("Restaurants: {}", summary.restaurants_processed);
//! println!("Rows written: {}", summary.total_rows());
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod fetch;
pub mod mapping;
pub mod rate_limit;
pub mod sink;
pub mod state;
