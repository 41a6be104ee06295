//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels (`RUST_LOG` overrides)
//! - Console output
//! - JSON-formatted local file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use toast_extractor::logging::init_logging;
//! use toast_extractor::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an extraction run
///
/// # Example
///
/// ```no_run
/// use toast_extractor::log_export_start;
///
/// let restaurants = 3;
/// let window = "2024-05-01T00:00:00+00:00 .. 2024-05-02T00:00:00+00:00";
/// log_export_start!(restaurants, window);
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($restaurants:expr, $window:expr) => {
        tracing::info!(
            restaurants = $restaurants,
            window = %$window,
            "Starting export"
        );
    };
}

/// Log a batch written to the output tables
///
/// # Example
///
/// ```no_run
/// use toast_extractor::log_batch_written;
///
/// log_batch_written!("rest-1", "orders", 100, 340);
/// ```
#[macro_export]
macro_rules! log_batch_written {
    ($restaurant:expr, $category:expr, $records:expr, $rows:expr) => {
        tracing::debug!(
            restaurant = %$restaurant,
            category = %$category,
            records = $records,
            rows = $rows,
            "Batch written"
        );
    };
}
