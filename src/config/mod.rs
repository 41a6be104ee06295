//! Configuration management for the extractor.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! The extractor reads a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `TOAST_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Comprehensive validation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use toast_extractor::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("toast.toml")?;
//!
//! println!("Toast API: {}", config.credentials.base_url);
//! println!("Sync mode: {}", config.sync.mode);
//! println!("Load type: {}", config.destination.load_type);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`CredentialsConfig`] - Toast API URL, machine client credentials, retries
//! - [`RestaurantsConfig`] - Explicit GUIDs or management groups
//! - [`SyncConfig`] - Window policy, dates, page and batch size
//! - [`RateLimitConfig`] - Short and long call budgets
//! - [`DestinationConfig`] - Output directory and load type
//! - [`StateConfig`] - Watermark file
//! - [`MappingConfig`] - Optional mapping document override
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! endpoints = ["configuration", "orders"]
//!
//! [credentials]
//! base_url = "https://ws-api.toasttab.com"
//! client_id = "your-client-id"
//! client_secret = "${TOAST_CLIENT_SECRET}"
//!
//! [restaurants]
//! select_type = "explicit"
//! restaurant_ids = ["d3a5c1f0-0000-4000-8000-000000000001"]
//!
//! [sync]
//! mode = "resume"
//!
//! [destination]
//! load_type = "incremental_load"
//! output_dir = "out/tables"
//! ```

pub mod dates;
pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, CredentialsConfig, DestinationConfig, ExtractorConfig, LoadType,
    LoggingConfig, MappingConfig, RateLimitConfig, RestaurantSelection, RestaurantsConfig,
    RetryConfig, StateConfig, SyncConfig, SyncMode,
};
pub use secret::{secret_string, SecretString, SecretValue};
