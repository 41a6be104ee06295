//! External system integrations for the extractor.
//!
//! - [`toast`] - Toast REST API (authentication, orders, restaurant
//!   configuration and the restaurant directory)
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. The rest of the crate depends on
//! the [`toast::ToastApi`] trait, never on the HTTP client directly.
//!
//! ```rust,no_run
//! use toast_extractor::adapters::toast::{ToastApi, ToastClient};
//! use toast_extractor::config::load_config;
//! use toast_extractor::core::rate_limit::RateLimiter;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("toast.toml")?;
//! let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
//! let client = ToastClient::connect(&config.credentials, limiter).await?;
//! let restaurants = client.list_restaurants().await?;
//! println!("{} restaurants visible", restaurants.len());
//! # Ok(())
//! # }
//! ```

pub mod toast;
