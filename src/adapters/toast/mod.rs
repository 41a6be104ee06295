//! Toast REST API adapter
//!
//! This module provides the [`ToastApi`] seam used by the paginated fetcher
//! and its reqwest-backed implementation, [`ToastClient`].

pub mod api;
pub mod client;
pub mod models;

pub use api::ToastApi;
pub use client::ToastClient;
pub use models::RestaurantDirectoryEntry;
