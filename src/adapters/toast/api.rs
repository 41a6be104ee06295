//! Toast API trait definition
//!
//! This module defines the `ToastApi` trait that abstracts the remote calls
//! the extractor makes. The fetcher and coordinator only talk to this trait,
//! so tests can substitute an in-memory implementation.

use super::models::RestaurantDirectoryEntry;
use crate::domain::{Category, ExtractionWindow, RestaurantGuid, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Remote operations required by an extraction run
///
/// Implementations are expected to apply the rate limiter to every outbound
/// request and to authenticate before the first call.
#[async_trait]
pub trait ToastApi: Send + Sync {
    /// Fetch one page of `category` records for a restaurant
    ///
    /// Pages are numbered from 1. An empty vector marks the end of the
    /// listing. Single-document categories return the document as page 1 and
    /// nothing afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ToastApiError::RequestFailed` for a non-success response,
    /// naming the request and carrying the server message.
    async fn fetch_page(
        &self,
        category: Category,
        restaurant: &RestaurantGuid,
        window: &ExtractionWindow,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Value>>;

    /// List every restaurant visible to the API client
    ///
    /// # Errors
    ///
    /// Returns an error if the directory request fails.
    async fn list_restaurants(&self) -> Result<Vec<RestaurantDirectoryEntry>>;

    /// Base URL of the API, for logging
    fn base_url(&self) -> &str;
}
