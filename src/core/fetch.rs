//! Paginated fetching of Toast listings
//!
//! [`PaginatedFetcher::fetch`] turns page-numbered listing calls into a
//! stream of record batches. Pages are requested from 1 upwards until the
//! first empty page. Records are regrouped into batches of exactly
//! `batch_size` (the last one may be shorter), so a batch never exceeds the
//! configured size regardless of where page boundaries fall.

use crate::adapters::toast::ToastApi;
use crate::config::SyncConfig;
use crate::domain::{Category, ExtractionWindow, ExtractorError, RestaurantGuid, Result};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::sync::Arc;

/// What to fetch: one category of one restaurant over a time window
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub category: Category,
    pub restaurant: RestaurantGuid,
    pub window: ExtractionWindow,
}

/// Pages through a listing and yields batches of records
pub struct PaginatedFetcher {
    api: Arc<dyn ToastApi>,
    page_size: u32,
    batch_size: usize,
}

impl PaginatedFetcher {
    /// Create a fetcher
    ///
    /// # Errors
    ///
    /// Returns a validation error if `page_size` is zero or `batch_size` is
    /// smaller than `page_size`.
    pub fn new(api: Arc<dyn ToastApi>, page_size: u32, batch_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(ExtractorError::Validation(
                "page_size must be at least 1".to_string(),
            ));
        }
        if batch_size < page_size as usize {
            return Err(ExtractorError::Validation(format!(
                "batch_size ({batch_size}) must be >= page_size ({page_size})"
            )));
        }

        Ok(Self {
            api,
            page_size,
            batch_size,
        })
    }

    /// Create a fetcher with the paging settings of `[sync]`
    pub fn from_config(api: Arc<dyn ToastApi>, config: &SyncConfig) -> Result<Self> {
        Self::new(api, config.page_size, config.batch_size)
    }

    /// Stream the records of `request` in batches
    ///
    /// The stream is lazy: a page is only requested when the next batch is
    /// pulled and the accumulation cannot fill it yet. The first error ends
    /// the stream; records accumulated for the unfinished batch are dropped.
    /// Calling `fetch` again starts over from page 1.
    pub fn fetch(&self, request: FetchRequest) -> BoxStream<'static, Result<Vec<Value>>> {
        let cursor = PaginationCursor {
            api: Arc::clone(&self.api),
            request,
            next_page: 1,
            page_size: self.page_size,
            batch_size: self.batch_size,
            accumulated: Vec::new(),
            exhausted: false,
        };

        stream::try_unfold(cursor, PaginationCursor::next_batch).boxed()
    }
}

/// State carried between pulls of the batch stream
struct PaginationCursor {
    api: Arc<dyn ToastApi>,
    request: FetchRequest,
    next_page: u32,
    page_size: u32,
    batch_size: usize,
    accumulated: Vec<Value>,
    exhausted: bool,
}

impl PaginationCursor {
    /// Produce the next batch, requesting pages until it is full or the
    /// listing ends
    async fn next_batch(mut self) -> Result<Option<(Vec<Value>, Self)>> {
        loop {
            if self.accumulated.len() >= self.batch_size {
                let overflow = self.accumulated.split_off(self.batch_size);
                let batch = std::mem::replace(&mut self.accumulated, overflow);
                return Ok(Some((batch, self)));
            }

            if self.exhausted {
                if self.accumulated.is_empty() {
                    return Ok(None);
                }
                let batch = std::mem::take(&mut self.accumulated);
                return Ok(Some((batch, self)));
            }

            self.fetch_next_page().await?;
        }
    }

    async fn fetch_next_page(&mut self) -> Result<()> {
        let page = self.next_page;
        let records = self
            .api
            .fetch_page(
                self.request.category,
                &self.request.restaurant,
                &self.request.window,
                page,
                self.page_size,
            )
            .await?;

        tracing::trace!(
            category = %self.request.category,
            restaurant = %self.request.restaurant,
            page,
            records = records.len(),
            "Page received"
        );

        if records.is_empty() {
            self.exhausted = true;
        } else {
            self.next_page = page.saturating_add(1);
            self.accumulated.extend(records);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::toast::RestaurantDirectoryEntry;
    use crate::domain::ToastApiError;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use futures::TryStreamExt;
    use serde_json::json;
    use std::sync::Mutex;
    use test_case::test_case;

    /// Serves `records` in pages and remembers which pages were requested
    struct FakeListing {
        records: Vec<Value>,
        fail_on_page: Option<u32>,
        requested: Mutex<Vec<u32>>,
    }

    impl FakeListing {
        fn new(count: usize) -> Self {
            Self {
                records: (0..count).map(|i| json!({ "guid": i })).collect(),
                fail_on_page: None,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToastApi for FakeListing {
        async fn fetch_page(
            &self,
            _category: Category,
            _restaurant: &RestaurantGuid,
            _window: &ExtractionWindow,
            page: u32,
            page_size: u32,
        ) -> Result<Vec<Value>> {
            self.requested.lock().unwrap().push(page);
            if self.fail_on_page == Some(page) {
                return Err(ToastApiError::RequestFailed {
                    request: format!("GET orders/v2/ordersBulk page={page}"),
                    status: 500,
                    message: "boom".to_string(),
                }
                .into());
            }

            let start = ((page - 1) * page_size) as usize;
            let end = (start + page_size as usize).min(self.records.len());
            Ok(self.records.get(start..end).unwrap_or_default().to_vec())
        }

        async fn list_restaurants(&self) -> Result<Vec<RestaurantDirectoryEntry>> {
            Ok(Vec::new())
        }

        fn base_url(&self) -> &str {
            "http://fake"
        }
    }

    fn request() -> FetchRequest {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        FetchRequest {
            category: Category::Orders,
            restaurant: RestaurantGuid::new("rest-1").unwrap(),
            window: ExtractionWindow::new(at, at).unwrap(),
        }
    }

    #[test_case(0, 10, 10, &[]; "no records")]
    #[test_case(25, 10, 10, &[10, 10, 5]; "partial last page")]
    #[test_case(30, 10, 10, &[10, 10, 10]; "exact pages")]
    #[test_case(25, 10, 20, &[20, 5]; "batch spans pages")]
    #[test_case(7, 3, 5, &[5, 2]; "overflow carried into next batch")]
    #[test_case(100, 100, 1000, &[100]; "single full page")]
    #[tokio::test]
    async fn test_pagination_properties(
        count: usize,
        page_size: u32,
        batch_size: usize,
        expected_batches: &[usize],
    ) {
        let api = Arc::new(FakeListing::new(count));
        let fetcher = PaginatedFetcher::new(api.clone(), page_size, batch_size).unwrap();

        let batches: Vec<Vec<Value>> = fetcher.fetch(request()).try_collect().await.unwrap();

        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, expected_batches);
        assert!(sizes.iter().all(|&s| s > 0 && s <= batch_size));

        let expected_requests = count.div_ceil(page_size as usize) as u32 + 1;
        assert_eq!(api.requested(), (1..=expected_requests).collect::<Vec<_>>());

        let concatenated: Vec<Value> = batches.into_iter().flatten().collect();
        assert_eq!(concatenated, api.records);
    }

    #[tokio::test]
    async fn test_error_drops_unfinished_batch() {
        let mut listing = FakeListing::new(25);
        listing.fail_on_page = Some(3);
        let api = Arc::new(listing);
        let fetcher = PaginatedFetcher::new(api.clone(), 10, 30).unwrap();

        let items: Vec<Result<Vec<Value>>> = fetcher.fetch(request()).collect().await;

        assert_eq!(items.len(), 1);
        let err = items.into_iter().next().unwrap().unwrap_err();
        assert!(err.is_remote_request());
        assert_eq!(api.requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_error_after_complete_batch() {
        let mut listing = FakeListing::new(25);
        listing.fail_on_page = Some(3);
        let api = Arc::new(listing);
        let fetcher = PaginatedFetcher::new(api, 10, 20).unwrap();

        let items: Vec<Result<Vec<Value>>> = fetcher.fetch(request()).collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().len(), 20);
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_refetch_starts_from_first_page() {
        let api = Arc::new(FakeListing::new(5));
        let fetcher = PaginatedFetcher::new(api.clone(), 5, 5).unwrap();

        let first: Vec<Vec<Value>> = fetcher.fetch(request()).try_collect().await.unwrap();
        let second: Vec<Vec<Value>> = fetcher.fetch(request()).try_collect().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.requested(), vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_new_rejects_invalid_sizes() {
        let api: Arc<dyn ToastApi> = Arc::new(FakeListing::new(0));
        assert!(PaginatedFetcher::new(api.clone(), 0, 10).is_err());
        assert!(PaginatedFetcher::new(api.clone(), 10, 9).is_err());
        assert!(PaginatedFetcher::new(api, 10, 10).is_ok());
    }
}
