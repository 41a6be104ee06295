//! Export coordinator - main orchestrator for the extraction process
//!
//! This module drives one run end to end: window resolution, restaurant
//! selection, fetching, flattening and writing, then the commit of the
//! output tables and the watermark.

use crate::adapters::toast::{ToastApi, ToastClient};
use crate::config::{ExtractorConfig, RestaurantSelection};
use crate::core::export::summary::ExportSummary;
use crate::core::export::window::resolve_window;
use crate::core::fetch::{FetchRequest, PaginatedFetcher};
use crate::core::mapping::{flatten, schema_catalog, MappingCatalog, TableMapping};
use crate::core::rate_limit::RateLimiter;
use crate::core::sink::{ExtraColumn, StreamingTableSink};
use crate::core::state::StateManager;
use crate::domain::ids::parse_restaurant_list;
use crate::domain::{
    Category, ExtractionWindow, ExtractorError, ManagementGroupGuid, RestaurantGuid, Result,
};
use crate::{log_batch_written, log_export_start};
use chrono::Utc;
use futures::TryStreamExt;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Export coordinator
pub struct ExportCoordinator {
    config: ExtractorConfig,
    api: Arc<dyn ToastApi>,
    limiter: Arc<RateLimiter>,
    state_manager: StateManager,
    mappings: Vec<(Category, TableMapping)>,
    shutdown_signal: watch::Receiver<bool>,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    ///
    /// Builds the table mappings, then authenticates against the Toast API.
    ///
    /// # Errors
    ///
    /// Returns a mapping error for an invalid mapping document and
    /// `ToastApiError::AuthenticationFailed` if the credentials are rejected.
    pub async fn new(
        config: ExtractorConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Result<Self> {
        let mappings = build_mappings(&config)?;

        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let client = ToastClient::connect(&config.credentials, Arc::clone(&limiter)).await?;

        Ok(Self::assemble(
            config,
            Arc::new(client),
            limiter,
            mappings,
            shutdown_signal,
        ))
    }

    /// Create a coordinator around an existing API implementation
    ///
    /// # Errors
    ///
    /// Returns a mapping error for an invalid mapping document.
    pub fn with_api(
        config: ExtractorConfig,
        api: Arc<dyn ToastApi>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Result<Self> {
        let mappings = build_mappings(&config)?;
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        Ok(Self::assemble(config, api, limiter, mappings, shutdown_signal))
    }

    fn assemble(
        config: ExtractorConfig,
        api: Arc<dyn ToastApi>,
        limiter: Arc<RateLimiter>,
        mappings: Vec<(Category, TableMapping)>,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Self {
        let state_manager = StateManager::from_config(&config.state);
        Self {
            config,
            api,
            limiter,
            state_manager,
            mappings,
            shutdown_signal,
        }
    }

    /// Execute the extraction
    ///
    /// This method:
    /// 1. Records the run start time and loads the watermark
    /// 2. Resolves the extraction window and the restaurants
    /// 3. For each restaurant, for each configured endpoint:
    ///    - Streams record batches from the paginated fetcher
    ///    - Flattens each batch into table rows
    ///    - Appends the rows to the output tables
    /// 4. Finalizes every output table
    /// 5. Advances the watermark to the run start time
    ///
    /// Any failure, including a shutdown signal, discards the partial output
    /// and leaves the watermark untouched.
    pub async fn execute_export(&self) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let run_started_at = Utc::now();

        let watermark = self.state_manager.load().await?;
        let window = resolve_window(&self.config.sync, watermark, run_started_at)?;
        let restaurants = self.resolve_restaurants().await?;

        log_export_start!(restaurants.len(), window);

        let mut summary = ExportSummary::new(run_started_at, window);
        let fetcher = PaginatedFetcher::from_config(Arc::clone(&self.api), &self.config.sync)?;
        let mut sink = StreamingTableSink::new(
            Path::new(&self.config.destination.output_dir),
            self.config.destination.load_type,
            schema_catalog(&self.mappings),
        )?;

        if let Err(e) = self
            .extract_all(&fetcher, &restaurants, window, &mut sink, &mut summary)
            .await
        {
            tracing::error!(
                error = %e,
                restaurants_completed = summary.restaurants_processed,
                "Export failed, discarding partial output"
            );
            sink.abort();
            return Err(e);
        }

        summary.tables = sink.finalize_all()?;
        self.state_manager.advance(run_started_at).await?;
        summary.watermark = Some(run_started_at);

        summary.calls_throttled = self.limiter.calls_throttled();
        summary.rate_limit_wait = self.limiter.total_wait();
        summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();

        Ok(summary)
    }

    async fn extract_all(
        &self,
        fetcher: &PaginatedFetcher,
        restaurants: &[RestaurantGuid],
        window: ExtractionWindow,
        sink: &mut StreamingTableSink,
        summary: &mut ExportSummary,
    ) -> Result<()> {
        for restaurant in restaurants {
            self.check_shutdown()?;

            tracing::info!(restaurant = %restaurant, "Processing restaurant");

            let extra = self
                .config
                .destination
                .include_restaurant_column
                .then(|| {
                    ExtraColumn::new(
                        self.config.destination.restaurant_column.as_str(),
                        restaurant.as_str(),
                    )
                });

            for (category, mapping) in &self.mappings {
                self.extract_category(
                    fetcher,
                    FetchRequest {
                        category: *category,
                        restaurant: restaurant.clone(),
                        window,
                    },
                    mapping,
                    extra.as_ref(),
                    sink,
                    summary,
                )
                .await?;
            }

            summary.restaurants_processed += 1;
        }
        Ok(())
    }

    async fn extract_category(
        &self,
        fetcher: &PaginatedFetcher,
        request: FetchRequest,
        mapping: &TableMapping,
        extra: Option<&ExtraColumn>,
        sink: &mut StreamingTableSink,
        summary: &mut ExportSummary,
    ) -> Result<()> {
        let category = request.category;
        let restaurant = request.restaurant.clone();
        let mut batches = fetcher.fetch(request);

        while let Some(batch) = batches.try_next().await? {
            self.check_shutdown()?;

            let records = batch.len();
            let flattened = flatten(&Value::Array(batch), mapping)?;

            let mut rows = 0;
            for (table, table_rows) in flattened.iter() {
                let written = sink.write(table, table_rows, extra)?;
                summary.record_rows(table, written);
                rows += written;
            }
            summary.record_batch(records);

            log_batch_written!(restaurant, category, records, rows);
        }
        Ok(())
    }

    /// Restaurants of this run, in configuration order without duplicates
    async fn resolve_restaurants(&self) -> Result<Vec<RestaurantGuid>> {
        let selection = &self.config.restaurants;

        let candidates = match selection.select_type {
            RestaurantSelection::Explicit => {
                let restaurants = parse_restaurant_list(&selection.restaurant_ids.join(","));
                if restaurants.is_empty() {
                    return Err(ExtractorError::Configuration(
                        "No restaurant IDs provided".to_string(),
                    ));
                }
                restaurants
            }
            RestaurantSelection::ManagementGroups => {
                let groups: Vec<ManagementGroupGuid> = selection
                    .management_group_ids
                    .iter()
                    .filter_map(|id| ManagementGroupGuid::new(id.as_str()).ok())
                    .collect();

                let directory = self.api.list_restaurants().await?;
                let restaurants: Vec<RestaurantGuid> = directory
                    .iter()
                    .filter(|entry| entry.in_any_group(&groups))
                    .filter_map(|entry| RestaurantGuid::new(entry.restaurant_guid.as_str()).ok())
                    .collect();

                tracing::info!(
                    management_groups = groups.len(),
                    directory_size = directory.len(),
                    selected = restaurants.len(),
                    "Resolved restaurants from management groups"
                );
                if restaurants.is_empty() {
                    tracing::warn!("No restaurants found in the configured management groups");
                }
                restaurants
            }
        };

        let mut unique = Vec::with_capacity(candidates.len());
        for restaurant in candidates {
            if !unique.contains(&restaurant) {
                unique.push(restaurant);
            }
        }
        Ok(unique)
    }

    fn check_shutdown(&self) -> Result<()> {
        if *self.shutdown_signal.borrow() {
            tracing::warn!("Shutdown signal received, stopping export");
            return Err(ExtractorError::Interrupted(
                "Shutdown signal received".to_string(),
            ));
        }
        Ok(())
    }

    /// The state manager holding the watermark of this coordinator
    pub fn state_manager(&self) -> &StateManager {
        &self.state_manager
    }
}

/// Mappings of the configured endpoints, in endpoint order
fn build_mappings(config: &ExtractorConfig) -> Result<Vec<(Category, TableMapping)>> {
    let catalog = MappingCatalog::load(config.mapping.path.as_deref().map(Path::new))?;
    catalog.build_all(&config.endpoints)
}
