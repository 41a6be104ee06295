//! State manager for watermark persistence
//!
//! This module provides the StateManager for loading and advancing the run
//! watermark through a [`StateStorage`] backend.

use super::storage::{JsonFileStateStorage, StateStorage};
use super::watermark::Watermark;
use crate::config::StateConfig;
use crate::domain::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// State manager for watermark persistence
pub struct StateManager {
    /// State storage backend
    storage: Arc<dyn StateStorage>,
}

impl StateManager {
    /// Create a new StateManager with a state storage backend
    ///
    /// # Arguments
    ///
    /// * `storage` - State storage implementation
    pub fn new_with_storage(storage: Arc<dyn StateStorage>) -> Self {
        Self { storage }
    }

    /// Create a StateManager backed by the configured state file
    pub fn from_config(config: &StateConfig) -> Self {
        Self::new_with_storage(Arc::new(JsonFileStateStorage::new(&config.path)))
    }

    /// Load the start time of the last successful run
    ///
    /// Returns the Unix epoch if no run has completed yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted state exists but cannot be read.
    pub async fn load(&self) -> Result<DateTime<Utc>> {
        let watermark = self.storage.load_watermark().await?.unwrap_or_default();

        if watermark.is_epoch() {
            tracing::info!(
                location = %self.storage.location(),
                "No completed run recorded, starting from the Unix epoch"
            );
            return Ok(watermark.last_successful_run);
        }

        tracing::debug!(
            location = %self.storage.location(),
            last_successful_run = %watermark.last_successful_run.to_rfc3339(),
            "Loaded watermark"
        );

        Ok(watermark.last_successful_run)
    }

    /// Record `timestamp` as the start of the last successful run
    ///
    /// Call only once every table of the run has been finalized.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    pub async fn advance(&self, timestamp: DateTime<Utc>) -> Result<()> {
        tracing::info!(
            location = %self.storage.location(),
            last_successful_run = %timestamp.to_rfc3339(),
            "Advancing watermark"
        );

        self.storage.save_watermark(&Watermark::new(timestamp)).await
    }

    /// Human-readable location of the state
    pub fn location(&self) -> String {
        self.storage.location()
    }
}
