//! Export summary and reporting
//!
//! This module defines the counters collected during an extraction run.

use crate::core::sink::TableDefinition;
use crate::domain::ExtractionWindow;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Summary of an extraction run
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Wall-clock start of the run
    pub run_started_at: DateTime<Utc>,

    /// Time window requested from listing endpoints
    pub window: ExtractionWindow,

    /// Restaurants whose categories were all extracted
    pub restaurants_processed: usize,

    /// Batches pulled from the fetcher
    pub batches: usize,

    /// Source records received
    pub records_fetched: usize,

    /// Rows written per output table
    pub rows_written: BTreeMap<String, u64>,

    /// Tables published by the sink
    pub tables: Vec<TableDefinition>,

    /// Requests delayed by the rate limiter
    pub calls_throttled: u64,

    /// Total time spent waiting for rate limit permits
    pub rate_limit_wait: Duration,

    /// New watermark, set once the run has been committed
    pub watermark: Option<DateTime<Utc>>,

    /// Duration of the run
    pub duration: Duration,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new(run_started_at: DateTime<Utc>, window: ExtractionWindow) -> Self {
        Self {
            run_started_at,
            window,
            restaurants_processed: 0,
            batches: 0,
            records_fetched: 0,
            rows_written: BTreeMap::new(),
            tables: Vec::new(),
            calls_throttled: 0,
            rate_limit_wait: Duration::ZERO,
            watermark: None,
            duration: Duration::ZERO,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Count one fetched batch of `records` source records
    pub fn record_batch(&mut self, records: usize) {
        self.batches += 1;
        self.records_fetched += records;
    }

    /// Count `rows` written to `table`
    pub fn record_rows(&mut self, table: &str, rows: usize) {
        *self.rows_written.entry(table.to_string()).or_default() += rows as u64;
    }

    /// Rows written across all tables
    pub fn total_rows(&self) -> u64 {
        self.rows_written.values().sum()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            window = %self.window,
            restaurants = self.restaurants_processed,
            batches = self.batches,
            records = self.records_fetched,
            rows = self.total_rows(),
            tables = self.tables.len(),
            calls_throttled = self.calls_throttled,
            rate_limit_wait_ms = self.rate_limit_wait.as_millis() as u64,
            duration_secs = self.duration.as_secs(),
            "Export completed"
        );

        for (table, rows) in &self.rows_written {
            tracing::info!(table = %table, rows = rows, "Table rows written");
        }

        if let Some(watermark) = self.watermark {
            tracing::info!(watermark = %watermark.to_rfc3339(), "Watermark advanced");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary() -> ExportSummary {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        ExportSummary::new(at, ExtractionWindow::new(at, at).unwrap())
    }

    #[test]
    fn test_export_summary_creation() {
        let summary = summary();

        assert_eq!(summary.restaurants_processed, 0);
        assert_eq!(summary.batches, 0);
        assert_eq!(summary.records_fetched, 0);
        assert_eq!(summary.total_rows(), 0);
        assert_eq!(summary.duration, Duration::ZERO);
        assert!(summary.watermark.is_none());
    }

    #[test]
    fn test_export_summary_with_duration() {
        let summary = summary().with_duration(Duration::from_secs(120));

        assert_eq!(summary.duration, Duration::from_secs(120));
    }

    #[test]
    fn test_rows_accumulate_per_table() {
        let mut summary = summary();
        summary.record_batch(10);
        summary.record_batch(5);
        summary.record_rows("orders", 10);
        summary.record_rows("orders", 5);
        summary.record_rows("orders_checks", 7);

        assert_eq!(summary.batches, 2);
        assert_eq!(summary.records_fetched, 15);
        assert_eq!(summary.rows_written["orders"], 15);
        assert_eq!(summary.total_rows(), 22);
    }
}
