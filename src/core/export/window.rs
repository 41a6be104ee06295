//! Extraction window policy
//!
//! `explicit` mode reads `sync.start_date`/`sync.end_date`; `resume` mode
//! runs from the persisted watermark up to the start of the current run.

use crate::config::dates::parse_date_expression;
use crate::config::{SyncConfig, SyncMode};
use crate::domain::{ExtractionWindow, ExtractorError, Result};
use chrono::{DateTime, Utc};

/// Resolve the window of a run that started at `run_started_at`
///
/// Relative date expressions are evaluated against `run_started_at`.
///
/// # Errors
///
/// Returns a configuration error for unparseable dates or an end before the
/// start, and a state error if the watermark lies after the run start.
pub fn resolve_window(
    sync: &SyncConfig,
    watermark: DateTime<Utc>,
    run_started_at: DateTime<Utc>,
) -> Result<ExtractionWindow> {
    match sync.mode {
        SyncMode::Explicit => {
            let start = parse_date_expression(&sync.start_date, run_started_at)
                .map_err(|e| ExtractorError::Configuration(format!("sync.start_date: {e}")))?;
            let end = parse_date_expression(&sync.end_date, run_started_at)
                .map_err(|e| ExtractorError::Configuration(format!("sync.end_date: {e}")))?;
            ExtractionWindow::new(start, end).map_err(ExtractorError::Configuration)
        }
        SyncMode::Resume => ExtractionWindow::new(watermark, run_started_at).map_err(|e| {
            ExtractorError::State(format!("Watermark is ahead of the current run: {e}"))
        }),
    }
}
