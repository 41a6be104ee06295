//! Watermark model for incremental extraction
//!
//! The watermark is the wall-clock start time of the last run that completed
//! successfully. A resumed run extracts from the watermark up to its own start.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted run state
///
/// Stored as `{"last_successful_run": <unix seconds>}`.
///
/// # Examples
///
/// ```
/// use toast_extractor::core::state::Watermark;
/// use chrono::{TimeZone, Utc};
///
/// let watermark = Watermark::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
/// let json = serde_json::to_string(&watermark).unwrap();
/// assert_eq!(json, r#"{"last_successful_run":1700000000}"#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    /// Start time of the last successful run
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_successful_run: DateTime<Utc>,
}

impl Watermark {
    /// Create a watermark at `timestamp`
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            last_successful_run: timestamp,
        }
    }

    /// The watermark of an environment that never completed a run
    pub fn epoch() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Whether no run has completed yet
    pub fn is_epoch(&self) -> bool {
        self.last_successful_run == DateTime::<Utc>::UNIX_EPOCH
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::epoch()
    }
}
