//! State storage backends
//!
//! [`StateStorage`] abstracts where the watermark lives. The extractor ships
//! a JSON file backend; the file is replaced atomically on every save.

use super::watermark::Watermark;
use crate::domain::{ExtractorError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Persistence interface for the run watermark
#[async_trait]
pub trait StateStorage: Send + Sync {
    /// Load the persisted watermark
    ///
    /// Returns `Ok(None)` if nothing was persisted yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the state exists but cannot be read or parsed.
    async fn load_watermark(&self) -> Result<Option<Watermark>>;

    /// Persist the watermark, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    async fn save_watermark(&self, watermark: &Watermark) -> Result<()>;

    /// Human-readable location of the state, for logs and status output
    fn location(&self) -> String;
}

/// Watermark stored in a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStateStorage {
    path: PathBuf,
}

impl JsonFileStateStorage {
    /// Create a backend for the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStorage for JsonFileStateStorage {
    async fn load_watermark(&self) -> Result<Option<Watermark>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ExtractorError::State(format!(
                    "Failed to read state file {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text).map(Some).map_err(|e| {
            ExtractorError::State(format!(
                "Invalid state file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn save_watermark(&self, watermark: &Watermark) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ExtractorError::State(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let body = serde_json::to_string_pretty(watermark)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, body).await.map_err(|e| {
            ExtractorError::State(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            ExtractorError::State(format!(
                "Failed to replace state file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
