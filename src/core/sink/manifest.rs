//! Output table definitions and their manifest files

use crate::domain::{ExtractorError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Registration record of one output table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    /// Table name (file stem of the CSV)
    pub name: String,
    /// Column order of the CSV header
    pub columns: Vec<String>,
    /// Primary key columns
    pub primary_key: Vec<String>,
    /// Whether the consumer should upsert rather than replace
    pub incremental: bool,
    /// Data rows written (header excluded)
    pub rows_written: u64,
}

/// On-disk form of `<table>.csv.manifest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub incremental: bool,
    pub primary_key: Vec<String>,
    pub columns: Vec<String>,
}

impl TableDefinition {
    /// File name of the finished CSV
    pub fn csv_file_name(&self) -> String {
        format!("{}.csv", self.name)
    }

    /// Path of the finished CSV within `dir`
    pub fn csv_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.csv_file_name())
    }

    /// Path of the manifest within `dir`
    pub fn manifest_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.csv.manifest", self.name))
    }

    /// Manifest content for this table
    pub fn manifest(&self) -> Manifest {
        Manifest {
            incremental: self.incremental,
            primary_key: self.primary_key.clone(),
            columns: self.columns.clone(),
        }
    }

    /// Write the manifest next to the CSV
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Output` if the file cannot be written.
    pub fn write_manifest(&self, dir: &Path) -> Result<PathBuf> {
        let path = self.manifest_path(dir);
        let body = serde_json::to_string_pretty(&self.manifest())?;
        fs::write(&path, body).map_err(|e| {
            ExtractorError::Output(format!(
                "Failed to write manifest {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(path)
    }
}
