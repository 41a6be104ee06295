//! Mapping catalog: one table mapping description per category
//!
//! The default catalog is compiled into the binary. A JSON file with the
//! same shape can replace it through `mapping.path`.

use super::model::{MappingDescription, TableMapping, TableSchema};
use crate::domain::{Category, ExtractorError, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

const DEFAULT_MAPPING: &str = include_str!("../../../mappings/toast_mapping.json");

/// Mapping descriptions keyed by category name
#[derive(Debug, Clone)]
pub struct MappingCatalog {
    descriptions: BTreeMap<String, MappingDescription>,
}

impl MappingCatalog {
    /// The catalog shipped with the binary
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded document is malformed.
    pub fn embedded() -> Result<Self> {
        Self::from_json(DEFAULT_MAPPING)
    }

    /// Load the catalog from a file, or the embedded default when `path` is `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid catalog.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading table mappings from file");
                let text = std::fs::read_to_string(path).map_err(|e| {
                    ExtractorError::Configuration(format!(
                        "Failed to read mapping file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_json(&text)
            }
            None => Self::embedded(),
        }
    }

    /// Parse a catalog document
    pub fn from_json(text: &str) -> Result<Self> {
        let descriptions: BTreeMap<String, MappingDescription> = serde_json::from_str(text)
            .map_err(|e| {
                ExtractorError::MappingResolution(format!("Invalid mapping document: {e}"))
            })?;
        Ok(Self { descriptions })
    }

    /// Build the validated mapping of one category
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::MappingResolution` if the category has no
    /// description or its description is invalid.
    pub fn build(&self, category: Category) -> Result<TableMapping> {
        let description = self.descriptions.get(category.as_str()).ok_or_else(|| {
            ExtractorError::MappingResolution(format!(
                "No table mapping defined for endpoint '{category}'"
            ))
        })?;
        TableMapping::build(description)
    }

    /// Build the mappings of several categories
    ///
    /// Also checks that no two tables across the categories share a name,
    /// since each table owns a single output file.
    pub fn build_all(&self, categories: &[Category]) -> Result<Vec<(Category, TableMapping)>> {
        let mut owners: HashMap<String, Category> = HashMap::new();
        let mut mappings = Vec::with_capacity(categories.len());

        for &category in categories {
            let mapping = self.build(category)?;
            for schema in mapping.schemas() {
                if let Some(other) = owners.insert(schema.name.clone(), category) {
                    return Err(ExtractorError::MappingResolution(format!(
                        "Table '{}' is produced by both '{}' and '{}'",
                        schema.name, other, category
                    )));
                }
            }
            mappings.push((category, mapping));
        }

        Ok(mappings)
    }
}

/// Every schema of the given mappings, in mapping order
pub fn schema_catalog(mappings: &[(Category, TableMapping)]) -> Vec<TableSchema> {
    mappings
        .iter()
        .flat_map(|(_, mapping)| mapping.schemas())
        .collect()
}
