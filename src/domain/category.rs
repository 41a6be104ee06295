//! Resource categories that can be extracted per restaurant

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A logical resource fetched from the Toast API
///
/// Each category has its own endpoint and its own table mapping. Listing
/// categories page through a date window; document categories return a
/// single JSON document per restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Bulk orders within the extraction window
    Orders,
    /// Restaurant configuration document
    #[serde(alias = "configuration_information")]
    Configuration,
}

impl Category {
    /// Every supported category, in extraction order
    pub const ALL: [Category; 2] = [Category::Configuration, Category::Orders];

    /// Key of this category in configuration and mapping files
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Orders => "orders",
            Category::Configuration => "configuration",
        }
    }

    /// Whether the endpoint returns one document instead of a paged listing
    pub fn is_single_document(&self) -> bool {
        matches!(self, Category::Configuration)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "orders" => Ok(Category::Orders),
            "configuration" | "configuration_information" => Ok(Category::Configuration),
            other => Err(format!(
                "Unknown endpoint '{other}'. Must be one of: orders, configuration"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str() {
        assert_eq!(Category::from_str("orders").unwrap(), Category::Orders);
        assert_eq!(
            Category::from_str("configuration_information").unwrap(),
            Category::Configuration
        );
        assert!(Category::from_str("payments").is_err());
    }

    #[test]
    fn test_category_serde_alias() {
        let categories: Vec<Category> =
            serde_json::from_str(r#"["orders", "configuration_information"]"#).unwrap();
        assert_eq!(categories, vec![Category::Orders, Category::Configuration]);
        assert_eq!(
            serde_json::to_string(&Category::Configuration).unwrap(),
            "\"configuration\""
        );
    }

    #[test]
    fn test_single_document() {
        assert!(Category::Configuration.is_single_document());
        assert!(!Category::Orders.is_single_document());
    }
}
