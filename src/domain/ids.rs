//! Domain identifier types with validation
//!
//! Newtype wrappers for Toast identifiers. Each type ensures type safety and
//! rejects blank values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Restaurant GUID newtype wrapper
///
/// Identifies one restaurant location, the partition under which extraction
/// is repeated independently. Sent to the API as the
/// `Toast-Restaurant-External-ID` header.
///
/// # Examples
///
/// ```
/// use toast_extractor::domain::ids::RestaurantGuid;
/// use std::str::FromStr;
///
/// let guid = RestaurantGuid::from_str("b8d4d1c4-1f9a-4a39-8a3b-2f6d2e7e0c11").unwrap();
/// assert_eq!(guid.as_str(), "b8d4d1c4-1f9a-4a39-8a3b-2f6d2e7e0c11");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestaurantGuid(String);

impl RestaurantGuid {
    /// Creates a new RestaurantGuid, trimming surrounding whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Restaurant GUID cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the GUID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RestaurantGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RestaurantGuid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RestaurantGuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Management group GUID newtype wrapper
///
/// A management group owns a set of restaurants; selecting a group selects
/// every restaurant the directory lookup reports under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagementGroupGuid(String);

impl ManagementGroupGuid {
    /// Creates a new ManagementGroupGuid, trimming surrounding whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Management group GUID cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the GUID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ManagementGroupGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ManagementGroupGuid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Parse a comma-separated list of restaurant GUIDs, skipping blank entries
///
/// # Examples
///
/// ```
/// use toast_extractor::domain::ids::parse_restaurant_list;
///
/// let ids = parse_restaurant_list("a, b,,c");
/// assert_eq!(ids.len(), 3);
/// ```
pub fn parse_restaurant_list(input: &str) -> Vec<RestaurantGuid> {
    input
        .split(',')
        .filter_map(|s| RestaurantGuid::new(s).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restaurant_guid_trims() {
        let guid = RestaurantGuid::new("  abc-123 ").unwrap();
        assert_eq!(guid.as_str(), "abc-123");
        assert_eq!(guid.to_string(), "abc-123");
    }

    #[test]
    fn test_restaurant_guid_empty() {
        assert!(RestaurantGuid::new("").is_err());
        assert!(RestaurantGuid::new("   ").is_err());
    }

    #[test]
    fn test_management_group_guid() {
        let guid = ManagementGroupGuid::from_str("grp-1").unwrap();
        assert_eq!(guid.as_str(), "grp-1");
        assert!(ManagementGroupGuid::new(" ").is_err());
    }

    #[test]
    fn test_parse_restaurant_list() {
        let ids = parse_restaurant_list("r1, r2 ,, r3,");
        let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_parse_restaurant_list_empty() {
        assert!(parse_restaurant_list("").is_empty());
        assert!(parse_restaurant_list(" , ").is_empty());
    }
}
