//! Field path resolution against JSON records
//!
//! A path is a dot-separated list of segments. Object segments select keys;
//! numeric segments index arrays. The empty path selects the value itself.
//! Resolution is tolerant: anything missing resolves to `null`.

use serde_json::Value;
use std::fmt;

/// Parsed source path of a column mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dot-separated path
    ///
    /// # Errors
    ///
    /// Returns an error if the path contains an empty segment (`a..b`,
    /// a leading or a trailing dot).
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Ok(Self {
                raw: String::new(),
                segments: Vec::new(),
            });
        }

        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(format!("Source path '{raw}' contains an empty segment"));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The path as written in the mapping description
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Resolve the path against a record
    ///
    /// # Examples
    ///
    /// ```
    /// use toast_extractor::core::mapping::path::FieldPath;
    /// use serde_json::json;
    ///
    /// let record = json!({"checks": [{"amount": 12.5}]});
    /// let path = FieldPath::parse("checks.0.amount").unwrap();
    /// assert_eq!(path.resolve(&record), json!(12.5));
    ///
    /// let missing = FieldPath::parse("checks.3.amount").unwrap();
    /// assert!(missing.resolve(&record).is_null());
    /// ```
    pub fn resolve(&self, record: &Value) -> Value {
        let mut current = record;
        for segment in &self.segments {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return Value::Null,
            }
        }
        current.clone()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("guid", json!("A1"); "top level key")]
    #[test_case("server.guid", json!("E7"); "nested object")]
    #[test_case("checks.1.amount", json!(4); "array index")]
    #[test_case("checks.9.amount", Value::Null; "index out of range")]
    #[test_case("server.name", Value::Null; "missing key")]
    #[test_case("guid.inner", Value::Null; "descend into scalar")]
    #[test_case("checks.first", Value::Null; "non numeric array segment")]
    fn test_resolve(path: &str, expected: Value) {
        let record = json!({
            "guid": "A1",
            "server": {"guid": "E7"},
            "checks": [{"amount": 3}, {"amount": 4}]
        });
        assert_eq!(FieldPath::parse(path).unwrap().resolve(&record), expected);
    }

    #[test]
    fn test_empty_path_is_identity() {
        let path = FieldPath::parse("").unwrap();
        assert_eq!(path.resolve(&json!("tag")), json!("tag"));
        assert_eq!(path.resolve(&json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn test_numeric_segment_on_object_is_a_key() {
        let record = json!({"0": "zero"});
        assert_eq!(FieldPath::parse("0").unwrap().resolve(&record), json!("zero"));
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse(".a").is_err());
        assert!(FieldPath::parse("a.").is_err());
    }
}
