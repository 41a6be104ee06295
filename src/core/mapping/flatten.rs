//! Record flattening
//!
//! Converts nested JSON records into rows of named tables according to a
//! [`TableMapping`]. Child rows carry their ancestors' primary keys as
//! `<ancestor_table>_<pk>` columns so the tables can be joined back.

use super::model::TableMapping;
use crate::domain::{ExtractorError, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// One output row: column name to scalar value
pub type Row = BTreeMap<String, Value>;

/// Rows produced from one record or batch, grouped by table name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedRecordSet {
    tables: BTreeMap<String, Vec<Row>>,
}

impl FlattenedRecordSet {
    /// Rows of a table, if any were produced
    pub fn rows(&self, table_name: &str) -> Option<&[Row]> {
        self.tables.get(table_name).map(Vec::as_slice)
    }

    /// Names of the tables that received at least one row
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Iterate over `(table_name, rows)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Total rows across all tables
    pub fn total_rows(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Whether no rows were produced
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn push(&mut self, table_name: &str, row: Row) {
        self.tables
            .entry(table_name.to_string())
            .or_default()
            .push(row);
    }
}

/// Flatten a record or a batch of records
///
/// An array is treated as a batch, an object or scalar as one record, and
/// `null` contributes nothing. The function is pure: the same input always
/// yields an equal record set.
///
/// # Errors
///
/// Returns `ExtractorError::MappingResolution` when a relation key holds a
/// scalar instead of an object, an array or null.
///
/// # Examples
///
/// ```
/// use toast_extractor::core::mapping::{flatten, MappingDescription, TableMapping};
/// use serde_json::json;
///
/// let description: MappingDescription = serde_json::from_value(json!({
///     "table_name": "order",
///     "column_mappings": {"guid": "guid"},
///     "primary_keys": ["guid"],
///     "child_tables": {"selections": {"column_mappings": {"item": "item"}}}
/// })).unwrap();
/// let mapping = TableMapping::build(&description).unwrap();
///
/// let out = flatten(&json!({"guid": "A1", "selections": [{"item": "Cola"}]}), &mapping).unwrap();
/// let child = &out.rows("order_selections").unwrap()[0];
/// assert_eq!(child["order_guid"], json!("A1"));
/// ```
pub fn flatten(input: &Value, mapping: &TableMapping) -> Result<FlattenedRecordSet> {
    let mut out = FlattenedRecordSet::default();
    match input {
        Value::Null => {}
        Value::Array(records) => {
            for record in records {
                flatten_node(record, mapping, &[], &mut out)?;
            }
        }
        record => flatten_node(record, mapping, &[], &mut out)?,
    }
    Ok(out)
}

fn flatten_node(
    record: &Value,
    mapping: &TableMapping,
    inherited: &[(String, Value)],
    out: &mut FlattenedRecordSet,
) -> Result<()> {
    if record.is_null() {
        return Ok(());
    }

    let mut row = Row::new();
    for column in mapping.column_mappings() {
        let value = to_cell(column.source_path.resolve(record));
        row.insert(column.output_column.clone(), value);
    }
    for (name, value) in inherited {
        row.entry(name.clone()).or_insert_with(|| value.clone());
    }

    if !mapping.child_tables().is_empty() {
        let keys = keys_for_children(mapping, &row);
        for child in mapping.child_tables() {
            match record.get(&child.relation_key) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => {
                    for item in items {
                        flatten_node(item, &child.mapping, &keys, out)?;
                    }
                }
                Some(object @ Value::Object(_)) => {
                    flatten_node(object, &child.mapping, &keys, out)?;
                }
                Some(scalar) => {
                    return Err(ExtractorError::MappingResolution(format!(
                        "Table '{}': relation '{}' holds a scalar ({}) instead of an object or array",
                        mapping.table_name(),
                        child.relation_key,
                        scalar
                    )));
                }
            }
        }
    }

    out.push(mapping.table_name(), row);
    Ok(())
}

/// Key values handed to child rows: this node's primary keys, then the keys it inherited
fn keys_for_children(mapping: &TableMapping, row: &Row) -> Vec<(String, Value)> {
    let mut keys: Vec<(String, Value)> = Vec::new();
    let own = mapping.primary_keys().iter().map(|pk| {
        (
            format!("{}_{}", mapping.table_name(), pk),
            row.get(pk).cloned().unwrap_or(Value::Null),
        )
    });
    let passed_down = mapping
        .foreign_keys()
        .iter()
        .map(|fk| (fk.clone(), row.get(fk).cloned().unwrap_or(Value::Null)));

    for (name, value) in own.chain(passed_down) {
        if !keys.iter().any(|(existing, _)| *existing == name) {
            keys.push((name, value));
        }
    }
    keys
}

/// Nested values land in a single cell as compact JSON text
fn to_cell(value: Value) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
        scalar => scalar,
    }
}
