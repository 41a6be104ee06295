//! Table mapping model
//!
//! A [`TableMapping`] is an immutable tree mirroring the shape of a JSON
//! document: each node names the columns it extracts and the relations under
//! which child tables live. It is built once per category from a declarative
//! [`MappingDescription`] and shared by every record of a run.

use super::path::FieldPath;
use crate::domain::{ExtractorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Declarative description of a table mapping
///
/// Object order is significant: `column_mappings` order is the output column
/// order and `child_tables` order is the table emission order.
///
/// ```json
/// {
///   "table_name": "order",
///   "column_mappings": {"guid": "guid", "amount": "amount"},
///   "primary_keys": ["guid"],
///   "child_tables": {
///     "selections": {"column_mappings": {"guid": "guid", "item": "item"}}
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingDescription {
    /// Output table name (required at the root; child names derive from the relation path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,

    /// Source path to output column, in output order
    #[serde(with = "ordered_pairs")]
    pub column_mappings: Vec<(String, String)>,

    /// Output columns forming the primary key
    #[serde(default)]
    pub primary_keys: Vec<String>,

    /// Relation key to child description, in emission order
    #[serde(default, with = "ordered_pairs", skip_serializing_if = "Vec::is_empty")]
    pub child_tables: Vec<(String, MappingDescription)>,
}

/// One source path renamed to an output column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    pub source_path: FieldPath,
    pub output_column: String,
}

/// A child table reachable under `relation_key`
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRelation {
    pub relation_key: String,
    pub mapping: TableMapping,
}

/// Derived output schema of one mapping node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    /// Joined table name (`order`, `order_selections`, ...)
    pub name: String,
    /// Mapped columns followed by inherited foreign-key columns
    pub columns: Vec<String>,
    /// Primary key columns of this node
    pub primary_keys: Vec<String>,
}

/// Validated mapping tree node
#[derive(Debug, Clone, PartialEq)]
pub struct TableMapping {
    table_name: String,
    column_mappings: Vec<ColumnMapping>,
    primary_keys: Vec<String>,
    child_tables: Vec<ChildRelation>,
    foreign_keys: Vec<String>,
}

impl TableMapping {
    /// Build and validate a mapping tree
    ///
    /// Validation is structural and eager: a non-empty root table name, at
    /// least one column per node, unique output columns, primary keys drawn
    /// from the output columns, and non-empty unique relation keys.
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::MappingResolution` naming the offending table.
    pub fn build(description: &MappingDescription) -> Result<Self> {
        let table_name = description
            .table_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if table_name.is_empty() {
            return Err(ExtractorError::MappingResolution(
                "Root table mapping requires a non-empty table_name".to_string(),
            ));
        }
        Self::build_node(description, table_name.to_string(), Vec::new())
    }

    fn build_node(
        description: &MappingDescription,
        table_name: String,
        inherited: Vec<String>,
    ) -> Result<Self> {
        let fail = |message: String| {
            Err(ExtractorError::MappingResolution(format!(
                "Table '{table_name}': {message}"
            )))
        };

        if description.column_mappings.is_empty() {
            return fail("at least one column mapping is required".to_string());
        }

        let mut column_mappings = Vec::with_capacity(description.column_mappings.len());
        let mut seen = HashSet::new();
        for (source, column) in &description.column_mappings {
            if column.trim().is_empty() {
                return fail(format!("source path '{source}' maps to an empty column name"));
            }
            if !seen.insert(column.as_str()) {
                return fail(format!("duplicate output column '{column}'"));
            }
            let source_path = match FieldPath::parse(source) {
                Ok(path) => path,
                Err(e) => return fail(e),
            };
            column_mappings.push(ColumnMapping {
                source_path,
                output_column: column.clone(),
            });
        }

        let mut keys = HashSet::new();
        for key in &description.primary_keys {
            if !seen.contains(key.as_str()) {
                return fail(format!("primary key '{key}' is not an output column"));
            }
            if !keys.insert(key.as_str()) {
                return fail(format!("duplicate primary key '{key}'"));
            }
        }

        // Nearest ancestor first; a mapped column of the same name shadows the key.
        let foreign_keys: Vec<String> = inherited
            .into_iter()
            .filter(|fk| !seen.contains(fk.as_str()))
            .collect();

        let mut own_keys: Vec<String> = description
            .primary_keys
            .iter()
            .map(|pk| format!("{table_name}_{pk}"))
            .collect();
        for fk in &foreign_keys {
            if !own_keys.contains(fk) {
                own_keys.push(fk.clone());
            }
        }

        let mut child_tables = Vec::with_capacity(description.child_tables.len());
        let mut relations = HashSet::new();
        for (relation_key, child) in &description.child_tables {
            if relation_key.trim().is_empty() {
                return fail("child relation key cannot be empty".to_string());
            }
            if !relations.insert(relation_key.as_str()) {
                return fail(format!("duplicate child relation '{relation_key}'"));
            }
            let child_name = format!("{table_name}_{relation_key}");
            child_tables.push(ChildRelation {
                relation_key: relation_key.clone(),
                mapping: Self::build_node(child, child_name, own_keys.clone())?,
            });
        }

        Ok(Self {
            table_name,
            column_mappings,
            primary_keys: description.primary_keys.clone(),
            child_tables,
            foreign_keys,
        })
    }

    /// Joined table name of this node
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Column mappings in output order
    pub fn column_mappings(&self) -> &[ColumnMapping] {
        &self.column_mappings
    }

    /// Primary key columns
    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    /// Child relations in declaration order
    pub fn child_tables(&self) -> &[ChildRelation] {
        &self.child_tables
    }

    /// Foreign-key columns this node's rows receive from their ancestors
    pub fn foreign_keys(&self) -> &[String] {
        &self.foreign_keys
    }

    /// Output schema of this node
    pub fn schema(&self) -> TableSchema {
        let mut columns: Vec<String> = self
            .column_mappings
            .iter()
            .map(|c| c.output_column.clone())
            .collect();
        columns.extend(self.foreign_keys.iter().cloned());

        TableSchema {
            name: self.table_name.clone(),
            columns,
            primary_keys: self.primary_keys.clone(),
        }
    }

    /// Schemas of the whole tree, root first, depth-first in declaration order
    pub fn schemas(&self) -> Vec<TableSchema> {
        let mut out = vec![self.schema()];
        for child in &self.child_tables {
            out.extend(child.mapping.schemas());
        }
        out
    }
}

/// Serde adapter for JSON objects whose key order matters
mod ordered_pairs {
    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{Serialize, SerializeMap, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S, V>(pairs: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(pairs.len()))?;
        for (key, value) in pairs {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct PairsVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for PairsVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    pairs.push((key, value));
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(PairsVisitor(PhantomData))
    }
}
