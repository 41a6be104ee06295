//! Streaming table sink
//!
//! Keeps one open CSV writer per output table for the duration of a run.
//! Writers are created lazily on a table's first rows and write to
//! `<table>.csv.part`; nothing becomes visible as `<table>.csv` until
//! [`StreamingTableSink::finalize_all`] succeeds.
//!
//! The output directory only ever holds the tables of the last successful
//! run: artifacts of catalog tables left by an earlier run are removed when
//! the sink is created, and a failed finalization rolls back every file it
//! already published.

use super::manifest::TableDefinition;
use crate::config::LoadType;
use crate::core::mapping::{Row, TableSchema};
use crate::domain::{ExtractorError, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Constant column prepended to every row of a write call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraColumn {
    pub name: String,
    pub value: String,
}

impl ExtraColumn {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

struct TableWriter {
    writer: csv::Writer<File>,
    part_path: PathBuf,
    definition: TableDefinition,
}

/// Per-run owner of every output table handle
pub struct StreamingTableSink {
    output_dir: PathBuf,
    incremental: bool,
    catalog: HashMap<String, TableSchema>,
    writers: BTreeMap<String, TableWriter>,
}

impl StreamingTableSink {
    /// Create a sink writing into `output_dir`
    ///
    /// `schemas` is the catalog of tables this run may write; the directory
    /// is created if missing. Existing `.csv`, `.csv.manifest` and
    /// `.csv.part` files of catalog tables are deleted.
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Output` if the directory cannot be created or
    /// a stale artifact cannot be removed.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        load_type: LoadType,
        schemas: impl IntoIterator<Item = TableSchema>,
    ) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|e| {
            ExtractorError::Output(format!(
                "Failed to create output directory {}: {}",
                output_dir.display(),
                e
            ))
        })?;

        let catalog: HashMap<String, TableSchema> =
            schemas.into_iter().map(|s| (s.name.clone(), s)).collect();
        clear_stale_artifacts(&output_dir, catalog.keys())?;

        Ok(Self {
            output_dir,
            incremental: load_type.is_incremental(),
            catalog,
            writers: BTreeMap::new(),
        })
    }

    /// Directory the tables are written into
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Names of the tables opened so far
    pub fn open_tables(&self) -> impl Iterator<Item = &str> {
        self.writers.keys().map(String::as_str)
    }

    /// Append rows to a table, opening it on first use
    ///
    /// The column order is fixed on the first call: the extra column (if
    /// given) followed by the table's schema columns. Columns absent from a
    /// row are written empty; columns outside the order are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Output` for a table missing from the catalog
    /// or when the file cannot be created or written.
    pub fn write(
        &mut self,
        table_name: &str,
        rows: &[Row],
        extra: Option<&ExtraColumn>,
    ) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        if !self.writers.contains_key(table_name) {
            let writer = self.open_table(table_name, extra)?;
            self.writers.insert(table_name.to_string(), writer);
        }
        let table = self
            .writers
            .get_mut(table_name)
            .ok_or_else(|| ExtractorError::Output(format!("Table '{table_name}' is not open")))?;

        for row in rows {
            let record = table.definition.columns.iter().map(|column| match extra {
                Some(extra) if extra.name == *column => extra.value.clone(),
                _ => row.get(column).map(cell_text).unwrap_or_default(),
            });
            table.writer.write_record(record)?;
        }
        table.definition.rows_written += rows.len() as u64;

        Ok(rows.len())
    }

    fn open_table(&self, table_name: &str, extra: Option<&ExtraColumn>) -> Result<TableWriter> {
        let schema = self.catalog.get(table_name).ok_or_else(|| {
            ExtractorError::Output(format!("Unknown output table '{table_name}'"))
        })?;

        let mut columns = Vec::with_capacity(schema.columns.len() + 1);
        if let Some(extra) = extra {
            columns.push(extra.name.clone());
        }
        for column in &schema.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }

        let part_path = self.output_dir.join(format!("{table_name}.csv.part"));
        let file = File::create(&part_path).map_err(|e| {
            ExtractorError::Output(format!("Failed to create {}: {}", part_path.display(), e))
        })?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&columns)?;

        tracing::debug!(
            table = %table_name,
            columns = columns.len(),
            path = %part_path.display(),
            "Opened output table"
        );

        Ok(TableWriter {
            writer,
            part_path,
            definition: TableDefinition {
                name: table_name.to_string(),
                columns,
                primary_key: schema.primary_keys.clone(),
                incremental: self.incremental,
                rows_written: 0,
            },
        })
    }

    /// Flush and close every table, publish the CSVs and write their manifests
    ///
    /// Publication is all or nothing. Every table is flushed and synced
    /// first, then every `.part` file is renamed, then the manifests are
    /// written. Each table is finalized exactly once; the returned
    /// definitions are in table name order.
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Output` if a flush, rename or manifest write
    /// fails. All files of this run, published or not, are removed.
    pub fn finalize_all(mut self) -> Result<Vec<TableDefinition>> {
        let writers = std::mem::take(&mut self.writers);

        let mut staged = Vec::with_capacity(writers.len());
        let mut pending = writers.into_values();
        while let Some(table) = pending.next() {
            match flush(table, &self.output_dir) {
                Ok(table) => staged.push(table),
                Err((e, part_path)) => {
                    tracing::error!(error = %e, "Failed to flush output table");
                    remove_quietly(&part_path);
                    remove_staged(&staged);
                    discard(pending);
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.publish(&staged) {
            tracing::error!(error = %e, "Failed to publish output tables, rolling back");
            remove_staged(&staged);
            return Err(e);
        }

        let definitions: Vec<TableDefinition> =
            staged.into_iter().map(|t| t.definition).collect();
        tracing::info!(
            tables = definitions.len(),
            output_dir = %self.output_dir.display(),
            "Output tables finalized"
        );
        Ok(definitions)
    }

    fn publish(&self, staged: &[StagedTable]) -> Result<()> {
        for table in staged {
            fs::rename(&table.part_path, &table.csv_path).map_err(|e| {
                ExtractorError::Output(format!(
                    "Failed to move {} to {}: {}",
                    table.part_path.display(),
                    table.csv_path.display(),
                    e
                ))
            })?;
        }
        for table in staged {
            table.definition.write_manifest(&self.output_dir)?;
            tracing::debug!(
                table = %table.definition.name,
                rows = table.definition.rows_written,
                "Published output table"
            );
        }
        Ok(())
    }

    /// Close every table without publishing or registering anything
    pub fn abort(mut self) {
        let writers = std::mem::take(&mut self.writers);
        if !writers.is_empty() {
            tracing::warn!(tables = writers.len(), "Discarding unfinished output tables");
        }
        discard(writers.into_values());
    }
}

impl Drop for StreamingTableSink {
    fn drop(&mut self) {
        discard(std::mem::take(&mut self.writers).into_values());
    }
}

/// A table whose `.part` file is complete and synced
struct StagedTable {
    part_path: PathBuf,
    csv_path: PathBuf,
    manifest_path: PathBuf,
    definition: TableDefinition,
}

fn flush(
    table: TableWriter,
    dir: &Path,
) -> std::result::Result<StagedTable, (ExtractorError, PathBuf)> {
    let TableWriter {
        writer,
        part_path,
        definition,
    } = table;

    let file = match writer.into_inner() {
        Ok(file) => file,
        Err(e) => {
            let err = ExtractorError::Output(format!(
                "Failed to flush {}: {}",
                part_path.display(),
                e.error()
            ));
            return Err((err, part_path));
        }
    };
    if let Err(e) = file.sync_all() {
        let err = ExtractorError::Output(format!("Failed to sync {}: {}", part_path.display(), e));
        return Err((err, part_path));
    }

    Ok(StagedTable {
        csv_path: definition.csv_path(dir),
        manifest_path: definition.manifest_path(dir),
        part_path,
        definition,
    })
}

/// Remove every file a staged table may have produced
fn remove_staged(staged: &[StagedTable]) {
    for table in staged {
        remove_quietly(&table.part_path);
        remove_quietly(&table.csv_path);
        remove_quietly(&table.manifest_path);
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove output file");
        }
    }
}

/// Delete artifacts of `tables` left in `dir` by an earlier run
fn clear_stale_artifacts<'a>(
    dir: &Path,
    tables: impl Iterator<Item = &'a String>,
) -> Result<()> {
    for table in tables {
        for suffix in ["csv", "csv.manifest", "csv.part"] {
            let path = dir.join(format!("{table}.{suffix}"));
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Removed output of a previous run")
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(ExtractorError::Output(format!(
                        "Failed to remove stale output {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
    }
    Ok(())
}

fn discard(tables: impl Iterator<Item = TableWriter>) {
    for table in tables {
        let TableWriter {
            writer, part_path, ..
        } = table;
        drop(writer);
        remove_quietly(&part_path);
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn schema(name: &str, columns: &[&str], pk: &[&str]) -> TableSchema {
        TableSchema {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            primary_keys: pk.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn row(value: Value) -> Row {
        serde_json::from_value(value).unwrap()
    }

    fn orders_sink(dir: &Path, load_type: LoadType) -> StreamingTableSink {
        StreamingTableSink::new(
            dir,
            load_type,
            vec![schema("orders", &["guid", "amount", "note"], &["guid"])],
        )
        .unwrap()
    }

    #[test]
    fn test_three_writes_one_file_header_once() {
        let dir = TempDir::new().unwrap();
        let mut sink = orders_sink(dir.path(), LoadType::IncrementalLoad);

        sink.write("orders", &[row(json!({"guid": "A1", "amount": 10}))], None)
            .unwrap();
        sink.write(
            "orders",
            &[
                row(json!({"amount": 5, "guid": "A2"})),
                row(json!({"guid": "A3", "note": "late"})),
            ],
            None,
        )
        .unwrap();
        sink.write("orders", &[row(json!({"guid": "A4", "amount": 1.5}))], None)
            .unwrap();

        let definitions = sink.finalize_all().unwrap();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].rows_written, 4);

        let text = fs::read_to_string(dir.path().join("orders.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec!["guid,amount,note", "A1,10,", "A2,5,", "A3,,late", "A4,1.5,"]
        );
        assert!(!dir.path().join("orders.csv.part").exists());
    }

    #[test]
    fn test_manifest_written_on_finalize() {
        let dir = TempDir::new().unwrap();
        let mut sink = orders_sink(dir.path(), LoadType::FullLoad);
        sink.write("orders", &[row(json!({"guid": "A1"}))], None)
            .unwrap();
        sink.finalize_all().unwrap();

        let manifest: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("orders.csv.manifest")).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest["incremental"], json!(false));
        assert_eq!(manifest["primary_key"], json!(["guid"]));
        assert_eq!(manifest["columns"], json!(["guid", "amount", "note"]));
    }

    #[test]
    fn test_extra_column_comes_first() {
        let dir = TempDir::new().unwrap();
        let mut sink = orders_sink(dir.path(), LoadType::IncrementalLoad);
        let extra = ExtraColumn::new("restaurant_guid", "R1");

        sink.write("orders", &[row(json!({"guid": "A1", "amount": 2}))], Some(&extra))
            .unwrap();
        sink.finalize_all().unwrap();

        let text = fs::read_to_string(dir.path().join("orders.csv")).unwrap();
        assert_eq!(text, "restaurant_guid,guid,amount,note\nR1,A1,2,\n");
    }

    #[test]
    fn test_abort_publishes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut sink = orders_sink(dir.path(), LoadType::IncrementalLoad);
        sink.write("orders", &[row(json!({"guid": "A1"}))], None)
            .unwrap();
        assert!(dir.path().join("orders.csv.part").exists());

        sink.abort();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_drop_behaves_like_abort() {
        let dir = TempDir::new().unwrap();
        {
            let mut sink = orders_sink(dir.path(), LoadType::IncrementalLoad);
            sink.write("orders", &[row(json!({"guid": "A1"}))], None)
                .unwrap();
        }
        assert!(!dir.path().join("orders.csv").exists());
        assert!(!dir.path().join("orders.csv.part").exists());
        assert!(!dir.path().join("orders.csv.manifest").exists());
    }

    #[test]
    fn test_unknown_table_rejected() {
        let dir = TempDir::new().unwrap();
        let mut sink = orders_sink(dir.path(), LoadType::IncrementalLoad);
        let err = sink
            .write("payments", &[row(json!({"guid": "P1"}))], None)
            .unwrap_err();
        assert!(matches!(err, ExtractorError::Output(_)));
    }

    #[test]
    fn test_empty_write_opens_nothing() {
        let dir = TempDir::new().unwrap();
        let mut sink = orders_sink(dir.path(), LoadType::IncrementalLoad);
        assert_eq!(sink.write("orders", &[], None).unwrap(), 0);
        assert_eq!(sink.open_tables().count(), 0);
        assert!(sink.finalize_all().unwrap().is_empty());
    }

    #[test]
    fn test_new_clears_previous_run_outputs() {
        let dir = TempDir::new().unwrap();
        for name in ["orders.csv", "orders.csv.manifest", "orders.csv.part", "notes.txt"] {
            fs::write(dir.path().join(name), "old").unwrap();
        }

        let sink = orders_sink(dir.path(), LoadType::FullLoad);
        assert!(sink.finalize_all().unwrap().is_empty());

        assert!(!dir.path().join("orders.csv").exists());
        assert!(!dir.path().join("orders.csv.manifest").exists());
        assert!(!dir.path().join("orders.csv.part").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_failed_publish_rolls_back_every_table() {
        let dir = TempDir::new().unwrap();
        let mut sink = StreamingTableSink::new(
            dir.path(),
            LoadType::IncrementalLoad,
            vec![
                schema("orders", &["guid"], &["guid"]),
                schema("orders_checks", &["guid"], &["guid"]),
            ],
        )
        .unwrap();
        sink.write("orders", &[row(json!({"guid": "A1"}))], None)
            .unwrap();
        sink.write("orders_checks", &[row(json!({"guid": "C1"}))], None)
            .unwrap();

        // orders publishes first, then orders_checks cannot be renamed
        fs::create_dir(dir.path().join("orders_checks.csv")).unwrap();

        let err = sink.finalize_all().unwrap_err();
        assert!(matches!(err, ExtractorError::Output(_)));

        assert!(!dir.path().join("orders.csv").exists());
        assert!(!dir.path().join("orders.csv.manifest").exists());
        assert!(!dir.path().join("orders.csv.part").exists());
        assert!(!dir.path().join("orders_checks.csv.part").exists());
        assert!(!dir.path().join("orders_checks.csv.manifest").exists());
    }

    #[test]
    fn test_values_are_quoted_when_needed() {
        let dir = TempDir::new().unwrap();
        let mut sink = orders_sink(dir.path(), LoadType::IncrementalLoad);
        sink.write(
            "orders",
            &[row(json!({"guid": "A1", "note": "two, words", "amount": true}))],
            None,
        )
        .unwrap();
        sink.finalize_all().unwrap();

        let text = fs::read_to_string(dir.path().join("orders.csv")).unwrap();
        assert!(text.ends_with("A1,true,\"two, words\"\n"));
    }
}
