//! Report and table writers.
//!
//! Nothing written here carries wall-clock data: two runs over the same
//! extracts produce byte-identical files.

use crate::{IoError, table_to_batch};
use arrow_array::{ArrayRef, Float64Array, RecordBatch, StringArray, UInt64Array};
use arrow_csv::WriterBuilder;
use arrow_schema::{Field, Schema};
use ecom_cleaner::{PreparedRun, ProfileSummary, QualitySummary, Table};
use ecom_core::{CleaningReport, IntegrityReport, IntegrityViolation, OutputConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// File name of the raw profiling summary.
pub const PROFILE_SUMMARY_FILE: &str = "data_quality_summary.csv";

/// JSON quality report of a run.
#[derive(Debug, Serialize)]
pub struct QualityReportDocument<'a> {
    pub registry_version: &'a str,
    pub summary: &'a QualitySummary,
    pub cleaning: Vec<&'a CleaningReport>,
    pub integrity: Option<&'a IntegrityReport>,
    pub warnings: &'a [String],
}

impl<'a> QualityReportDocument<'a> {
    /// Collects the report of a prepared run.
    pub fn of(run: &'a PreparedRun, registry_version: &'a str) -> Self {
        Self {
            registry_version,
            summary: &run.summary,
            cleaning: run
                .load_order
                .iter()
                .filter_map(|entity| run.context.cleaning_report(*entity))
                .collect(),
            integrity: run.context.integrity(),
            warnings: run.context.warnings(),
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, IoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| IoError::io(parent, e))?;
    }
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| IoError::io(path, e))
}

fn write_batch(path: &Path, batch: &RecordBatch, delimiter: u8) -> Result<(), IoError> {
    let file = create(path)?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .with_delimiter(delimiter)
        .build(file);
    writer.write(batch)?;

    let mut file = writer.into_inner();
    file.flush().map_err(|e| IoError::io(path, e))
}

fn text_column(values: impl IntoIterator<Item = String>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

fn count_column(values: impl IntoIterator<Item = usize>) -> ArrayRef {
    Arc::new(UInt64Array::from_iter_values(
        values.into_iter().map(|v| v as u64),
    ))
}

fn float_column(values: impl IntoIterator<Item = f64>) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(values))
}

fn batch(columns: Vec<(&str, ArrayRef)>) -> Result<RecordBatch, IoError> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
        .collect();
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Writes a cleaned table.
pub fn write_table(path: &Path, table: &Table, delimiter: u8) -> Result<(), IoError> {
    write_batch(path, &table_to_batch(table)?, delimiter)
}

/// Writes the run summary: one row per table.
pub fn write_summary(path: &Path, summary: &QualitySummary) -> Result<(), IoError> {
    let tables = &summary.tables;
    let batch = batch(vec![
        ("table", text_column(tables.iter().map(|t| t.table.to_string()))),
        ("original_rows", count_column(tables.iter().map(|t| t.rows_in))),
        ("clean_rows", count_column(tables.iter().map(|t| t.rows_out))),
        ("removed_rows", count_column(tables.iter().map(|t| t.removed))),
        ("removed_percent", float_column(tables.iter().map(|t| t.removed_pct))),
    ])?;
    write_batch(path, &batch, b',')?;
    info!("Wrote summary to {}", path.display());
    Ok(())
}

/// Writes the JSON quality report.
pub fn write_quality_report(path: &Path, document: &QualityReportDocument<'_>) -> Result<(), IoError> {
    let mut file = create(path)?;
    serde_json::to_writer_pretty(&mut file, document)?;
    writeln!(file).map_err(|e| IoError::io(path, e))?;
    file.flush().map_err(|e| IoError::io(path, e))?;
    info!("Wrote quality report to {}", path.display());
    Ok(())
}

/// Writes one `<child>__<field>.csv` listing per edge with violations.
///
/// Returns the written paths, in edge order.
pub fn write_violations(dir: &Path, report: &IntegrityReport) -> Result<Vec<PathBuf>, IoError> {
    let mut by_edge: BTreeMap<(String, String), Vec<&IntegrityViolation>> = BTreeMap::new();
    for violation in &report.violations {
        by_edge
            .entry((violation.child.to_string(), violation.field.clone()))
            .or_default()
            .push(violation);
    }

    let mut written = Vec::with_capacity(by_edge.len());
    for ((child, field), violations) in by_edge {
        let path = dir.join(format!("{}__{}.csv", child, field));
        let batch = batch(vec![
            ("child", text_column(violations.iter().map(|v| v.child.to_string()))),
            ("row_key", text_column(violations.iter().map(|v| v.row_key.clone()))),
            ("field", text_column(violations.iter().map(|v| v.field.clone()))),
            ("value", text_column(violations.iter().map(|v| v.value.clone()))),
            ("parent", text_column(violations.iter().map(|v| v.parent.to_string()))),
        ])?;
        write_batch(&path, &batch, b',')?;
        info!("Wrote {} violation(s) to {}", violations.len(), path.display());
        written.push(path);
    }

    Ok(written)
}

/// Writes the summary CSV, the JSON report and the violation listings of a
/// run; returns every written path.
pub fn write_run_outputs(
    output: &OutputConfig,
    run: &PreparedRun,
    registry_version: &str,
) -> Result<Vec<PathBuf>, IoError> {
    let mut written = Vec::new();

    let summary_path = output.summary_path();
    write_summary(&summary_path, &run.summary)?;
    written.push(summary_path);

    let report_path = output.report_path();
    write_quality_report(&report_path, &QualityReportDocument::of(run, registry_version))?;
    written.push(report_path);

    if let Some(integrity) = run.context.integrity() {
        written.extend(write_violations(&output.violations_path(), integrity)?);
    }

    Ok(written)
}

/// Writes the raw profiling summary.
pub fn write_profile(path: &Path, profile: &ProfileSummary) -> Result<(), IoError> {
    let tables = &profile.tables;
    let batch = batch(vec![
        ("table", text_column(tables.iter().map(|t| t.table.to_string()))),
        ("rows", count_column(tables.iter().map(|t| t.rows))),
        ("columns", count_column(tables.iter().map(|t| t.columns))),
        ("missing_values", count_column(tables.iter().map(|t| t.missing_values))),
        ("duplicates", count_column(tables.iter().map(|t| t.duplicates))),
        ("quality_score", float_column(tables.iter().map(|t| t.quality_score))),
    ])?;
    write_batch(path, &batch, b',')?;
    info!("Wrote profile to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecom_cleaner::{RawTable, TableProfile};
    use ecom_core::{Entity, InputConfig, RestrictMode};
    use pretty_assertions::assert_eq;

    fn violation(child: Entity, field: &str, row_key: &str, parent: Entity) -> IntegrityViolation {
        IntegrityViolation {
            child,
            field: field.to_string(),
            parent,
            row_key: row_key.to_string(),
            value: "99".to_string(),
        }
    }

    #[test]
    fn test_write_violations_one_file_per_edge() {
        let dir = tempfile::tempdir().unwrap();
        let report = IntegrityReport {
            passes: 2,
            mode: RestrictMode::Abort,
            edges: Vec::new(),
            violations: vec![
                violation(Entity::Orders, "user_id", "10", Entity::Users),
                violation(Entity::Orders, "user_id", "11", Entity::Users),
                violation(Entity::OrderItems, "product_id", "100", Entity::Products),
            ],
        };

        let written = write_violations(dir.path(), &report).unwrap();

        assert_eq!(
            written,
            vec![
                dir.path().join("order_items__product_id.csv"),
                dir.path().join("orders__user_id.csv"),
            ]
        );
        let orders = fs::read_to_string(dir.path().join("orders__user_id.csv")).unwrap();
        assert_eq!(
            orders,
            "child,row_key,field,value,parent\norders,10,user_id,99,users\norders,11,user_id,99,users\n"
        );
    }

    #[test]
    fn test_no_violations_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let report = IntegrityReport {
            passes: 1,
            mode: RestrictMode::Abort,
            edges: Vec::new(),
            violations: Vec::new(),
        };

        assert!(write_violations(&dir.path().join("violations"), &report).unwrap().is_empty());
        assert!(!dir.path().join("violations").exists());
    }

    #[test]
    fn test_write_profile() {
        let dir = tempfile::tempdir().unwrap();
        let raw = RawTable::from_strs(&["id", "city"], &[&["1", "Rome"], &["2", ""]]);
        let profile = ProfileSummary::new(
            vec![TableProfile::of(Entity::Users, &raw, &InputConfig::default())],
            Vec::new(),
        );
        let path = dir.path().join(PROFILE_SUMMARY_FILE);

        write_profile(&path, &profile).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("table,rows,columns,missing_values,duplicates,quality_score")
        );
        assert!(lines.next().unwrap().starts_with("users,2,2,1,0,75"));
    }
}
