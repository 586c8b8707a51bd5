//! Quality metrics.
//!
//! This module aggregates the cleaner reports and the integrity report of a
//! run into per-table figures and an overall quality score:
//! - Business-rule removals are counted apart and never lower the score
//! - Data errors, duplicates and integrity removals are errors
//! - Targets are checked last; a miss is a warning unless strict mode is on

use crate::Table;
use ecom_core::{Entity, QualityTargets, RemovalKind, RunContext};
use serde::Serialize;
use std::collections::BTreeMap;

/// Quality figures of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableQuality {
    /// Table name
    pub table: Entity,
    /// Raw rows read
    pub rows_in: usize,
    /// Rows left after cleaning and integrity enforcement
    pub rows_out: usize,
    /// Rows removed for any reason
    pub removed: usize,
    /// Removed share of the raw rows, in percent with two decimals
    pub removed_pct: f64,
    pub business_rule_removed: usize,
    pub data_error_removed: usize,
    pub duplicate_removed: usize,
    pub integrity_removed: usize,
    /// Foreign keys rewritten to null by `set null` edges
    pub nulled_references: usize,
    /// Rows kept with a warning-level constraint failure
    pub flagged: usize,
    pub missing_value_counts: BTreeMap<String, usize>,
}

impl TableQuality {
    /// Removals that count against the quality score.
    pub fn error_removed(&self) -> usize {
        self.data_error_removed + self.duplicate_removed + self.integrity_removed
    }
}

/// Run-wide quality summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySummary {
    /// Per-table figures, in load order
    pub tables: Vec<TableQuality>,
    pub total_original_rows: usize,
    pub total_clean_rows: usize,
    pub total_removed: usize,
    /// Removals required by domain policy
    pub business_rule_removed: usize,
    /// Data errors, duplicates and integrity removals
    pub error_removed: usize,
    /// Integrity enforcement passes
    pub integrity_passes: usize,
    /// Restrict violations found
    pub integrity_violations: usize,
    /// `1 - error_removed / total_original_rows`, four decimals
    pub quality_score: f64,
}

impl QualitySummary {
    /// Figures of one table.
    pub fn table(&self, entity: Entity) -> Option<&TableQuality> {
        self.tables.iter().find(|t| t.table == entity)
    }
}

/// Builds quality summaries and checks them against targets.
pub struct QualityReporter<'a> {
    targets: &'a QualityTargets,
}

impl<'a> QualityReporter<'a> {
    /// Creates a reporter for the given targets.
    pub fn new(targets: &'a QualityTargets) -> Self {
        Self { targets }
    }

    /// Summarizes a run.
    ///
    /// `order` fixes the table order of the summary. Entities without a
    /// cleaner report are skipped.
    pub fn summarize(
        &self,
        context: &RunContext,
        tables: &BTreeMap<Entity, Table>,
        order: &[Entity],
    ) -> QualitySummary {
        let integrity = context.integrity();

        let per_table: Vec<TableQuality> = order
            .iter()
            .filter_map(|entity| {
                let report = context.cleaning_report(*entity)?;
                let rows_out = tables.get(entity).map_or(0, Table::len);
                let removed = report.original_count.saturating_sub(rows_out);

                Some(TableQuality {
                    table: *entity,
                    rows_in: report.original_count,
                    rows_out,
                    removed,
                    removed_pct: percent(removed, report.original_count),
                    business_rule_removed: report.removed(RemovalKind::BusinessRule),
                    data_error_removed: report.removed(RemovalKind::DataError),
                    duplicate_removed: report.removed(RemovalKind::DuplicateKey),
                    integrity_removed: integrity.map_or(0, |i| i.removed_from(*entity)),
                    nulled_references: integrity.map_or(0, |i| i.nulled_in(*entity)),
                    flagged: report.flagged_count(),
                    missing_value_counts: report.missing_values.clone(),
                })
            })
            .collect();

        let total_original_rows = per_table.iter().map(|t| t.rows_in).sum();
        let total_clean_rows = per_table.iter().map(|t| t.rows_out).sum();
        let total_removed = per_table.iter().map(|t| t.removed).sum();
        let business_rule_removed = per_table.iter().map(|t| t.business_rule_removed).sum();
        let error_removed = per_table.iter().map(TableQuality::error_removed).sum();

        QualitySummary {
            tables: per_table,
            total_original_rows,
            total_clean_rows,
            total_removed,
            business_rule_removed,
            error_removed,
            integrity_passes: integrity.map_or(0, |i| i.passes),
            integrity_violations: integrity.map_or(0, |i| i.violations.len()),
            quality_score: quality_score(error_removed, total_original_rows),
        }
    }

    /// Checks a summary against the targets; returns one message per miss.
    pub fn check_targets(&self, summary: &QualitySummary) -> Vec<String> {
        let mut misses = Vec::new();

        if let Some(min) = self.targets.min_quality_score {
            if summary.quality_score < min {
                misses.push(format!(
                    "quality score {:.4} is below the target {:.4}",
                    summary.quality_score, min
                ));
            }
        }

        for table in &summary.tables {
            if let Some(max) = self.targets.max_removed_for(table.table) {
                if table.removed_pct > max {
                    misses.push(format!(
                        "{} removed {:.2}% of its rows, above the target {:.2}%",
                        table.table, table.removed_pct, max
                    ));
                }
            }
        }

        misses
    }
}

/// `part / whole` in percent, two decimals; zero for an empty whole.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, 2)
}

/// `1 - errors / total`, four decimals; a run with no rows scores 1.
pub fn quality_score(errors: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    round_to(1.0 - errors as f64 / total as f64, 4)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
