//! Raw extract profiling.
//!
//! Profiles the raw extracts before any cleaning: row and column counts,
//! missing cells per column, exact-duplicate rows and a completeness score.
//! Missing extracts are skipped, so a partial drop can still be inspected.

use crate::quality::round_to;
use crate::{RawTable, Source, SourceError};
use ecom_core::{Entity, InputConfig};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// Mean completeness required for an acceptable assessment, in percent.
pub const MIN_MEAN_COMPLETENESS: f64 = 95.0;

/// Duplicate rows tolerated per profiled table.
pub const MAX_DUPLICATES_PER_TABLE: usize = 100;

/// Profile of one raw extract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableProfile {
    pub table: Entity,
    pub rows: usize,
    pub columns: usize,
    /// Missing cells over every column
    pub missing_values: usize,
    /// Missing cells per column, only columns with at least one
    pub missing_by_column: BTreeMap<String, usize>,
    /// Rows identical to an earlier row
    pub duplicates: usize,
    /// Non-missing share of all cells, in percent with two decimals
    pub quality_score: f64,
}

impl TableProfile {
    /// Profiles a raw extract.
    pub fn of(table: Entity, raw: &RawTable, input: &InputConfig) -> Self {
        let mut missing_by_column: BTreeMap<String, usize> = BTreeMap::new();
        let mut seen: HashSet<&[Option<String>]> = HashSet::with_capacity(raw.len());
        let mut duplicates = 0;

        for row in &raw.rows {
            for (header, cell) in raw.headers.iter().zip(row) {
                let missing = cell.as_deref().is_none_or(|c| input.is_null_token(c));
                if missing {
                    *missing_by_column.entry(header.trim().to_string()).or_default() += 1;
                }
            }
            if !seen.insert(row.as_slice()) {
                duplicates += 1;
            }
        }

        let rows = raw.len();
        let columns = raw.headers.len();
        let missing_values = missing_by_column.values().sum();
        let cells = rows * columns;
        let quality_score = if cells == 0 {
            100.0
        } else {
            round_to((cells - missing_values) as f64 / cells as f64 * 100.0, 2)
        };

        Self {
            table,
            rows,
            columns,
            missing_values,
            missing_by_column,
            duplicates,
            quality_score,
        }
    }
}

/// Profiles of every available extract plus the overall assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub tables: Vec<TableProfile>,
    /// Entities with no extract
    pub skipped: Vec<Entity>,
    /// Mean of the per-table completeness scores
    pub mean_completeness: f64,
    pub total_duplicates: usize,
    pub acceptable: bool,
}

impl ProfileSummary {
    /// Builds the assessment over a set of table profiles.
    pub fn new(tables: Vec<TableProfile>, skipped: Vec<Entity>) -> Self {
        let mean_completeness = if tables.is_empty() {
            0.0
        } else {
            round_to(
                tables.iter().map(|t| t.quality_score).sum::<f64>() / tables.len() as f64,
                2,
            )
        };
        let total_duplicates = tables.iter().map(|t| t.duplicates).sum();
        let acceptable = !tables.is_empty()
            && mean_completeness >= MIN_MEAN_COMPLETENESS
            && total_duplicates < MAX_DUPLICATES_PER_TABLE * tables.len();

        Self {
            tables,
            skipped,
            mean_completeness,
            total_duplicates,
            acceptable,
        }
    }
}

/// Profiles the raw extracts of the given entities, skipping missing ones.
pub fn profile_source(
    source: &dyn Source,
    entities: &[Entity],
    input: &InputConfig,
) -> Result<ProfileSummary, SourceError> {
    let mut tables = Vec::new();
    let mut skipped = Vec::new();

    for entity in entities {
        match source.extract(*entity) {
            Ok(raw) => {
                let profile = TableProfile::of(*entity, &raw, input);
                info!(
                    "Profiled {}: {} rows, {} missing cells, {} duplicate rows",
                    entity, profile.rows, profile.missing_values, profile.duplicates
                );
                tables.push(profile);
            }
            Err(SourceError::Missing { location, .. }) => {
                warn!("Skipping {}: no extract at {}", entity, location);
                skipped.push(*entity);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(ProfileSummary::new(tables, skipped))
}
