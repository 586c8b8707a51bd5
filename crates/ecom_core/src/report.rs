//! Report records produced by the cleaning and integrity passes.
//!
//! Removals are data, not errors: every dropped row is recorded with a
//! [`RemovalKind`] and a reason label, and the quality reporter aggregates
//! the counts. Business-rule removals and error removals are kept apart all
//! the way through.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Entity, OnDelete, RestrictMode};

/// Why a row was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalKind {
    /// Expected exclusion required by a domain policy (e.g. minimum age)
    BusinessRule,
    /// Malformed or inconsistent value
    DataError,
    /// Later occurrence of an already-seen key
    DuplicateKey,
    /// Removed by the integrity pass (cascade or quarantine)
    Integrity,
}

impl RemovalKind {
    /// Returns true for removals that count against the quality score.
    pub fn is_error(&self) -> bool {
        !matches!(self, RemovalKind::BusinessRule)
    }
}

impl fmt::Display for RemovalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemovalKind::BusinessRule => "business_rule",
            RemovalKind::DataError => "data_error",
            RemovalKind::DuplicateKey => "duplicate_key",
            RemovalKind::Integrity => "integrity",
        };
        f.write_str(name)
    }
}

/// A single row removal decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// Category
    pub kind: RemovalKind,
    /// Stable reason label, e.g. `shipped_at_before_created_at`
    pub reason: String,
}

impl Removal {
    /// Business-rule removal.
    pub fn business_rule(reason: impl Into<String>) -> Self {
        Self {
            kind: RemovalKind::BusinessRule,
            reason: reason.into(),
        }
    }

    /// Data-error removal.
    pub fn data_error(reason: impl Into<String>) -> Self {
        Self {
            kind: RemovalKind::DataError,
            reason: reason.into(),
        }
    }

    /// Duplicate-key removal.
    pub fn duplicate(reason: impl Into<String>) -> Self {
        Self {
            kind: RemovalKind::DuplicateKey,
            reason: reason.into(),
        }
    }
}

/// Report emitted by a per-entity cleaner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Entity cleaned
    pub entity: Entity,

    /// Rows in the raw extract
    pub original_count: usize,

    /// Rows surviving cleaning
    pub cleaned_count: usize,

    /// Rows removed by cleaning
    pub removed_count: usize,

    /// Removed rows per kind
    pub removed_by_kind: BTreeMap<RemovalKind, usize>,

    /// Removed rows per reason label
    pub removed_by_reason: BTreeMap<String, usize>,

    /// Null cells per declared field in the raw extract
    pub missing_values: BTreeMap<String, usize>,

    /// Nulls replaced by a default, per field
    pub filled_values: BTreeMap<String, usize>,

    /// Warning-severity failures on kept rows, per reason label
    pub flagged: BTreeMap<String, usize>,
}

impl CleaningReport {
    /// Creates an empty report for a raw extract of `original_count` rows.
    pub fn new(entity: Entity, original_count: usize) -> Self {
        Self {
            entity,
            original_count,
            cleaned_count: original_count,
            removed_count: 0,
            removed_by_kind: BTreeMap::new(),
            removed_by_reason: BTreeMap::new(),
            missing_values: BTreeMap::new(),
            filled_values: BTreeMap::new(),
            flagged: BTreeMap::new(),
        }
    }

    /// Records a dropped row.
    pub fn record_removal(&mut self, removal: &Removal) {
        *self.removed_by_kind.entry(removal.kind).or_default() += 1;
        *self
            .removed_by_reason
            .entry(removal.reason.clone())
            .or_default() += 1;
        self.removed_count += 1;
        self.cleaned_count = self.original_count - self.removed_count;
    }

    /// Records a null raw cell.
    pub fn record_missing(&mut self, field: &str) {
        *self.missing_values.entry(field.to_string()).or_default() += 1;
    }

    /// Records a default fill.
    pub fn record_fill(&mut self, field: &str) {
        *self.filled_values.entry(field.to_string()).or_default() += 1;
    }

    /// Records a warning on a kept row.
    pub fn record_flag(&mut self, reason: impl Into<String>) {
        *self.flagged.entry(reason.into()).or_default() += 1;
    }

    /// Rows removed with the given kind.
    pub fn removed(&self, kind: RemovalKind) -> usize {
        self.removed_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Total flagged failures.
    pub fn flagged_count(&self) -> usize {
        self.flagged.values().sum()
    }
}

/// Outcome of one foreign-key edge after the integrity pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeOutcome {
    /// Child entity
    pub child: Entity,
    /// Foreign-key field
    pub field: String,
    /// Parent entity
    pub parent: Entity,
    /// Policy applied
    pub on_delete: OnDelete,
    /// Child rows removed
    pub removed: usize,
    /// Foreign keys rewritten to null
    pub nulled: usize,
    /// Unresolved restrict violations
    pub violations: usize,
}

/// A child row whose restrict foreign key does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntegrityViolation {
    /// Child entity
    pub child: Entity,
    /// Foreign-key field
    pub field: String,
    /// Parent entity
    pub parent: Entity,
    /// Primary key of the child row
    pub row_key: String,
    /// Dangling foreign-key value
    pub value: String,
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} row {}: {} = {} has no matching {}",
            self.child, self.row_key, self.field, self.value, self.parent
        )
    }
}

/// Report emitted by the referential integrity enforcer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Passes run until the fixed point
    pub passes: usize,

    /// How restrict violations were handled
    pub mode: RestrictMode,

    /// Per-edge outcome, in registry edge order
    pub edges: Vec<EdgeOutcome>,

    /// Every restrict violation found on the fixed-point state
    pub violations: Vec<IntegrityViolation>,
}

impl IntegrityReport {
    /// Rows removed from an entity by the integrity pass.
    pub fn removed_from(&self, entity: Entity) -> usize {
        self.edges
            .iter()
            .filter(|e| e.child == entity)
            .map(|e| e.removed)
            .sum()
    }

    /// Foreign keys nulled in an entity by the integrity pass.
    pub fn nulled_in(&self, entity: Entity) -> usize {
        self.edges
            .iter()
            .filter(|e| e.child == entity)
            .map(|e| e.nulled)
            .sum()
    }

    /// Returns true if restrict violations were left in place.
    pub fn has_unresolved(&self) -> bool {
        self.mode == RestrictMode::Abort && !self.violations.is_empty()
    }
}
