//! Referential integrity enforcement.
//!
//! Runs once every entity has been cleaned. `cascade` and `set null` edges
//! are applied until a pass changes nothing; `restrict` edges are then
//! evaluated on that fixed-point state, so a row cascaded away is never
//! reported. In quarantine mode the violating rows are removed and the loop
//! starts over, since their removal can orphan rows on cascade edges.

use crate::{PipelineError, Table, Value};
use ecom_core::{
    EdgeOutcome, Entity, ForeignKey, IntegrityConfig, IntegrityReport, IntegrityViolation,
    OnDelete, RestrictMode, SchemaRegistry,
};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Enforces the registry's foreign-key edges over the cleaned table set.
pub struct IntegrityEnforcer<'a> {
    registry: &'a SchemaRegistry,
    config: &'a IntegrityConfig,
}

impl<'a> IntegrityEnforcer<'a> {
    /// Creates an enforcer.
    pub fn new(registry: &'a SchemaRegistry, config: &'a IntegrityConfig) -> Self {
        Self { registry, config }
    }

    /// Enforces every edge until a fixed point is reached.
    ///
    /// Returns the per-edge outcome and every restrict violation. Unresolved
    /// violations are reported, not raised; the caller decides whether the
    /// run may proceed to load.
    pub fn enforce(
        &self,
        tables: &mut BTreeMap<Entity, Table>,
    ) -> Result<IntegrityReport, PipelineError> {
        let edges: Vec<(Entity, &ForeignKey)> = self.registry.all_edges().collect();
        let mut outcomes: Vec<EdgeOutcome> = edges
            .iter()
            .map(|(child, fk)| EdgeOutcome {
                child: *child,
                field: fk.field.clone(),
                parent: fk.references,
                on_delete: fk.on_delete,
                removed: 0,
                nulled: 0,
                violations: 0,
            })
            .collect();
        let mut violations = Vec::new();
        let mut passes = 0;

        loop {
            passes += 1;
            if passes > self.config.max_passes {
                return Err(PipelineError::PassLimitExceeded {
                    max_passes: self.config.max_passes,
                });
            }

            let mut changed = false;
            for (i, (child, fk)) in edges.iter().enumerate() {
                if fk.on_delete == OnDelete::Restrict {
                    continue;
                }
                let applied = self.apply_edge(tables, *child, fk);
                match fk.on_delete {
                    OnDelete::Cascade => outcomes[i].removed += applied,
                    OnDelete::SetNull => outcomes[i].nulled += applied,
                    OnDelete::Restrict => {}
                }
                changed |= applied > 0;
            }

            if changed {
                debug!("Integrity pass {} changed rows, repeating", passes);
                continue;
            }

            // Fixed point for cascade/set-null; evaluate restrict edges.
            let mut found = Vec::new();
            for (i, (child, fk)) in edges.iter().enumerate() {
                if fk.on_delete != OnDelete::Restrict {
                    continue;
                }
                let dangling = self.dangling(tables, *child, fk);
                outcomes[i].violations += dangling.len();
                found.push((i, *child, dangling));
            }

            let total: usize = found.iter().map(|(_, _, d)| d.len()).sum();
            for (_, _, dangling) in &found {
                violations.extend(dangling.iter().map(|(_, v)| v.clone()));
            }

            if total == 0 || self.config.on_restrict_violation == RestrictMode::Abort {
                break;
            }

            warn!("Quarantining {} row(s) with dangling restrict references", total);
            for (i, child, dangling) in found {
                let indexes: HashSet<usize> = dangling.iter().map(|(index, _)| *index).collect();
                if let Some(table) = tables.get_mut(&child) {
                    let before = table.len();
                    table.rows.retain(|r| !indexes.contains(&r.index));
                    outcomes[i].removed += before - table.len();
                }
            }
        }

        violations.sort();
        info!(
            "Integrity enforcement reached a fixed point after {} pass(es), {} violation(s)",
            passes,
            violations.len()
        );

        Ok(IntegrityReport {
            passes,
            mode: self.config.on_restrict_violation,
            edges: outcomes,
            violations,
        })
    }

    /// Applies a cascade or set-null edge once; returns the rows touched.
    fn apply_edge(&self, tables: &mut BTreeMap<Entity, Table>, child: Entity, fk: &ForeignKey) -> usize {
        let parent_keys = parent_keys(tables, fk);
        let Some(table) = tables.get_mut(&child) else {
            return 0;
        };
        let Some(position) = table.column_index(&fk.field) else {
            return 0;
        };

        let orphaned = |value: &Value| !value.is_null() && !parent_keys.contains(value);

        match fk.on_delete {
            OnDelete::Cascade => {
                let before = table.len();
                table.rows.retain(|r| !orphaned(&r.values[position]));
                before - table.len()
            }
            OnDelete::SetNull => {
                let mut nulled = 0;
                for record in &mut table.rows {
                    if orphaned(&record.values[position]) {
                        record.values[position] = Value::Null;
                        nulled += 1;
                    }
                }
                nulled
            }
            OnDelete::Restrict => 0,
        }
    }

    /// Child rows whose restrict foreign key does not resolve, with their
    /// input index.
    fn dangling(
        &self,
        tables: &BTreeMap<Entity, Table>,
        child: Entity,
        fk: &ForeignKey,
    ) -> Vec<(usize, IntegrityViolation)> {
        let parent_keys = parent_keys(tables, fk);
        let Some(table) = tables.get(&child) else {
            return Vec::new();
        };
        let primary_key = self
            .registry
            .describe(child)
            .map(|s| s.primary_key.clone())
            .unwrap_or_default();

        table
            .rows
            .iter()
            .filter_map(|record| {
                let value = table.value(record, &fk.field);
                if value.is_null() || parent_keys.contains(value) {
                    return None;
                }
                Some((
                    record.index,
                    IntegrityViolation {
                        child,
                        field: fk.field.clone(),
                        parent: fk.references,
                        row_key: table.value(record, &primary_key).to_string(),
                        value: value.to_string(),
                    },
                ))
            })
            .collect()
    }
}

/// Values of the referenced field in the parent table.
fn parent_keys(tables: &BTreeMap<Entity, Table>, fk: &ForeignKey) -> HashSet<Value> {
    tables
        .get(&fk.references)
        .map(|parent| parent.column_values(&fk.target_field).cloned().collect())
        .unwrap_or_default()
}
