//! Run context passed down through a pipeline run.
//!
//! The context replaces run-wide counters: every per-entity report and the
//! integrity report are recorded here explicitly, and the quality reporter
//! reads them back from it.

use std::collections::BTreeMap;

use crate::{CleaningReport, Entity, IntegrityReport, PipelineConfig};

/// State accumulated over one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    config: PipelineConfig,
    reports: BTreeMap<Entity, CleaningReport>,
    integrity: Option<IntegrityReport>,
    warnings: Vec<String>,
}

impl RunContext {
    /// Creates a context for a run with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Configuration of this run.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Records the report of a per-entity cleaner.
    pub fn record_cleaning(&mut self, report: CleaningReport) {
        self.reports.insert(report.entity, report);
    }

    /// Report of one entity's cleaner, if it ran.
    pub fn cleaning_report(&self, entity: Entity) -> Option<&CleaningReport> {
        self.reports.get(&entity)
    }

    /// All cleaner reports, in entity order.
    pub fn cleaning_reports(&self) -> impl Iterator<Item = &CleaningReport> {
        self.reports.values()
    }

    /// Records the integrity report.
    pub fn record_integrity(&mut self, report: IntegrityReport) {
        self.integrity = Some(report);
    }

    /// Integrity report, once the enforcer has run.
    pub fn integrity(&self) -> Option<&IntegrityReport> {
        self.integrity.as_ref()
    }

    /// Adds a non-fatal warning.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Non-fatal warnings collected so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_iterate_in_entity_order() {
        let mut ctx = RunContext::new(PipelineConfig::new());
        ctx.record_cleaning(CleaningReport::new(Entity::Events, 3));
        ctx.record_cleaning(CleaningReport::new(Entity::Users, 2));
        ctx.record_cleaning(CleaningReport::new(Entity::DistributionCenters, 1));

        let order: Vec<Entity> = ctx.cleaning_reports().map(|r| r.entity).collect();
        assert_eq!(
            order,
            vec![Entity::DistributionCenters, Entity::Users, Entity::Events]
        );
        assert_eq!(ctx.cleaning_report(Entity::Users).unwrap().original_count, 2);
        assert!(ctx.cleaning_report(Entity::Orders).is_none());
    }

    #[test]
    fn test_warnings_accumulate() {
        let mut ctx = RunContext::new(PipelineConfig::new());
        ctx.add_warning("first");
        ctx.add_warning(String::from("second"));
        assert_eq!(ctx.warnings(), ["first", "second"]);
        assert!(ctx.integrity().is_none());
    }
}
