//! Pipeline engine.
//!
//! This module provides the [`Pipeline`] that orchestrates a run: every
//! entity is cleaned on its own blocking worker, the workers are joined, the
//! integrity enforcer runs once over the union of cleaned tables, and the
//! quality summary is built. Loading is a separate step so callers can
//! inspect or persist the reports first.

use crate::{
    IntegrityEnforcer, PipelineError, QualityReporter, QualitySummary, Result, Sink, Source,
    Table, TableCleaner,
};
use ecom_core::{
    CleaningReport, Entity, PipelineConfig, RemovalKind, RunContext, SchemaRegistry,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cleaning and integrity pipeline over one registry.
///
/// # Example
///
/// ```rust,no_run
/// use ecom_cleaner::{MemorySink, MemorySource, Pipeline};
/// use ecom_core::{PipelineConfig, SchemaRegistry};
/// use std::sync::Arc;
///
/// # async fn example(registry: SchemaRegistry, source: MemorySource) -> ecom_cleaner::Result<()> {
/// let pipeline = Pipeline::new(Arc::new(registry), PipelineConfig::new())?;
/// let mut sink = MemorySink::new();
///
/// let run = pipeline.run(Arc::new(source), &mut sink).await?;
/// println!("quality score: {}", run.summary.quality_score);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    registry: Arc<SchemaRegistry>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline, validating the registry and the configuration.
    pub fn new(registry: Arc<SchemaRegistry>, config: PipelineConfig) -> Result<Self> {
        registry.validate()?;
        config.validate()?;
        Ok(Self { registry, config })
    }

    /// Registry driving this pipeline.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Configuration of this pipeline.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs both passes without loading anything.
    ///
    /// Fails on the first missing or unreadable extract and when the
    /// integrity pass does not converge. Restrict violations and missed
    /// quality targets are recorded in the returned run; see
    /// [`PreparedRun::ensure_loadable`].
    pub async fn prepare(&self, source: Arc<dyn Source>) -> Result<PreparedRun> {
        let load_order = self.registry.load_order()?;
        let mut context = RunContext::new(self.config.clone());

        info!("Cleaning {} entities", self.registry.entities.len());

        let workers: Vec<_> = self
            .registry
            .entities
            .iter()
            .map(|schema| {
                let entity = schema.name;
                let schema = schema.clone();
                let input = self.config.input.clone();
                let rules = self.config.rules.clone();
                let source = Arc::clone(&source);

                let handle = tokio::task::spawn_blocking(
                    move || -> Result<(Table, CleaningReport)> {
                        let raw = source.extract(entity)?;
                        let mut cleaner = TableCleaner::new(&schema, &input, &rules)?;
                        Ok(cleaner.clean(&raw))
                    },
                );
                (entity, handle)
            })
            .collect();

        // Barrier: join in registry order, never completion order.
        let mut tables = BTreeMap::new();
        for (entity, handle) in workers {
            let (table, report) = handle
                .await
                .map_err(|e| PipelineError::worker(entity, e.to_string()))??;

            info!(
                "Cleaned {}: {} of {} rows kept ({} business rule, {} error removals)",
                entity,
                report.cleaned_count,
                report.original_count,
                report.removed(RemovalKind::BusinessRule),
                report.removed_count - report.removed(RemovalKind::BusinessRule),
            );
            context.record_cleaning(report);
            tables.insert(entity, table);
        }

        let integrity = IntegrityEnforcer::new(&self.registry, &self.config.integrity)
            .enforce(&mut tables)?;
        for violation in &integrity.violations {
            debug!("Integrity violation: {}", violation);
        }
        context.record_integrity(integrity);

        let reporter = QualityReporter::new(&self.config.quality);
        let summary = reporter.summarize(&context, &tables, &load_order);
        for miss in reporter.check_targets(&summary) {
            warn!("Quality target missed: {}", miss);
            context.add_warning(miss);
        }

        info!(
            "Run prepared: {} of {} rows kept, quality score {:.4}",
            summary.total_clean_rows, summary.total_original_rows, summary.quality_score
        );

        Ok(PreparedRun {
            tables,
            context,
            summary,
            load_order,
        })
    }

    /// Prepares a run and loads it into the sink.
    pub async fn run(&self, source: Arc<dyn Source>, sink: &mut dyn Sink) -> Result<PreparedRun> {
        let run = self.prepare(source).await?;
        run.load(sink)?;
        Ok(run)
    }
}

/// A run whose cleaning and integrity passes are complete.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    /// Final tables, by entity
    pub tables: BTreeMap<Entity, Table>,
    /// Reports and warnings of the run
    pub context: RunContext,
    /// Per-table and overall quality metrics
    pub summary: QualitySummary,
    /// Parents before children
    pub load_order: Vec<Entity>,
}

impl PreparedRun {
    /// Final table of an entity.
    pub fn table(&self, entity: Entity) -> Option<&Table> {
        self.tables.get(&entity)
    }

    /// Checks that nothing forbids loading this run.
    ///
    /// Unresolved restrict violations always forbid it; missed quality
    /// targets only in strict mode.
    pub fn ensure_loadable(&self) -> Result<()> {
        if let Some(integrity) = self.context.integrity() {
            if integrity.has_unresolved() {
                let first = integrity
                    .violations
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                return Err(PipelineError::IntegrityViolation {
                    count: integrity.violations.len(),
                    first,
                });
            }
        }

        let warnings = self.context.warnings();
        if self.context.config().quality.strict && !warnings.is_empty() {
            return Err(PipelineError::QualityTargetMissed(warnings.join("; ")));
        }

        Ok(())
    }

    /// Loads every table into the sink in load order.
    ///
    /// Stops at the first failure; later entities are not handed to the sink.
    pub fn load(&self, sink: &mut dyn Sink) -> Result<()> {
        self.ensure_loadable()?;

        for entity in &self.load_order {
            let Some(table) = self.tables.get(entity) else {
                continue;
            };
            sink.load(*entity, table)
                .map_err(|e| PipelineError::sink(*entity, e))?;
            info!("Loaded {} ({} rows)", entity, table.len());
        }

        Ok(())
    }
}
