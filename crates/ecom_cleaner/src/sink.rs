//! Extract source and loader sink contracts.
//!
//! The pipeline reads one raw extract per entity from a [`Source`] and, once
//! both passes are done, hands each cleaned table to a [`Sink`] in load
//! order. Atomicity of the multi-table load belongs to the sink.

use crate::{RawTable, SinkError, SourceError, Table};
use ecom_core::Entity;
use std::collections::BTreeMap;

/// Supplies raw extracts.
///
/// Sources are shared across cleaning workers, so they must be thread-safe.
pub trait Source: Send + Sync {
    /// Reads the raw extract of one entity.
    fn extract(&self, entity: Entity) -> Result<RawTable, SourceError>;
}

/// Persists cleaned tables.
pub trait Sink {
    /// Loads one cleaned table.
    fn load(&mut self, entity: Entity, table: &Table) -> Result<(), SinkError>;
}

/// In-memory source, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: BTreeMap<Entity, RawTable>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the raw extract of an entity.
    pub fn with_table(mut self, entity: Entity, table: RawTable) -> Self {
        self.tables.insert(entity, table);
        self
    }

    /// Adds the raw extract of an entity in place.
    pub fn insert(&mut self, entity: Entity, table: RawTable) {
        self.tables.insert(entity, table);
    }
}

impl Source for MemorySource {
    fn extract(&self, entity: Entity) -> Result<RawTable, SourceError> {
        self.tables
            .get(&entity)
            .cloned()
            .ok_or_else(|| SourceError::missing(entity, "memory"))
    }
}

/// In-memory sink recording every load, in call order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Loaded tables, in load order
    pub loaded: Vec<(Entity, Table)>,

    /// Entity whose load is refused, if any
    pub fail_on: Option<Entity>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that refuses to load the given entity.
    pub fn failing_on(entity: Entity) -> Self {
        Self {
            loaded: Vec::new(),
            fail_on: Some(entity),
        }
    }

    /// Entities loaded so far, in order.
    pub fn entities(&self) -> Vec<Entity> {
        self.loaded.iter().map(|(e, _)| *e).collect()
    }
}

impl Sink for MemorySink {
    fn load(&mut self, entity: Entity, table: &Table) -> Result<(), SinkError> {
        if self.fail_on == Some(entity) {
            return Err(SinkError::rejected(format!("refusing to load {}", entity)));
        }
        self.loaded.push((entity, table.clone()));
        Ok(())
    }
}
