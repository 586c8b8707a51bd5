//! Error types for cleaning operations.
//!
//! Row removals are not errors; they are recorded in the reports. The types
//! here cover what halts a run.

use ecom_core::{ConfigError, Entity, FieldType, RegistryError};
use thiserror::Error;

/// A raw cell that cannot be read as its declared type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot read '{value}' as {expected}")]
pub struct CoercionError {
    /// Raw cell
    pub value: String,
    /// Declared type
    pub expected: FieldType,
}

impl CoercionError {
    /// Creates a new coercion error.
    pub fn new(value: impl Into<String>, expected: FieldType) -> Self {
        Self {
            value: value.into(),
            expected,
        }
    }
}

/// Errors raised while reading a raw extract.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No extract exists for the entity
    #[error("no raw extract for '{entity}' at {location}")]
    Missing { entity: Entity, location: String },

    /// The extract exists but could not be read
    #[error("failed to read extract for '{entity}': {message}")]
    Unreadable { entity: Entity, message: String },
}

impl SourceError {
    /// Creates a new missing-extract error.
    pub fn missing(entity: Entity, location: impl Into<String>) -> Self {
        Self::Missing {
            entity,
            location: location.into(),
        }
    }

    /// Creates a new unreadable-extract error.
    pub fn unreadable(entity: Entity, message: impl Into<String>) -> Self {
        Self::Unreadable {
            entity,
            message: message.into(),
        }
    }
}

/// Errors reported by a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink refused the table
    #[error("rejected: {0}")]
    Rejected(String),
}

impl SinkError {
    /// Creates a new rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Errors that halt a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Registry declaration is invalid
    #[error("Invalid registry: {0}")]
    Registry(#[from] RegistryError),

    /// Configuration is invalid
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A raw extract could not be obtained
    #[error("Extract failed: {0}")]
    Source(#[from] SourceError),

    /// Restrict foreign keys left dangling after the integrity pass
    #[error("{count} unresolved integrity violation(s), first: {first}")]
    IntegrityViolation { count: usize, first: String },

    /// The integrity pass did not reach a fixed point in time
    #[error("Integrity pass did not reach a fixed point within {max_passes} passes")]
    PassLimitExceeded { max_passes: usize },

    /// A quality target was missed in strict mode
    #[error("Quality target missed: {0}")]
    QualityTargetMissed(String),

    /// The sink failed to load an entity; later entities were not loaded
    #[error("Sink failed for '{entity}': {source}")]
    Sink {
        entity: Entity,
        #[source]
        source: SinkError,
    },

    /// A cleaning worker did not complete
    #[error("Worker for '{entity}' failed: {message}")]
    Worker { entity: Entity, message: String },
}

impl PipelineError {
    /// Creates a new sink error.
    pub fn sink(entity: Entity, source: SinkError) -> Self {
        Self::Sink { entity, source }
    }

    /// Creates a new worker error.
    pub fn worker(entity: Entity, message: impl Into<String>) -> Self {
        Self::Worker {
            entity,
            message: message.into(),
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
