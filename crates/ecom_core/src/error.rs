//! Error types for registry declarations and pipeline configuration.
//!
//! These are definition-time errors: they describe a registry or a
//! configuration that cannot be used, never a problem with the data being
//! cleaned. Data problems are recorded as removals in the cleaning reports.

use thiserror::Error;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised while validating or querying a schema registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Entity name is not one of the known tables
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Entity declared twice
    #[error("Entity '{0}' is declared more than once")]
    DuplicateEntity(String),

    /// Entity is known but absent from this registry
    #[error("Entity '{0}' is not declared in the registry")]
    MissingEntity(String),

    /// Field referenced but not declared
    #[error("Unknown field '{field}' on entity '{entity}'")]
    UnknownField {
        /// Entity name
        entity: String,
        /// Field name
        field: String,
    },

    /// Field declared twice
    #[error("Field '{field}' is declared more than once on entity '{entity}'")]
    DuplicateField {
        /// Entity name
        entity: String,
        /// Field name
        field: String,
    },

    /// Foreign key edge is not well formed
    #[error("Invalid foreign key {entity}.{field}: {message}")]
    InvalidEdge {
        /// Child entity
        entity: String,
        /// Foreign key field
        field: String,
        /// What is wrong with the edge
        message: String,
    },

    /// Constraint cannot be evaluated (bad regex, inverted range...)
    #[error("Invalid constraint on {entity}.{field}: {message}")]
    InvalidConstraint {
        /// Entity name
        entity: String,
        /// Field name
        field: String,
        /// Failure details
        message: String,
    },

    /// Foreign keys form a cycle, so no load order exists
    #[error("Foreign keys form a cycle through: {0}")]
    Cycle(String),
}

/// Errors raised while validating a pipeline configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration value is out of its allowed domain
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Dotted configuration key
        key: String,
        /// Failure details
        message: String,
    },
}

impl ConfigError {
    /// Creates a new invalid-value error.
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}
