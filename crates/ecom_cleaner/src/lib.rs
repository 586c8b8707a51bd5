//! # E-commerce Cleaner
//!
//! Cleaning and referential integrity engine for the e-commerce extracts.
//! This crate turns raw, untyped extracts into typed, relationally
//! consistent tables:
//!
//! - Type coercion at the registry boundary (ints, decimals, timestamps)
//! - Normalization, default fills and single-field constraints
//! - Per-entity business rules and keep-first deduplication
//! - Fixed-point referential integrity (cascade, set null, restrict)
//! - Quality metrics and raw extract profiling
//!
//! ## Example
//!
//! ```rust
//! use ecom_cleaner::{RawTable, TableCleaner};
//! use ecom_core::{
//!     Entity, EntitySchemaBuilder, FieldBuilder, FieldType, InputConfig, RuleConfig,
//! };
//!
//! let schema = EntitySchemaBuilder::new(Entity::Users, "id")
//!     .field(FieldBuilder::new("id", FieldType::Int).nullable(false).build())
//!     .field(FieldBuilder::new("age", FieldType::Int).nullable(false).build())
//!     .build();
//! let raw = RawTable::from_strs(&["id", "age"], &[&["1", "34"], &["2", "15"]]);
//!
//! let input = InputConfig::default();
//! let mut cleaner = TableCleaner::new(&schema, &input, &RuleConfig::default()).unwrap();
//! let (table, report) = cleaner.clean(&raw);
//!
//! assert_eq!(table.len(), 1);
//! assert_eq!(report.removed_count, 1);
//! ```

mod cleaner;
pub mod cleaners;
mod constraints;
mod dataset;
mod engine;
mod error;
mod integrity;
mod profile;
mod quality;
pub mod schema;
mod sink;

pub use cleaner::*;
pub use constraints::*;
pub use dataset::*;
pub use engine::*;
pub use error::*;
pub use integrity::*;
pub use profile::*;
pub use quality::*;
pub use sink::*;
