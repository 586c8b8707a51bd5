//! # E-commerce Cleaning Core
//!
//! Core data structures and types for the e-commerce cleaning pipeline.
//!
//! This crate provides the declarations every other crate works from: the
//! Schema Registry (entities, typed fields, constraints and foreign-key edges
//! with their cascade policy), the pipeline configuration, the report
//! records and the run context that accumulates them.
//!
//! ## Key Concepts
//!
//! - **Schema Registry**: fixed, version-controlled description of every entity
//! - **Cascade policy**: what happens to a child row when its parent is gone
//!   (`restrict`, `cascade`, `set_null`)
//! - **Removal kinds**: business-rule removals are reported apart from
//!   data errors, duplicates and integrity removals
//! - **Run context**: explicit accumulator for the reports of one run
//!
//! ## Example
//!
//! ```rust
//! use ecom_core::{Entity, EntitySchemaBuilder, FieldBuilder, FieldType, OnDelete, RegistryBuilder};
//!
//! let registry = RegistryBuilder::new("1.0.0")
//!     .entity(
//!         EntitySchemaBuilder::new(Entity::Users, "id")
//!             .field(FieldBuilder::new("id", FieldType::Int).nullable(false).build())
//!             .build(),
//!     )
//!     .entity(
//!         EntitySchemaBuilder::new(Entity::Events, "id")
//!             .field(FieldBuilder::new("id", FieldType::Int).nullable(false).build())
//!             .field(FieldBuilder::new("user_id", FieldType::Int).build())
//!             .foreign_key("user_id", Entity::Users, "id", OnDelete::SetNull)
//!             .build(),
//!     )
//!     .build();
//!
//! registry.validate().unwrap();
//! assert_eq!(registry.load_order().unwrap(), vec![Entity::Users, Entity::Events]);
//! ```

pub mod builder;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod registry;
pub mod report;

pub use builder::*;
pub use config::*;
pub use context::*;
pub use entity::*;
pub use error::*;
pub use registry::*;
pub use report::*;
