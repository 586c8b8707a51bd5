//! Builder pattern for registry declarations.
//!
//! This module provides ergonomic builders for constructing registries,
//! entity schemas and fields with a fluent API. The built-in registry is
//! parsed from its declaration file; the builders are meant for tests and
//! for programs that assemble a registry in code.

use crate::{
    Entity, EntitySchema, FieldConstraint, FieldSpec, FieldType, ForeignKey, OnDelete,
    SchemaRegistry, TextNormalization,
};

/// Builder for creating a `SchemaRegistry`.
///
/// # Example
///
/// ```rust
/// use ecom_core::{Entity, EntitySchemaBuilder, FieldBuilder, FieldType, RegistryBuilder};
///
/// let registry = RegistryBuilder::new("1.0.0")
///     .entity(
///         EntitySchemaBuilder::new(Entity::DistributionCenters, "id")
///             .field(FieldBuilder::new("id", FieldType::Int).nullable(false).build())
///             .build(),
///     )
///     .build();
///
/// assert!(registry.validate().is_ok());
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    version: String,
    entities: Vec<EntitySchema>,
}

impl RegistryBuilder {
    /// Creates a new registry builder.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            entities: Vec::new(),
        }
    }

    /// Adds an entity declaration.
    pub fn entity(mut self, schema: EntitySchema) -> Self {
        self.entities.push(schema);
        self
    }

    /// Builds the registry. Call `validate()` on the result before use.
    pub fn build(self) -> SchemaRegistry {
        SchemaRegistry {
            version: self.version,
            entities: self.entities,
        }
    }
}

/// Builder for creating an `EntitySchema`.
#[derive(Debug)]
pub struct EntitySchemaBuilder {
    name: Entity,
    primary_key: String,
    unique: Vec<Vec<String>>,
    fields: Vec<FieldSpec>,
    foreign_keys: Vec<ForeignKey>,
    description: Option<String>,
}

impl EntitySchemaBuilder {
    /// Creates a new entity builder.
    ///
    /// # Arguments
    ///
    /// * `name` - The entity being declared
    /// * `primary_key` - Name of the primary-key field
    pub fn new(name: Entity, primary_key: impl Into<String>) -> Self {
        Self {
            name,
            primary_key: primary_key.into(),
            unique: Vec::new(),
            fields: Vec::new(),
            foreign_keys: Vec::new(),
            description: None,
        }
    }

    /// Adds a field.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds multiple fields.
    pub fn fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Adds a unique key set.
    pub fn unique<I, S>(mut self, key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique.push(key.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a foreign-key edge.
    pub fn foreign_key(
        mut self,
        field: impl Into<String>,
        references: Entity,
        target_field: impl Into<String>,
        on_delete: OnDelete,
    ) -> Self {
        self.foreign_keys.push(ForeignKey {
            field: field.into(),
            references,
            target_field: target_field.into(),
            on_delete,
        });
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builds the entity schema.
    pub fn build(self) -> EntitySchema {
        EntitySchema {
            name: self.name,
            primary_key: self.primary_key,
            unique: self.unique,
            fields: self.fields,
            foreign_keys: self.foreign_keys,
            description: self.description,
        }
    }
}

/// Builder for creating a `FieldSpec`.
///
/// # Example
///
/// ```rust
/// use ecom_core::{FieldBuilder, FieldType, TextNormalization};
///
/// let field = FieldBuilder::new("city", FieldType::String)
///     .default_value("Unknown")
///     .normalize(TextNormalization::Trim)
///     .build();
///
/// assert!(field.nullable);
/// assert_eq!(field.default.as_deref(), Some("Unknown"));
/// ```
#[derive(Debug)]
pub struct FieldBuilder {
    name: String,
    field_type: FieldType,
    nullable: bool,
    default: Option<String>,
    normalize: Option<TextNormalization>,
    constraints: Vec<FieldConstraint>,
    description: Option<String>,
}

impl FieldBuilder {
    /// Creates a new field builder. Fields are nullable unless stated otherwise.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: true,
            default: None,
            normalize: None,
            constraints: Vec::new(),
            description: None,
        }
    }

    /// Sets whether the field is nullable.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets the fill value for nulls.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the text normalization.
    pub fn normalize(mut self, normalization: TextNormalization) -> Self {
        self.normalize = Some(normalization);
        self
    }

    /// Adds a constraint.
    pub fn constraint(mut self, constraint: FieldConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builds the field.
    pub fn build(self) -> FieldSpec {
        FieldSpec {
            name: self.name,
            field_type: self.field_type,
            nullable: self.nullable,
            default: self.default,
            normalize: self.normalize,
            constraints: self.constraints,
            description: self.description,
        }
    }
}
