//! Schema Registry types.
//!
//! The registry is the fixed, version-controlled declaration of every entity
//! the pipeline cleans: typed field lists, nullability, fill defaults, field
//! constraints and the foreign-key edges between entities together with
//! their cascade policy. It is loaded once at pipeline start and never
//! inferred from data.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::{Entity, RegistryError, Result};

/// Semantic type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Signed 64-bit integer
    Int,
    /// Exact decimal number
    Decimal,
    /// Free text
    String,
    /// Point in time, held in UTC
    Timestamp,
}

impl FieldType {
    /// Returns true for types that support range constraints.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Decimal)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Int => "int",
            FieldType::Decimal => "decimal",
            FieldType::String => "string",
            FieldType::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// Text normalization applied to a string field.
///
/// Every variant trims the value and collapses internal whitespace runs to a
/// single space before applying its case rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextNormalization {
    /// Whitespace only
    Trim,
    /// Lower case (case folding)
    Lower,
    /// Upper case
    Upper,
    /// Title case, one capital per word
    Title,
}

/// What happens to a row that fails a constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Row is dropped and counted as a data error
    #[default]
    Error,
    /// Row is dropped and counted as a business-rule removal
    BusinessRule,
    /// Row is kept and the failure is flagged in the report
    Warning,
}

/// A single-field validation constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldConstraint {
    /// Numeric value must be within the bounds (both inclusive)
    Range {
        /// Minimum value
        #[serde(default)]
        min: Option<f64>,
        /// Maximum value
        #[serde(default)]
        max: Option<f64>,
        /// Failure handling
        #[serde(default)]
        severity: Severity,
    },

    /// Value must be one of the listed values (case-insensitive)
    AllowedValues {
        /// Canonical values
        values: Vec<String>,
        /// Raw spellings rewritten onto a canonical value
        #[serde(default)]
        aliases: BTreeMap<String, String>,
        /// Failure handling
        #[serde(default)]
        severity: Severity,
    },

    /// Value must match the regular expression
    Pattern {
        /// Regular expression
        regex: String,
        /// Failure handling
        #[serde(default)]
        severity: Severity,
    },

    /// Value must be a syntactically valid e-mail address
    Email {
        /// Failure handling
        #[serde(default)]
        severity: Severity,
    },
}

impl FieldConstraint {
    /// Failure handling for this constraint.
    pub fn severity(&self) -> Severity {
        match self {
            FieldConstraint::Range { severity, .. }
            | FieldConstraint::AllowedValues { severity, .. }
            | FieldConstraint::Pattern { severity, .. }
            | FieldConstraint::Email { severity } => *severity,
        }
    }

    /// Short name used in report reason labels.
    pub fn label(&self) -> &'static str {
        match self {
            FieldConstraint::Range { .. } => "out_of_range",
            FieldConstraint::AllowedValues { .. } => "not_allowed",
            FieldConstraint::Pattern { .. } => "pattern_mismatch",
            FieldConstraint::Email { .. } => "invalid_email",
        }
    }
}

/// A declared field of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Column name in the raw extract
    pub name: String,

    /// Semantic type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Whether null is a legitimate value after cleaning
    #[serde(default = "default_nullable")]
    pub nullable: bool,

    /// Fill value replacing nulls
    #[serde(default)]
    pub default: Option<String>,

    /// Text normalization (string fields only)
    #[serde(default)]
    pub normalize: Option<TextNormalization>,

    /// Validation constraints
    #[serde(default)]
    pub constraints: Vec<FieldConstraint>,

    /// Optional human-readable description
    #[serde(default)]
    pub description: Option<String>,
}

fn default_nullable() -> bool {
    true
}

/// Policy applied to a child row whose parent row no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    /// Parent deletion should have been refused; a dangling child is an error
    Restrict,
    /// Child row is removed
    Cascade,
    /// Foreign-key field is rewritten to null
    SetNull,
}

impl fmt::Display for OnDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OnDelete::Restrict => "restrict",
            OnDelete::Cascade => "cascade",
            OnDelete::SetNull => "set null",
        };
        f.write_str(name)
    }
}

/// A foreign-key edge from a child entity to a parent entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Foreign-key field on the child
    pub field: String,

    /// Parent entity
    pub references: Entity,

    /// Referenced field on the parent
    pub target_field: String,

    /// Cascade policy
    pub on_delete: OnDelete,
}

/// Declaration of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Entity
    pub name: Entity,

    /// Primary-key field
    pub primary_key: String,

    /// Additional unique key sets (natural keys)
    #[serde(default)]
    pub unique: Vec<Vec<String>>,

    /// Declared fields, in declaration order
    pub fields: Vec<FieldSpec>,

    /// Outgoing foreign-key edges
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,

    /// Optional human-readable description
    #[serde(default)]
    pub description: Option<String>,
}

impl EntitySchema {
    /// Looks up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of a declared field.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Key sets used for deduplication: the primary key first, then every
    /// unique key in declaration order.
    pub fn key_sets(&self) -> Vec<Vec<String>> {
        let mut keys = vec![vec![self.primary_key.clone()]];
        keys.extend(self.unique.iter().cloned());
        keys
    }

    fn has_single_unique(&self, field: &str) -> bool {
        self.primary_key == field || self.unique.iter().any(|k| k.len() == 1 && k[0] == field)
    }
}

/// The complete, versioned registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    /// Version of the declaration
    pub version: String,

    /// Declared entities
    pub entities: Vec<EntitySchema>,
}

impl SchemaRegistry {
    /// Returns the declaration of an entity.
    pub fn describe(&self, entity: Entity) -> Result<&EntitySchema> {
        self.entities
            .iter()
            .find(|e| e.name == entity)
            .ok_or_else(|| RegistryError::MissingEntity(entity.to_string()))
    }

    /// Returns the outgoing foreign-key edges of an entity.
    pub fn edges(&self, entity: Entity) -> Result<&[ForeignKey]> {
        Ok(&self.describe(entity)?.foreign_keys)
    }

    /// All edges as `(child, edge)` pairs, in declaration order.
    pub fn all_edges(&self) -> impl Iterator<Item = (Entity, &ForeignKey)> {
        self.entities
            .iter()
            .flat_map(|e| e.foreign_keys.iter().map(move |fk| (e.name, fk)))
    }

    /// Declared entities in declaration order.
    pub fn entity_names(&self) -> Vec<Entity> {
        self.entities.iter().map(|e| e.name).collect()
    }

    /// Topological order with parents before children.
    ///
    /// Ties are broken by declaration order, so the result is stable for a
    /// given registry.
    pub fn load_order(&self) -> Result<Vec<Entity>> {
        let mut placed: Vec<Entity> = Vec::with_capacity(self.entities.len());

        while placed.len() < self.entities.len() {
            let next = self.entities.iter().find(|schema| {
                !placed.contains(&schema.name)
                    && schema
                        .foreign_keys
                        .iter()
                        .all(|fk| fk.references == schema.name || placed.contains(&fk.references))
            });

            match next {
                Some(schema) => placed.push(schema.name),
                None => {
                    let remaining: Vec<&str> = self
                        .entities
                        .iter()
                        .filter(|s| !placed.contains(&s.name))
                        .map(|s| s.name.as_str())
                        .collect();
                    return Err(RegistryError::Cycle(remaining.join(", ")));
                }
            }
        }

        Ok(placed)
    }

    /// Checks that the declaration is internally consistent.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for schema in &self.entities {
            if !seen.insert(schema.name) {
                return Err(RegistryError::DuplicateEntity(schema.name.to_string()));
            }
            validate_entity(schema)?;
        }

        for (child, fk) in self.all_edges() {
            let schema = self.describe(child)?;
            let edge_error = |message: String| RegistryError::InvalidEdge {
                entity: child.to_string(),
                field: fk.field.clone(),
                message,
            };

            let field = schema.field(&fk.field).ok_or_else(|| RegistryError::UnknownField {
                entity: child.to_string(),
                field: fk.field.clone(),
            })?;

            let parent = self
                .describe(fk.references)
                .map_err(|_| edge_error(format!("references undeclared entity '{}'", fk.references)))?;

            let target = parent
                .field(&fk.target_field)
                .ok_or_else(|| RegistryError::UnknownField {
                    entity: parent.name.to_string(),
                    field: fk.target_field.clone(),
                })?;

            if !parent.has_single_unique(&fk.target_field) {
                return Err(edge_error(format!(
                    "target {}.{} is not a primary or unique key",
                    parent.name, fk.target_field
                )));
            }

            if field.field_type != target.field_type {
                return Err(edge_error(format!(
                    "type {} does not match target type {}",
                    field.field_type, target.field_type
                )));
            }

            if fk.on_delete == OnDelete::SetNull && !field.nullable {
                return Err(edge_error(
                    "set null policy requires a nullable field".to_string(),
                ));
            }
        }

        self.load_order()?;
        Ok(())
    }
}

fn validate_entity(schema: &EntitySchema) -> Result<()> {
    let entity = schema.name.to_string();
    let mut names = HashSet::new();

    for field in &schema.fields {
        if !names.insert(field.name.as_str()) {
            return Err(RegistryError::DuplicateField {
                entity,
                field: field.name.clone(),
            });
        }
        validate_field(&entity, field)?;
    }

    let keys = schema.key_sets();
    for name in keys.iter().flatten() {
        if schema.field(name).is_none() {
            return Err(RegistryError::UnknownField {
                entity,
                field: name.clone(),
            });
        }
    }

    Ok(())
}

fn validate_field(entity: &str, field: &FieldSpec) -> Result<()> {
    let invalid = |message: String| RegistryError::InvalidConstraint {
        entity: entity.to_string(),
        field: field.name.clone(),
        message,
    };

    if field.normalize.is_some() && field.field_type != FieldType::String {
        return Err(invalid(format!(
            "normalization requires a string field, found {}",
            field.field_type
        )));
    }

    for constraint in &field.constraints {
        match constraint {
            FieldConstraint::Range { min, max, .. } => {
                if !field.field_type.is_numeric() {
                    return Err(invalid(format!(
                        "range constraint on non-numeric type {}",
                        field.field_type
                    )));
                }
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(invalid(format!("range min {} exceeds max {}", min, max)));
                    }
                }
            }
            FieldConstraint::AllowedValues { values, aliases, .. } => {
                if values.is_empty() {
                    return Err(invalid("allowed_values list is empty".to_string()));
                }
                for target in aliases.values() {
                    if !values.iter().any(|v| v.eq_ignore_ascii_case(target)) {
                        return Err(invalid(format!(
                            "alias target '{}' is not an allowed value",
                            target
                        )));
                    }
                }
            }
            FieldConstraint::Pattern { regex, .. } => {
                Regex::new(regex).map_err(|e| invalid(format!("invalid regex: {}", e)))?;
            }
            FieldConstraint::Email { .. } => {
                if field.field_type != FieldType::String {
                    return Err(invalid("email constraint on non-string field".to_string()));
                }
            }
        }
    }

    Ok(())
}
