//! Registry-driven table cleaning.
//!
//! [`TableCleaner`] turns one raw extract into a cleaned [`Table`] and its
//! [`CleaningReport`]. Per row, in input order:
//!
//! 1. null tokens are counted per declared field
//! 2. declared fields are coerced to their registry type
//! 3. text is normalized, then nulls are filled with their defaults
//! 4. single-field constraints run in declaration order
//! 5. the entity's cross-field rules run
//!
//! Deduplication sees every row, not only the survivors: each key (primary
//! key first, then every unique key set) belongs to the earliest row whose
//! coerced key is non-null, even if that row is later removed. Any later row
//! sharing a claimed key is a duplicate.

use crate::cleaners::{EntityRules, RowView, rules_for};
use crate::schema::{coerce, normalize_text};
use crate::{ConstraintChecker, RawTable, Record, Table, Value};
use ecom_core::{
    CleaningReport, EntitySchema, FieldSpec, InputConfig, RegistryError, Removal, RuleConfig,
    Severity,
};
use std::collections::HashSet;
use tracing::debug;

/// Where a column of the cleaned table comes from.
#[derive(Debug, Clone)]
enum ColumnSource {
    /// Declared field, read from a raw column if present
    Declared { field: usize, raw: Option<usize> },
    /// Undeclared raw column, passed through as text
    Passthrough { raw: usize },
}

/// Outcome of cleaning a single row before deduplication.
struct Candidate {
    record: Record,
    fills: Vec<usize>,
    flags: Vec<String>,
    removal: Option<Removal>,
}

/// Cleans the raw extract of one entity.
pub struct TableCleaner<'a> {
    schema: &'a EntitySchema,
    input: &'a InputConfig,
    rules: Box<dyn EntityRules>,
    constraints: ConstraintChecker,
    defaults: Vec<Option<Value>>,
}

impl<'a> TableCleaner<'a> {
    /// Creates a cleaner for an entity.
    ///
    /// Fails if a declared default cannot be read as its field's type.
    pub fn new(
        schema: &'a EntitySchema,
        input: &'a InputConfig,
        rules: &RuleConfig,
    ) -> Result<Self, RegistryError> {
        let defaults = schema
            .fields
            .iter()
            .map(|field| match &field.default {
                Some(raw) => coerce(field.field_type, raw).map(Some).map_err(|e| {
                    RegistryError::InvalidConstraint {
                        entity: schema.name.to_string(),
                        field: field.name.clone(),
                        message: format!("default {}", e),
                    }
                }),
                None => Ok(None),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            schema,
            input,
            rules: rules_for(schema.name, rules),
            constraints: ConstraintChecker::new(),
            defaults,
        })
    }

    /// Cleans a raw extract.
    pub fn clean(&mut self, raw: &RawTable) -> (Table, CleaningReport) {
        let mut report = CleaningReport::new(self.schema.name, raw.len());
        let (columns, sources) = self.layout(raw);
        let mut table = Table::new(self.schema.name, columns);

        let key_sets = self.key_positions(&table);
        let mut seen: Vec<HashSet<Vec<Value>>> = vec![HashSet::new(); key_sets.len()];

        for (index, cells) in raw.rows.iter().enumerate() {
            let candidate = self.clean_row(&table, &sources, index, cells, &mut report);

            let keys: Vec<Option<Vec<Value>>> = key_sets
                .iter()
                .map(|(_, positions)| key_of(&candidate.record, positions))
                .collect();
            let duplicate = key_sets
                .iter()
                .zip(&keys)
                .zip(&seen)
                .find(|((_, key), seen)| key.as_ref().is_some_and(|k| seen.contains(k)));
            if let Some((((label, _), _), _)) = duplicate {
                report.record_removal(&Removal::duplicate(format!("duplicate_{}", label)));
                continue;
            }
            for (seen, key) in seen.iter_mut().zip(keys) {
                if let Some(key) = key {
                    seen.insert(key);
                }
            }

            if let Some(removal) = candidate.removal {
                report.record_removal(&removal);
                continue;
            }
            for field in candidate.fills {
                report.record_fill(&self.schema.fields[field].name);
            }
            for flag in candidate.flags {
                report.record_flag(flag);
            }
            table.push(candidate.record);
        }

        debug!(
            "Cleaned {}: {} of {} rows kept",
            self.schema.name,
            table.len(),
            raw.len()
        );

        (table, report)
    }

    /// Output columns: raw columns in file order, then declared fields the
    /// extract lacks.
    fn layout(&self, raw: &RawTable) -> (Vec<String>, Vec<ColumnSource>) {
        let mut columns = Vec::new();
        let mut sources = Vec::new();
        let mut placed = HashSet::new();

        for (raw_index, header) in raw.headers.iter().enumerate() {
            let name = header.trim();
            if !placed.insert(name.to_string()) {
                continue;
            }
            columns.push(name.to_string());
            match self.schema.field_index(name) {
                Some(field) => sources.push(ColumnSource::Declared {
                    field,
                    raw: Some(raw_index),
                }),
                None => sources.push(ColumnSource::Passthrough { raw: raw_index }),
            }
        }

        for (field, spec) in self.schema.fields.iter().enumerate() {
            if placed.insert(spec.name.clone()) {
                columns.push(spec.name.clone());
                sources.push(ColumnSource::Declared { field, raw: None });
            }
        }

        (columns, sources)
    }

    fn clean_row(
        &mut self,
        table: &Table,
        sources: &[ColumnSource],
        index: usize,
        cells: &[Option<String>],
        report: &mut CleaningReport,
    ) -> Candidate {
        let mut values = Vec::with_capacity(sources.len());
        let mut failure: Option<Removal> = None;
        let mut fills = Vec::new();

        // Every declared field is read even after a failure, so the row's
        // keys are known to deduplication.
        for source in sources {
            match *source {
                ColumnSource::Passthrough { raw } => {
                    let value = match self.cell(cells, Some(raw)) {
                        Some(text) => Value::Text(text.to_string()),
                        None => Value::Null,
                    };
                    values.push(value);
                }
                ColumnSource::Declared { field, raw } => {
                    let spec = &self.schema.fields[field];
                    let cell = self.cell(cells, raw);
                    if cell.is_none() {
                        report.record_missing(&spec.name);
                    }
                    match self.read_field(field, spec, cell) {
                        Ok((value, filled)) => {
                            if filled {
                                fills.push(field);
                            }
                            values.push(value);
                        }
                        Err(removal) => {
                            failure.get_or_insert(removal);
                            values.push(Value::Null);
                        }
                    }
                }
            }
        }

        let mut candidate = Candidate {
            record: Record { index, values },
            fills,
            flags: Vec::new(),
            removal: failure,
        };
        if candidate.removal.is_some() {
            return candidate;
        }

        match self.apply_constraints(table, &mut candidate.record) {
            Ok(flags) => candidate.flags = flags,
            Err(removal) => {
                candidate.removal = Some(removal);
                return candidate;
            }
        }

        candidate.removal = self.rules.check(&RowView::new(table, &candidate.record));
        candidate
    }

    /// Raw cell text, or `None` for an absent cell or a null token.
    fn cell<'c>(&self, cells: &'c [Option<String>], raw: Option<usize>) -> Option<&'c str> {
        let text = cells.get(raw?)?.as_deref()?;
        (!self.input.is_null_token(text)).then_some(text)
    }

    /// Coerces, normalizes and fills one declared field.
    fn read_field(
        &self,
        field: usize,
        spec: &FieldSpec,
        cell: Option<&str>,
    ) -> Result<(Value, bool), Removal> {
        let mut value = match cell {
            Some(text) => coerce(spec.field_type, text)
                .map_err(|_| Removal::data_error(format!("invalid_{}", spec.name)))?,
            None => Value::Null,
        };

        if let (Some(mode), Value::Text(text)) = (spec.normalize, &value) {
            let normalized = normalize_text(text, mode);
            value = if normalized.is_empty() {
                Value::Null
            } else {
                Value::Text(normalized)
            };
        }

        if value.is_null() {
            if let Some(default) = &self.defaults[field] {
                return Ok((default.clone(), true));
            }
            if !spec.nullable {
                return Err(Removal::data_error(format!("missing_{}", spec.name)));
            }
        }

        Ok((value, false))
    }

    /// Runs single-field constraints; returns the warnings raised.
    fn apply_constraints(
        &mut self,
        table: &Table,
        record: &mut Record,
    ) -> Result<Vec<String>, Removal> {
        let mut flags = Vec::new();

        for spec in &self.schema.fields {
            if spec.constraints.is_empty() {
                continue;
            }
            let Some(position) = table.column_index(&spec.name) else {
                continue;
            };

            for constraint in &spec.constraints {
                if self.constraints.check(constraint, &mut record.values[position]) {
                    continue;
                }
                let reason = format!("{}_{}", spec.name, constraint.label());
                match constraint.severity() {
                    Severity::Error => return Err(Removal::data_error(reason)),
                    Severity::BusinessRule => return Err(Removal::business_rule(reason)),
                    Severity::Warning => flags.push(reason),
                }
            }
        }

        Ok(flags)
    }

    /// Column positions of every key set, labelled for reason strings.
    fn key_positions(&self, table: &Table) -> Vec<(String, Vec<usize>)> {
        self.schema
            .key_sets()
            .into_iter()
            .filter_map(|keys| {
                let positions = keys
                    .iter()
                    .map(|k| table.column_index(k))
                    .collect::<Option<Vec<_>>>()?;
                Some((keys.join("_"), positions))
            })
            .collect()
    }
}

/// Key values of a record, or `None` if any part is null.
fn key_of(record: &Record, positions: &[usize]) -> Option<Vec<Value>> {
    let key: Vec<Value> = positions.iter().map(|&p| record.values[p].clone()).collect();
    (!key.iter().any(Value::is_null)).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecom_core::{
        Entity, EntitySchemaBuilder, FieldBuilder, FieldConstraint, FieldType, RemovalKind,
        TextNormalization,
    };
    use pretty_assertions::assert_eq;

    fn users_schema() -> EntitySchema {
        EntitySchemaBuilder::new(Entity::Users, "id")
            .field(FieldBuilder::new("id", FieldType::Int).nullable(false).build())
            .field(
                FieldBuilder::new("email", FieldType::String)
                    .normalize(TextNormalization::Lower)
                    .constraint(FieldConstraint::Email {
                        severity: Severity::Warning,
                    })
                    .build(),
            )
            .field(FieldBuilder::new("age", FieldType::Int).nullable(false).build())
            .field(
                FieldBuilder::new("city", FieldType::String)
                    .nullable(false)
                    .default_value("Unknown")
                    .normalize(TextNormalization::Trim)
                    .build(),
            )
            .field(
                FieldBuilder::new("created_at", FieldType::Timestamp)
                    .nullable(false)
                    .build(),
            )
            .unique(["email"])
            .build()
    }

    fn clean(raw: &RawTable) -> (Table, CleaningReport) {
        let schema = users_schema();
        let input = InputConfig::default();
        let mut cleaner = TableCleaner::new(&schema, &input, &RuleConfig::default()).unwrap();
        cleaner.clean(raw)
    }

    const HEADERS: [&str; 6] = ["id", "email", "age", "city", "created_at", "traffic_source"];

    #[test]
    fn test_clean_users() {
        let raw = RawTable::from_strs(
            &HEADERS,
            &[
                &["1", " Ann@Example.com ", "34", "  Rome ", "2023-01-05 10:00:00", "Search"],
                &["2", "bob@example.com", "16", "Paris", "2023-01-06 10:00:00", "Email"],
                &["3", "carl@example.com", "40", "NULL", "2023-01-07", ""],
                &["4", "dana@example.com", "29", "Oslo", "not a date", "Search"],
                &["5", "ANN@example.com", "51", "Bern", "2023-01-08", "Search"],
                &["1", "eve@example.com", "22", "Kyiv", "2023-01-09", "Search"],
                &["6", "no-at-sign", "25.0", "Lima", "2023-01-10", "Organic"],
            ],
        );

        let (table, report) = clean(&raw);

        let ids: Vec<i64> = table.column_values("id").filter_map(Value::as_int).collect();
        assert_eq!(ids, vec![1, 3, 6]);
        assert_eq!(report.original_count, 7);
        assert_eq!(report.cleaned_count, 3);
        assert_eq!(report.removed(RemovalKind::BusinessRule), 1);
        assert_eq!(report.removed(RemovalKind::DataError), 1);
        assert_eq!(report.removed(RemovalKind::DuplicateKey), 2);
        assert_eq!(report.removed_by_reason["invalid_created_at"], 1);
        assert_eq!(report.removed_by_reason["duplicate_id"], 1);
        assert_eq!(report.removed_by_reason["duplicate_email"], 1);
        assert_eq!(report.missing_values["city"], 1);
        assert_eq!(report.filled_values["city"], 1);
        assert_eq!(report.flagged["email_invalid_email"], 1);

        let first = &table.rows[0];
        assert_eq!(table.value(first, "email"), &Value::from("ann@example.com"));
        assert_eq!(table.value(first, "city"), &Value::from("Rome"));
        assert_eq!(table.value(first, "traffic_source"), &Value::from("Search"));
        assert_eq!(table.value(&table.rows[1], "city"), &Value::from("Unknown"));
        assert_eq!(table.value(&table.rows[1], "traffic_source"), &Value::Null);
    }

    #[test]
    fn test_columns_keep_raw_order_and_append_missing_fields() {
        let raw = RawTable::from_strs(&["created_at", "age", "id"], &[&["2023-01-01", "30", "9"]]);
        let (table, report) = clean(&raw);

        assert_eq!(
            table.columns(),
            ["created_at", "age", "id", "email", "city"]
        );
        assert_eq!(report.cleaned_count, 1);
        assert_eq!(report.missing_values["email"], 1);
        assert_eq!(table.value(&table.rows[0], "city"), &Value::from("Unknown"));
    }

    #[test]
    fn test_missing_required_field_is_data_error() {
        let raw = RawTable::from_strs(&HEADERS, &[&["7", "x@example.com", "", "Rome", "2023-01-01", ""]]);
        let (table, report) = clean(&raw);
        assert!(table.is_empty());
        assert_eq!(report.removed_by_reason["missing_age"], 1);
    }

    #[test]
    fn test_null_email_is_not_a_duplicate() {
        let raw = RawTable::from_strs(
            &HEADERS,
            &[
                &["1", "", "30", "Rome", "2023-01-01", ""],
                &["2", "null", "31", "Rome", "2023-01-01", ""],
            ],
        );
        let (table, report) = clean(&raw);
        assert_eq!(table.len(), 2);
        assert_eq!(report.missing_values["email"], 2);
        assert!(report.flagged.is_empty());
    }

    #[test]
    fn test_removed_rows_do_not_count_fills() {
        let raw = RawTable::from_strs(
            &HEADERS,
            &[&["1", "a@example.com", "12", "", "2023-01-01", ""]],
        );
        let (_, report) = clean(&raw);
        assert_eq!(report.missing_values["city"], 1);
        assert!(report.filled_values.is_empty());
    }

    #[test]
    fn test_first_occurrence_keeps_its_key_when_removed() {
        let raw = RawTable::from_strs(
            &HEADERS,
            &[
                &["1", "a@example.com", "12", "Rome", "2023-01-01", ""],
                &["1", "b@example.com", "40", "Rome", "2023-01-01", ""],
            ],
        );
        let (table, report) = clean(&raw);

        assert!(table.is_empty());
        assert_eq!(report.removed(RemovalKind::BusinessRule), 1);
        assert_eq!(report.removed(RemovalKind::DuplicateKey), 1);
        assert_eq!(report.removed_by_reason["duplicate_id"], 1);
    }

    #[test]
    fn test_keys_claimed_by_rows_with_invalid_fields() {
        let raw = RawTable::from_strs(
            &HEADERS,
            &[
                &["4", "a@example.com", "30", "Rome", "not a date", ""],
                &["5", "A@example.com", "31", "Oslo", "2023-01-01", ""],
                &["x", "d@example.com", "32", "Oslo", "2023-01-01", ""],
                &["6", "d@example.com", "33", "Oslo", "2023-01-01", ""],
                &["7", "e@example.com", "34", "Oslo", "2023-01-01", ""],
            ],
        );
        let (table, report) = clean(&raw);

        let ids: Vec<i64> = table.column_values("id").filter_map(Value::as_int).collect();
        assert_eq!(ids, vec![7]);
        assert_eq!(report.removed_by_reason["invalid_created_at"], 1);
        assert_eq!(report.removed_by_reason["invalid_id"], 1);
        assert_eq!(report.removed_by_reason["duplicate_email"], 2);
        assert_eq!(report.removed(RemovalKind::DataError), 2);
    }

    #[test]
    fn test_bad_default_rejected() {
        let schema = EntitySchemaBuilder::new(Entity::Users, "id")
            .field(FieldBuilder::new("id", FieldType::Int).build())
            .field(
                FieldBuilder::new("age", FieldType::Int)
                    .default_value("unknown")
                    .build(),
            )
            .build();
        let input = InputConfig::default();
        assert!(TableCleaner::new(&schema, &input, &RuleConfig::default()).is_err());
    }
}
