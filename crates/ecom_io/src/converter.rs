//! Conversion between pipeline tables and Arrow record batches.
//!
//! Both directions use text columns only: raw extracts are untyped until the
//! cleaner coerces them, and cleaned values are written in their canonical
//! text form (timestamps in UTC, decimals with their scale).

use crate::IoError;
use arrow_array::cast::AsArray;
use arrow_array::{Array, ArrayRef, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use ecom_cleaner::{Table, Value};
use std::sync::Arc;

/// Converts a table into a record batch of nullable text columns.
pub fn table_to_batch(table: &Table) -> Result<RecordBatch, IoError> {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect();

    let columns: Vec<ArrayRef> = (0..table.columns().len())
        .map(|position| {
            let array: StringArray = table
                .rows
                .iter()
                .map(|record| match &record.values[position] {
                    Value::Null => None,
                    value => Some(value.to_string()),
                })
                .collect();
            Arc::new(array) as ArrayRef
        })
        .collect();

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Reads every row of a batch of text columns; nulls become `None`.
pub fn batch_rows(batch: &RecordBatch) -> Result<Vec<Vec<Option<String>>>, IoError> {
    let schema = batch.schema();
    let columns = batch
        .columns()
        .iter()
        .zip(schema.fields())
        .map(|(column, field)| {
            column
                .as_string_opt::<i32>()
                .ok_or_else(|| IoError::Conversion(field.name().clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((0..batch.num_rows())
        .map(|row| {
            columns
                .iter()
                .map(|column| (!column.is_null(row)).then(|| column.value(row).to_string()))
                .collect()
        })
        .collect())
}
