//! Dataset representation for cleaning.
//!
//! Raw extracts arrive as [`RawTable`]s of untyped text cells. The cleaner
//! turns them into [`Table`]s of typed [`Value`]s; rows keep the input index
//! they were read at so that every later stage can restore input order.

use chrono::{DateTime, Utc};
use ecom_core::Entity;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::fmt;

/// Output format for timestamps in cleaned tables.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

static NULL_VALUE: Value = Value::Null;

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    /// Null/missing value
    Null,
    /// Integer value
    Int(i64),
    /// Exact decimal value
    Decimal(Decimal),
    /// Text value
    Text(String),
    /// Timestamp value, in UTC
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "string",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Attempts to get this value as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get this value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to get this value as a decimal.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            Value::Int(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    /// Numeric value as a float, for range checks.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Attempts to get this value as a timestamp.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

/// An untyped extract as read from disk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    /// Column names, in file order
    pub headers: Vec<String>,

    /// Cells per row; `None` is an empty cell
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Creates a raw table from headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }

    /// Builds a raw table from string literals; empty strings become `None`.
    pub fn from_strs(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                        .collect()
                })
                .collect(),
        }
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched on the trimmed header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// A single cleaned row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 0-based position in the raw extract
    pub index: usize,

    /// Cell values, aligned with the table's columns
    pub values: Vec<Value>,
}

/// A typed, cleaned table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Entity held by this table
    pub entity: Entity,

    /// Column names
    columns: Vec<String>,

    /// Column positions by name
    positions: HashMap<String, usize>,

    /// Rows in input order
    pub rows: Vec<Record>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new(entity: Entity, columns: Vec<String>) -> Self {
        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            entity,
            columns,
            positions,
            rows: Vec::new(),
        }
    }

    /// Column names, in output order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of a column in a row; `Null` if the column does not exist.
    pub fn value<'a>(&self, record: &'a Record, column: &str) -> &'a Value {
        self.column_index(column)
            .and_then(|i| record.values.get(i))
            .unwrap_or(&NULL_VALUE)
    }

    /// Iterates over the values of one column.
    pub fn column_values<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a Value> + use<'a> {
        let index = self.column_index(column);
        self.rows
            .iter()
            .map(move |r| index.and_then(|i| r.values.get(i)).unwrap_or(&NULL_VALUE))
    }

    /// Appends a row.
    pub fn push(&mut self, record: Record) {
        self.rows.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_value_types() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Int(1).type_name(), "int");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::Decimal(Decimal::ONE).type_name(), "decimal");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(
            Value::Decimal(Decimal::from_str("10.50").unwrap()).to_string(),
            "10.50"
        );
        let ts = Utc.with_ymd_and_hms(2024, 1, 10, 8, 30, 0).unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2024-01-10 08:30:00+00:00");
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::Int(3).as_decimal(), Some(Decimal::from(3)));
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::from("a").as_int(), None);
        assert_eq!(Value::from("a").as_text(), Some("a"));
    }

    #[test]
    fn test_raw_table_from_strs() {
        let raw = RawTable::from_strs(&["id", " city "], &[&["1", ""], &["2", "Rome"]]);
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.rows[0][1], None);
        assert_eq!(raw.rows[1][1].as_deref(), Some("Rome"));
        assert_eq!(raw.column_index("city"), Some(1));
    }

    #[test]
    fn test_table_lookup() {
        let mut table = Table::new(Entity::Users, vec!["id".into(), "city".into()]);
        table.push(Record {
            index: 0,
            values: vec![Value::Int(1), Value::from("Rome")],
        });
        let row = &table.rows[0];
        assert_eq!(table.value(row, "city"), &Value::from("Rome"));
        assert_eq!(table.value(row, "missing"), &Value::Null);
        let ids: Vec<&Value> = table.column_values("id").collect();
        assert_eq!(ids, vec![&Value::Int(1)]);
    }
}
