//! Type coercion at the registry boundary.
//!
//! Raw cells are untyped text. Every declared field is coerced to its
//! registry type here, before any constraint or business rule looks at the
//! row; a cell that cannot be read as its type makes the row a data error.

use crate::{CoercionError, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use ecom_core::{FieldType, TextNormalization};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;

/// Epoch values above this are read as milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 10_000_000_000;

/// Shorter digit runs are not epochs (`20240110` is a compact date).
const EPOCH_MIN_DIGITS: usize = 10;

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
];

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Coerces a non-null raw cell to the given type.
pub fn coerce(field_type: FieldType, raw: &str) -> Result<Value, CoercionError> {
    let text = raw.trim();
    let value = match field_type {
        FieldType::Int => parse_int(text).map(Value::Int),
        FieldType::Decimal => parse_decimal(text).map(Value::Decimal),
        FieldType::Timestamp => parse_timestamp(text).map(Value::Timestamp),
        FieldType::String => Some(Value::Text(raw.to_string())),
    };
    value.ok_or_else(|| CoercionError::new(raw, field_type))
}

/// Parses a signed 64-bit integer.
///
/// Integral decimals such as `25.0` are accepted; values outside the i64
/// range are rejected.
pub fn parse_int(text: &str) -> Option<i64> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(i);
    }
    let decimal = parse_decimal(text)?;
    if decimal.fract().is_zero() {
        decimal.to_i64()
    } else {
        None
    }
}

/// Parses an exact decimal, accepting scientific notation.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Parses a timestamp into UTC.
///
/// Supported formats:
/// - RFC 3339 (`2024-01-10T08:30:00Z`)
/// - `YYYY-MM-DD HH:MM:SS[.f]` with an optional `±HH:MM` offset or a
///   trailing ` UTC`
/// - `YYYY-MM-DD` (start of day)
/// - Unix epoch seconds or milliseconds, at least ten digits
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    let text = text.strip_suffix(" UTC").unwrap_or(text);

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }

    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.len() < EPOCH_MIN_DIGITS {
        return None;
    }
    if let Ok(epoch) = text.parse::<i64>() {
        return if epoch > EPOCH_MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
    }

    None
}

/// Applies a text normalization.
///
/// Every mode trims and collapses internal whitespace runs to one space.
pub fn normalize_text(text: &str, mode: TextNormalization) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match mode {
        TextNormalization::Trim => collapsed,
        TextNormalization::Lower => collapsed.to_lowercase(),
        TextNormalization::Upper => collapsed.to_uppercase(),
        TextNormalization::Title => title_case(&collapsed),
    }
}

/// Capitalizes the first letter of every word and lowercases the rest.
///
/// A word starts after any non-alphabetic character, so `o'neil-smith`
/// becomes `O'Neil-Smith`.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
