//! Constraint checking logic.
//!
//! This module checks the single-field constraints declared in the registry:
//! - Range: numeric value within min/max bounds
//! - AllowedValues: case-insensitive membership, with alias rewriting
//! - Pattern: text matches a regex pattern
//! - Email: text is a syntactically valid address
//!
//! Null values are never checked; nullability is handled during coercion.

use crate::Value;
use ecom_core::FieldConstraint;
use regex::Regex;
use std::collections::HashMap;
use validator::ValidateEmail;

/// Checks field constraints, caching compiled patterns.
#[derive(Debug, Default)]
pub struct ConstraintChecker {
    /// Cache of compiled regex patterns
    regex_cache: HashMap<String, Regex>,
}

impl ConstraintChecker {
    /// Creates a new constraint checker.
    pub fn new() -> Self {
        Self {
            regex_cache: HashMap::new(),
        }
    }

    /// Checks one constraint against a value.
    ///
    /// Returns true if the value satisfies the constraint. An allowed-values
    /// match rewrites the value onto its canonical spelling.
    pub fn check(&mut self, constraint: &FieldConstraint, value: &mut Value) -> bool {
        if value.is_null() {
            return true;
        }

        match constraint {
            FieldConstraint::Range { min, max, .. } => check_range(value, *min, *max),
            FieldConstraint::AllowedValues {
                values, aliases, ..
            } => match canonical_value(value, values, aliases) {
                Some(canonical) => {
                    *value = Value::Text(canonical);
                    true
                }
                None => false,
            },
            FieldConstraint::Pattern { regex, .. } => self.check_pattern(value, regex),
            FieldConstraint::Email { .. } => {
                value.as_text().is_some_and(|text| text.validate_email())
            }
        }
    }

    fn check_pattern(&mut self, value: &Value, pattern: &str) -> bool {
        let Some(text) = value.as_text() else {
            return false;
        };

        if !self.regex_cache.contains_key(pattern) {
            match Regex::new(pattern) {
                Ok(re) => {
                    self.regex_cache.insert(pattern.to_string(), re);
                }
                // Registry validation rejects bad patterns; treat a miss as a failure.
                Err(_) => return false,
            }
        }

        self.regex_cache
            .get(pattern)
            .is_some_and(|re| re.is_match(text))
    }
}

fn check_range(value: &Value, min: Option<f64>, max: Option<f64>) -> bool {
    let Some(number) = value.as_f64() else {
        return false;
    };

    min.is_none_or(|min| number >= min) && max.is_none_or(|max| number <= max)
}

/// Resolves a raw value onto one of the allowed values, following aliases.
fn canonical_value(
    value: &Value,
    allowed: &[String],
    aliases: &std::collections::BTreeMap<String, String>,
) -> Option<String> {
    let text = value.to_string();
    let text = text.trim();

    let resolved = aliases
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(text))
        .map(|(_, target)| target.as_str())
        .unwrap_or(text);

    allowed
        .iter()
        .find(|a| a.eq_ignore_ascii_case(resolved))
        .cloned()
}
