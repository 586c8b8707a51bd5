use super::{EntityRules, RowView};
use ecom_core::Removal;

/// Users younger than the minimum age are removed as a business rule.
#[derive(Debug, Clone)]
pub struct UserRules {
    min_age: i64,
}

impl UserRules {
    /// Creates the rules with the configured minimum age.
    pub fn new(min_age: i64) -> Self {
        Self { min_age }
    }
}

impl EntityRules for UserRules {
    fn check(&self, row: &RowView<'_>) -> Option<Removal> {
        match row.int("age") {
            Some(age) if age < self.min_age => Some(Removal::business_rule("age_below_minimum")),
            _ => None,
        }
    }
}
