//! Per-entity cleaners.
//!
//! Typed coercion, normalization, fills, single-field constraints and
//! deduplication are driven by the registry and shared by every entity (see
//! [`TableCleaner`](crate::TableCleaner)). What is left per entity are the
//! cross-field rules below, one [`EntityRules`] implementation per entity.

mod distribution_centers;
mod events;
mod inventory_items;
mod order_items;
mod orders;
mod products;
mod users;

pub use distribution_centers::DistributionCenterRules;
pub use events::EventRules;
pub use inventory_items::InventoryItemRules;
pub use order_items::OrderItemRules;
pub use orders::{OrderRules, check_lifecycle};
pub use products::ProductRules;
pub use users::UserRules;

use crate::{Record, Table, Value};
use chrono::{DateTime, Utc};
use ecom_core::{Entity, Removal, RuleConfig};
use rust_decimal::Decimal;

/// Cross-field rules of one entity, applied to coerced and filled rows.
pub trait EntityRules: Send + Sync {
    /// Returns the removal decision for a row, or `None` to keep it.
    fn check(&self, row: &RowView<'_>) -> Option<Removal>;
}

/// Returns the rules of an entity.
pub fn rules_for(entity: Entity, config: &RuleConfig) -> Box<dyn EntityRules> {
    match entity {
        Entity::Users => Box::new(UserRules::new(config.min_age)),
        Entity::Products => Box::new(ProductRules),
        Entity::Orders => Box::new(OrderRules),
        Entity::OrderItems => Box::new(OrderItemRules),
        Entity::InventoryItems => Box::new(InventoryItemRules),
        Entity::Events => Box::new(EventRules),
        Entity::DistributionCenters => Box::new(DistributionCenterRules),
    }
}

/// Read access to one row by column name.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a Table,
    record: &'a Record,
}

impl<'a> RowView<'a> {
    /// Creates a view of a record laid out like `table`.
    pub fn new(table: &'a Table, record: &'a Record) -> Self {
        Self { table, record }
    }

    /// Value of a column; `Null` if absent.
    pub fn get(&self, column: &str) -> &'a Value {
        self.table.value(self.record, column)
    }

    /// Integer value of a column.
    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).as_int()
    }

    /// Decimal value of a column.
    pub fn decimal(&self, column: &str) -> Option<Decimal> {
        self.get(column).as_decimal()
    }

    /// Timestamp value of a column.
    pub fn timestamp(&self, column: &str) -> Option<DateTime<Utc>> {
        self.get(column).as_timestamp()
    }

    /// Text value of a column.
    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.get(column).as_text()
    }
}
