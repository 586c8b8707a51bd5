//! The entities handled by the cleaning pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RegistryError;

/// One of the seven tables of the e-commerce extract.
///
/// Declaration order follows foreign-key dependencies (parents first) and is
/// the order in which maps keyed by entity iterate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    /// Warehouses (reference data)
    DistributionCenters,
    /// Registered customers
    Users,
    /// Product catalogue
    Products,
    /// Physical stock units
    InventoryItems,
    /// Order headers
    Orders,
    /// Order lines
    OrderItems,
    /// Web session events
    Events,
}

impl Entity {
    /// All entities in canonical order.
    pub const ALL: [Entity; 7] = [
        Entity::DistributionCenters,
        Entity::Users,
        Entity::Products,
        Entity::InventoryItems,
        Entity::Orders,
        Entity::OrderItems,
        Entity::Events,
    ];

    /// Table name, also used as the raw extract file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Users => "users",
            Entity::Products => "products",
            Entity::Orders => "orders",
            Entity::OrderItems => "order_items",
            Entity::InventoryItems => "inventory_items",
            Entity::Events => "events",
            Entity::DistributionCenters => "distribution_centers",
        }
    }

    /// File name of the raw extract (e.g. `users.csv`).
    pub fn raw_file_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }

    /// File name of the cleaned table (e.g. `users_cleaned.csv`).
    pub fn cleaned_file_name(&self) -> String {
        format!("{}_cleaned.csv", self.as_str())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Entity {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Entity::ALL
            .into_iter()
            .find(|e| e.as_str() == s.trim())
            .ok_or_else(|| RegistryError::UnknownEntity(s.to_string()))
    }
}
