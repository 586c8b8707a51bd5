use super::{EntityRules, RowView};
use ecom_core::Removal;

/// A stock unit cannot be sold before it was created. A null `sold_at` is
/// unsold inventory.
#[derive(Debug, Clone, Copy)]
pub struct InventoryItemRules;

impl EntityRules for InventoryItemRules {
    fn check(&self, row: &RowView<'_>) -> Option<Removal> {
        let created_at = row.timestamp("created_at")?;
        let sold_at = row.timestamp("sold_at")?;
        (sold_at < created_at).then(|| Removal::data_error("sold_at_before_created_at"))
    }
}
