use super::{EntityRules, RowView};
use ecom_core::Removal;

/// A product may not retail below its cost.
#[derive(Debug, Clone, Copy)]
pub struct ProductRules;

impl EntityRules for ProductRules {
    fn check(&self, row: &RowView<'_>) -> Option<Removal> {
        let cost = row.decimal("cost")?;
        let retail_price = row.decimal("retail_price")?;
        (retail_price < cost).then(|| Removal::data_error("retail_price_below_cost"))
    }
}
