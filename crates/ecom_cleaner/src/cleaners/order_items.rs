use super::{EntityRules, RowView, check_lifecycle};
use ecom_core::Removal;

/// Order items mirror the order lifecycle; `sale_price ≥ 0` is a registry
/// range constraint.
#[derive(Debug, Clone, Copy)]
pub struct OrderItemRules;

impl EntityRules for OrderItemRules {
    fn check(&self, row: &RowView<'_>) -> Option<Removal> {
        check_lifecycle(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use crate::cleaners::test_support::{check_single, table_with_row};
    use chrono::{TimeZone, Utc};
    use ecom_core::Entity;

    #[test]
    fn test_in_transit_item_kept() {
        let table = table_with_row(
            Entity::OrderItems,
            vec![
                ("id", Value::Int(1)),
                ("status", Value::from("shipped")),
                ("created_at", Value::Timestamp(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap())),
                ("shipped_at", Value::Timestamp(Utc.with_ymd_and_hms(2024, 2, 2, 9, 0, 0).unwrap())),
                ("delivered_at", Value::Null),
                ("returned_at", Value::Null),
            ],
        );
        assert_eq!(check_single(&OrderItemRules, &table), None);
    }

    #[test]
    fn test_returned_at_with_null_status_removed() {
        let table = table_with_row(
            Entity::OrderItems,
            vec![
                ("status", Value::Null),
                ("returned_at", Value::Timestamp(Utc.with_ymd_and_hms(2024, 2, 2, 9, 0, 0).unwrap())),
            ],
        );
        assert!(check_single(&OrderItemRules, &table).is_some());
    }
}
