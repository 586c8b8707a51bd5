use super::{EntityRules, RowView};
use ecom_core::Removal;

/// Status whose rows may carry a `returned_at` timestamp.
const RETURNED: &str = "returned";

/// Orders must follow their lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct OrderRules;

impl EntityRules for OrderRules {
    fn check(&self, row: &RowView<'_>) -> Option<Removal> {
        check_lifecycle(row)
    }
}

/// Lifecycle ordering shared by orders and order items.
///
/// `shipped_at ≥ created_at` and `delivered_at ≥ shipped_at` when both sides
/// are present; `returned_at` only with status `returned`. Null timestamps
/// are legitimate (not yet shipped, in transit, not returned).
pub fn check_lifecycle(row: &RowView<'_>) -> Option<Removal> {
    let created_at = row.timestamp("created_at");
    let shipped_at = row.timestamp("shipped_at");
    let delivered_at = row.timestamp("delivered_at");

    if let (Some(created), Some(shipped)) = (created_at, shipped_at) {
        if shipped < created {
            return Some(Removal::data_error("shipped_at_before_created_at"));
        }
    }

    if let (Some(shipped), Some(delivered)) = (shipped_at, delivered_at) {
        if delivered < shipped {
            return Some(Removal::data_error("delivered_at_before_shipped_at"));
        }
    }

    if !row.get("returned_at").is_null() && row.text("status") != Some(RETURNED) {
        return Some(Removal::data_error("returned_at_without_returned_status"));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use crate::cleaners::test_support::{check_single, table_with_row};
    use chrono::{TimeZone, Utc};
    use ecom_core::{Entity, RemovalKind};

    fn day(d: u32) -> Value {
        Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap())
    }

    fn order(shipped: Value, delivered: Value, returned: Value, status: &str) -> crate::Table {
        table_with_row(
            Entity::Orders,
            vec![
                ("order_id", Value::Int(1)),
                ("status", Value::from(status)),
                ("created_at", day(10)),
                ("shipped_at", shipped),
                ("delivered_at", delivered),
                ("returned_at", returned),
            ],
        )
    }

    #[test]
    fn test_shipped_before_created_is_data_error() {
        let table = order(day(5), Value::Null, Value::Null, "shipped");
        let removal = check_single(&OrderRules, &table).unwrap();
        assert_eq!(removal.kind, RemovalKind::DataError);
        assert_eq!(removal.reason, "shipped_at_before_created_at");
    }

    #[test]
    fn test_delivered_before_shipped() {
        let table = order(day(12), day(11), Value::Null, "delivered");
        assert_eq!(
            check_single(&OrderRules, &table).unwrap().reason,
            "delivered_at_before_shipped_at"
        );
    }

    #[test]
    fn test_pending_order_with_null_timestamps_kept() {
        let table = order(Value::Null, Value::Null, Value::Null, "pending");
        assert_eq!(check_single(&OrderRules, &table), None);
    }

    #[test]
    fn test_delivered_without_shipped_kept() {
        let table = order(Value::Null, day(9), Value::Null, "delivered");
        assert_eq!(check_single(&OrderRules, &table), None);
    }

    #[test]
    fn test_returned_at_requires_returned_status() {
        let table = order(day(11), day(12), day(14), "delivered");
        assert_eq!(
            check_single(&OrderRules, &table).unwrap().reason,
            "returned_at_without_returned_status"
        );

        let table = order(day(11), day(12), day(14), "returned");
        assert_eq!(check_single(&OrderRules, &table), None);
    }
}
