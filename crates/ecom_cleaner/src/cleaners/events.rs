use super::{EntityRules, RowView};
use ecom_core::Removal;

/// Events are cleaned by the registry alone: `created_at` must parse, a
/// missing city is filled, and a null `user_id` is an anonymous session.
#[derive(Debug, Clone, Copy)]
pub struct EventRules;

impl EntityRules for EventRules {
    fn check(&self, _row: &RowView<'_>) -> Option<Removal> {
        None
    }
}
