use super::{EntityRules, RowView};
use ecom_core::Removal;

/// Reference data; only the registry's name normalization applies.
#[derive(Debug, Clone, Copy)]
pub struct DistributionCenterRules;

impl EntityRules for DistributionCenterRules {
    fn check(&self, _row: &RowView<'_>) -> Option<Removal> {
        None
    }
}
