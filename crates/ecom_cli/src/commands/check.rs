use anyhow::{Context, Result};
use tracing::info;

use super::{check_format, load_registry};
use crate::output;

pub async fn execute(registry_path: Option<&str>, format: &str) -> Result<()> {
    check_format(format)?;
    info!(
        "Checking registry: {}",
        registry_path.unwrap_or("built-in")
    );

    // Parsing validates the registry.
    let registry = load_registry(registry_path)?;
    let load_order = registry
        .load_order()
        .context("Failed to derive the load order")?;

    output::print_registry(&registry, &load_order, format);
    Ok(())
}
