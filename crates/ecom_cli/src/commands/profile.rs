use anyhow::{Context, Result};
use ecom_cleaner::profile_source;
use ecom_core::Entity;
use ecom_io::{CsvDirectorySource, PROFILE_SUMMARY_FILE, write_profile};
use tracing::info;

use super::{check_format, load_config};
use crate::output;

pub async fn execute(
    config_path: Option<&str>,
    input: Option<&str>,
    output_dir: Option<&str>,
    write: bool,
    format: &str,
) -> Result<()> {
    check_format(format)?;

    let config = load_config(config_path, input, output_dir)?;
    info!("Profiling extracts in {}", config.input.dir.display());

    let source = CsvDirectorySource::new(&config.input);
    let summary = profile_source(&source, &Entity::ALL, &config.input)
        .context("Failed to profile extracts")?;

    output::print_profile(&summary, format);

    if write {
        let path = config.output.dir.join(PROFILE_SUMMARY_FILE);
        write_profile(&path, &summary)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if format == "text" {
            output::print_success(&format!("Profile written to {}", path.display()));
        }
    }

    Ok(())
}
