pub mod check;
pub mod profile;
pub mod run;

use anyhow::{Context, Result, bail};
use ecom_core::{PipelineConfig, SchemaRegistry};
use ecom_parser::{builtin_registry, parse_config_file, parse_registry_file};
use std::path::Path;
use tracing::info;

/// Environment variable overriding `input.dir`.
pub const INPUT_DIR_ENV: &str = "ECOMCLEAN_INPUT_DIR";

/// Environment variable overriding `output.dir`.
pub const OUTPUT_DIR_ENV: &str = "ECOMCLEAN_OUTPUT_DIR";

/// Loads a registry declaration, or the built-in one.
pub fn load_registry(path: Option<&str>) -> Result<SchemaRegistry> {
    match path {
        Some(path) => {
            info!("Loading registry: {}", path);
            parse_registry_file(Path::new(path))
                .with_context(|| format!("Failed to parse registry file: {}", path))
        }
        None => builtin_registry().context("Built-in registry is invalid"),
    }
}

/// Loads the configuration, then applies environment and flag overrides.
pub fn load_config(
    path: Option<&str>,
    input: Option<&str>,
    output: Option<&str>,
) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => {
            info!("Loading configuration: {}", path);
            parse_config_file(Path::new(path))
                .with_context(|| format!("Failed to parse configuration file: {}", path))?
        }
        None => PipelineConfig::new(),
    };

    if let Ok(dir) = std::env::var(INPUT_DIR_ENV) {
        config = config.with_input_dir(dir);
    }
    if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV) {
        config = config.with_output_dir(dir);
    }

    if let Some(dir) = input {
        config = config.with_input_dir(dir);
    }
    if let Some(dir) = output {
        config = config.with_output_dir(dir);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Rejects output formats other than `text` and `json`.
pub fn check_format(format: &str) -> Result<()> {
    match format {
        "text" | "json" => Ok(()),
        other => bail!("Unsupported output format: {} (expected text or json)", other),
    }
}
