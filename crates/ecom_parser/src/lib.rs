//! Parser for registry declarations and pipeline configuration (YAML/TOML formats).
//!
//! This module parses Schema Registry declarations and pipeline configuration
//! files into the strongly-typed structures of `ecom_core`. Every parse
//! function validates what it returns, so callers never hold an inconsistent
//! registry or configuration.
//!
//! The crate also ships the built-in e-commerce registry, a version-controlled
//! TOML declaration compiled into the binary.
//!
//! # Example
//!
//! ```rust
//! use ecom_parser::parse_registry_yaml;
//!
//! let yaml = r#"
//! version: "1.0.0"
//! entities:
//!   - name: distribution_centers
//!     primary_key: id
//!     fields:
//!       - name: id
//!         type: int
//!         nullable: false
//!       - name: name
//!         type: string
//!         normalize: trim
//! "#;
//!
//! let registry = parse_registry_yaml(yaml).expect("Failed to parse registry");
//! assert_eq!(registry.entities.len(), 1);
//! ```

use ecom_core::{ConfigError, PipelineConfig, RegistryError, SchemaRegistry};
use std::path::Path;
use thiserror::Error;

/// Source of the built-in registry declaration.
pub const BUILTIN_REGISTRY: &str = include_str!("../registry/ecommerce.toml");

/// Errors that can occur while parsing declarations.
#[derive(Debug, Error)]
pub enum ParserError {
    /// YAML parsing or deserialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// TOML parsing or deserialization failed
    #[error("Failed to parse TOML: {0}")]
    TomlError(String),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,

    /// The registry parsed but is not consistent
    #[error("Invalid registry: {0}")]
    Registry(#[from] RegistryError),

    /// The configuration parsed but is not usable
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Supported declaration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
}

/// Parse and validate a registry from a YAML string.
pub fn parse_registry_yaml(content: &str) -> Result<SchemaRegistry> {
    let registry: SchemaRegistry = serde_yaml_ng::from_str(content)?;
    registry.validate()?;
    Ok(registry)
}

/// Parse and validate a registry from a TOML string.
///
/// # Example
///
/// ```rust
/// use ecom_parser::parse_registry_toml;
///
/// let toml = r#"
/// version = "1.0.0"
///
/// [[entities]]
/// name = "users"
/// primary_key = "id"
///
/// [[entities.fields]]
/// name = "id"
/// type = "int"
/// nullable = false
/// "#;
///
/// let registry = parse_registry_toml(toml).unwrap();
/// assert_eq!(registry.version, "1.0.0");
/// ```
pub fn parse_registry_toml(content: &str) -> Result<SchemaRegistry> {
    let registry: SchemaRegistry =
        toml::from_str(content).map_err(|e| ParserError::TomlError(e.to_string()))?;
    registry.validate()?;
    Ok(registry)
}

/// Parse a registry file with automatic format detection.
///
/// # Example
///
/// ```no_run
/// use ecom_parser::parse_registry_file;
/// use std::path::Path;
///
/// let registry = parse_registry_file(Path::new("registry/ecommerce.toml")).unwrap();
/// println!("Loaded registry {}", registry.version);
/// ```
pub fn parse_registry_file(path: &Path) -> Result<SchemaRegistry> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        DocumentFormat::Yaml => parse_registry_yaml(&content),
        DocumentFormat::Toml => parse_registry_toml(&content),
    }
}

/// Returns the built-in e-commerce registry.
///
/// The declaration is validated on every call; an error here means the
/// shipped declaration itself is broken.
pub fn builtin_registry() -> Result<SchemaRegistry> {
    parse_registry_toml(BUILTIN_REGISTRY)
}

/// Parse and validate pipeline configuration from a YAML string.
pub fn parse_config_yaml(content: &str) -> Result<PipelineConfig> {
    let config: PipelineConfig = serde_yaml_ng::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate pipeline configuration from a TOML string.
///
/// Every section is optional:
///
/// ```rust
/// use ecom_parser::parse_config_toml;
///
/// let config = parse_config_toml("[rules]\nmin_age = 21\n").unwrap();
/// assert_eq!(config.rules.min_age, 21);
/// assert_eq!(config.input.dir.to_str(), Some("data/raw"));
/// ```
pub fn parse_config_toml(content: &str) -> Result<PipelineConfig> {
    let config: PipelineConfig =
        toml::from_str(content).map_err(|e| ParserError::TomlError(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Parse a configuration file with automatic format detection.
pub fn parse_config_file(path: &Path) -> Result<PipelineConfig> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        DocumentFormat::Yaml => parse_config_yaml(&content),
        DocumentFormat::Toml => parse_config_toml(&content),
    }
}

/// Detect the document format from a file path based on its extension.
///
/// # Supported Extensions
///
/// * `.yaml`, `.yml` → `DocumentFormat::Yaml`
/// * `.toml` → `DocumentFormat::Toml`
///
/// # Errors
///
/// Returns `ParserError::InvalidExtension` if the file has no extension.
/// Returns `ParserError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<DocumentFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(ParserError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(DocumentFormat::Yaml),
        "toml" => Ok(DocumentFormat::Toml),
        other => Err(ParserError::UnsupportedFormat(other.to_string())),
    }
}
