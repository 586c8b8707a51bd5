//! Pipeline configuration.
//!
//! Every section has defaults, so an empty configuration file is valid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::{ConfigError, Entity};

/// Raw cell values treated as null when reading extracts.
pub const DEFAULT_NULL_TOKENS: [&str; 6] = ["", " ", "NULL", "null", "None", "nan"];

/// Top-level configuration of a cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw extract location and format
    pub input: InputConfig,

    /// Output locations
    pub output: OutputConfig,

    /// Business-rule parameters
    pub rules: RuleConfig,

    /// Referential integrity behaviour
    pub integrity: IntegrityConfig,

    /// Quality targets
    pub quality: QualityTargets,
}

/// Where raw extracts are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory holding one `<entity>.csv` per entity
    pub dir: PathBuf,

    /// Field delimiter
    pub delimiter: char,

    /// Cell values read as null
    pub null_tokens: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/raw"),
            delimiter: ',',
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl InputConfig {
    /// Returns true if the raw cell is a null token.
    pub fn is_null_token(&self, value: &str) -> bool {
        let trimmed = value.trim();
        self.null_tokens.iter().any(|t| t == value || t == trimmed)
    }

    /// Delimiter as a byte (validated to be ASCII).
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}

/// Where cleaned tables and reports are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for cleaned tables and reports
    pub dir: PathBuf,

    /// Summary CSV file name
    pub summary_file: String,

    /// JSON quality report file name
    pub report_file: String,

    /// Sub-directory for integrity violation listings
    pub violations_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/processed"),
            summary_file: "cleaning_summary.csv".to_string(),
            report_file: "quality_report.json".to_string(),
            violations_dir: "violations".to_string(),
        }
    }
}

impl OutputConfig {
    /// Full path of the summary CSV.
    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(&self.summary_file)
    }

    /// Full path of the JSON report.
    pub fn report_path(&self) -> PathBuf {
        self.dir.join(&self.report_file)
    }

    /// Full path of the violations directory.
    pub fn violations_path(&self) -> PathBuf {
        self.dir.join(&self.violations_dir)
    }
}

/// Business-rule parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Minimum customer age; younger users are removed as a business rule
    pub min_age: i64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self { min_age: 18 }
    }
}

/// Handling of dangling references under a `restrict` edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictMode {
    /// Report the violations and halt before load
    #[default]
    Abort,
    /// Report the violations, remove the dangling rows and continue
    Quarantine,
}

/// Referential integrity behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConfig {
    /// What to do with restrict violations
    pub on_restrict_violation: RestrictMode,

    /// Upper bound on enforcement passes
    pub max_passes: usize,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            on_restrict_violation: RestrictMode::Abort,
            max_passes: 64,
        }
    }
}

/// Quality targets. These are goals, not invariants: a miss is a warning
/// unless `strict` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityTargets {
    /// Minimum overall quality score (0.0 to 1.0)
    pub min_quality_score: Option<f64>,

    /// Maximum removed percentage per table (0 to 100), keyed by table name
    pub max_removed_percent: BTreeMap<String, f64>,

    /// Treat target misses as fatal
    pub strict: bool,
}

impl QualityTargets {
    /// Maximum removed percentage configured for an entity.
    pub fn max_removed_for(&self, entity: Entity) -> Option<f64> {
        self.max_removed_percent.get(entity.as_str()).copied()
    }
}

impl PipelineConfig {
    /// Creates a configuration with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the raw extract directory.
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input.dir = dir.into();
        self
    }

    /// Sets the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.dir = dir.into();
        self
    }

    /// Sets strict quality-target mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.quality.strict = strict;
        self
    }

    /// Sets the restrict-violation mode.
    pub fn with_restrict_mode(mut self, mode: RestrictMode) -> Self {
        self.integrity.on_restrict_violation = mode;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.null_tokens.is_empty() {
            return Err(ConfigError::invalid(
                "input.null_tokens",
                "at least one null token is required",
            ));
        }

        if !self.input.delimiter.is_ascii() || self.input.delimiter == '"' {
            return Err(ConfigError::invalid(
                "input.delimiter",
                format!("'{}' is not a usable ASCII delimiter", self.input.delimiter),
            ));
        }

        if self.integrity.max_passes == 0 {
            return Err(ConfigError::invalid(
                "integrity.max_passes",
                "must be at least 1",
            ));
        }

        if let Some(score) = self.quality.min_quality_score {
            if !(0.0..=1.0).contains(&score) {
                return Err(ConfigError::invalid(
                    "quality.min_quality_score",
                    format!("{} is outside [0, 1]", score),
                ));
            }
        }

        for (entity, pct) in &self.quality.max_removed_percent {
            if entity.parse::<Entity>().is_err() {
                return Err(ConfigError::invalid(
                    format!("quality.max_removed_percent.{}", entity),
                    "unknown table",
                ));
            }
            if !(0.0..=100.0).contains(pct) {
                return Err(ConfigError::invalid(
                    format!("quality.max_removed_percent.{}", entity),
                    format!("{} is outside [0, 100]", pct),
                ));
            }
        }

        Ok(())
    }
}
