//! Delimited-file I/O for the e-commerce cleaning pipeline.
//!
//! This crate reads the raw extracts of a directory into raw tables and
//! writes everything a run produces: cleaned tables (through
//! [`CsvDirectorySink`]), the summary CSV, the JSON quality report,
//! integrity violation listings and the profiling summary. Tables travel as
//! Apache Arrow record batches of text columns on both sides.
//!
//! # Example
//!
//! ```no_run
//! use ecom_cleaner::Pipeline;
//! use ecom_core::PipelineConfig;
//! use ecom_io::{CsvDirectorySink, CsvDirectorySource};
//! use std::sync::Arc;
//!
//! # async fn example(registry: ecom_core::SchemaRegistry) -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::new()
//!     .with_input_dir("data/raw")
//!     .with_output_dir("data/processed");
//! let source = CsvDirectorySource::new(&config.input);
//! let mut sink = CsvDirectorySink::new(&config.output.dir, config.input.delimiter_byte());
//!
//! let pipeline = Pipeline::new(Arc::new(registry), config)?;
//! match pipeline.run(Arc::new(source), &mut sink).await {
//!     Ok(_) => {
//!         sink.commit()?;
//!     }
//!     Err(e) => {
//!         sink.rollback();
//!         return Err(e.into());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

mod converter;
mod reader;
mod sink;
mod writer;

pub use converter::{batch_rows, table_to_batch};
pub use reader::{CsvDirectorySource, read_raw_table};
pub use sink::CsvDirectorySink;
pub use writer::{
    PROFILE_SUMMARY_FILE, QualityReportDocument, write_profile, write_quality_report,
    write_run_outputs, write_summary, write_table, write_violations,
};

/// Error types specific to file I/O.
#[derive(Error, Debug)]
pub enum IoError {
    /// File system failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited-file encoding or decoding failure
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// JSON encoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Column that is not a text column
    #[error("Failed to convert column '{0}' to text")]
    Conversion(String),
}

impl IoError {
    /// Creates a new file system error for a path.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        IoError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type alias for I/O operations.
pub type Result<T> = std::result::Result<T, IoError>;
