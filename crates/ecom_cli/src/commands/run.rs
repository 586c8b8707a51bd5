use anyhow::{Context, Result};
use ecom_cleaner::Pipeline;
use ecom_io::{CsvDirectorySink, CsvDirectorySource, write_run_outputs};
use std::sync::Arc;
use tracing::info;

use super::{check_format, load_config, load_registry};
use crate::output;

/// Options of the `run` command.
pub struct RunOptions {
    pub config: Option<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    pub registry: Option<String>,
    pub strict: bool,
    pub dry_run: bool,
    pub format: String,
}

pub async fn execute(options: RunOptions) -> Result<()> {
    check_format(&options.format)?;

    let registry = load_registry(options.registry.as_deref())?;
    let mut config = load_config(
        options.config.as_deref(),
        options.input.as_deref(),
        options.output.as_deref(),
    )?;
    if options.strict {
        config = config.with_strict(true);
    }

    info!("Input directory: {}", config.input.dir.display());
    info!("Output directory: {}", config.output.dir.display());
    info!("Strict mode: {}", config.quality.strict);

    let version = registry.version.clone();
    let output_config = config.output.clone();
    let delimiter = config.input.delimiter_byte();
    let source = CsvDirectorySource::new(&config.input);

    let pipeline = Pipeline::new(Arc::new(registry), config).context("Invalid pipeline setup")?;
    let run = pipeline
        .prepare(Arc::new(source))
        .await
        .context("Cleaning failed")?;

    if options.dry_run {
        output::print_run_report(&run, &options.format);
        run.ensure_loadable().context("Run would not load")?;
        if options.format == "text" {
            output::print_info("Dry run: nothing was written");
        }
        return Ok(());
    }

    // Reports and violation listings are written even when the load is refused.
    let written = write_run_outputs(&output_config, &run, &version)
        .context("Failed to write run reports")?;
    for path in &written {
        info!("Wrote {}", path.display());
    }

    let mut sink = CsvDirectorySink::new(&output_config.dir, delimiter);
    if let Err(e) = run.load(&mut sink) {
        sink.rollback();
        output::print_run_report(&run, &options.format);
        return Err(e).context("Load aborted, no cleaned table was written");
    }
    let committed = sink.commit().context("Failed to publish cleaned tables")?;

    output::print_run_report(&run, &options.format);
    if options.format == "text" {
        output::print_success(&format!(
            "Wrote {} cleaned table(s) to {}",
            committed.len(),
            output_config.dir.display()
        ));
    }

    Ok(())
}
