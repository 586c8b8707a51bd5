mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ecomclean")]
#[command(version, about = "E-commerce extract cleaning and referential integrity CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the raw extracts, enforce integrity and write the cleaned tables
    Run {
        /// Pipeline configuration file (YAML or TOML)
        #[arg(short, long)]
        config: Option<String>,

        /// Directory holding the raw extracts
        #[arg(short, long)]
        input: Option<String>,

        /// Directory for cleaned tables and reports
        #[arg(short, long)]
        output: Option<String>,

        /// Registry declaration (defaults to the built-in registry)
        #[arg(short, long)]
        registry: Option<String>,

        /// Treat missed quality targets as fatal
        #[arg(short, long)]
        strict: bool,

        /// Run both passes and report, without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate and summarize a registry declaration
    Check {
        /// Registry declaration (defaults to the built-in registry)
        #[arg(short, long)]
        registry: Option<String>,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Profile the raw extracts before cleaning
    Profile {
        /// Pipeline configuration file (YAML or TOML)
        #[arg(short, long)]
        config: Option<String>,

        /// Directory holding the raw extracts
        #[arg(short, long)]
        input: Option<String>,

        /// Directory for the profiling summary
        #[arg(short, long)]
        output: Option<String>,

        /// Write the profiling summary CSV
        #[arg(short, long)]
        write: bool,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // Logs go to stderr so JSON output on stdout stays parseable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    // Execute command
    match cli.command {
        Commands::Run {
            config,
            input,
            output,
            registry,
            strict,
            dry_run,
            format,
        } => {
            let options = commands::run::RunOptions {
                config,
                input,
                output,
                registry,
                strict,
                dry_run,
                format,
            };
            commands::run::execute(options).await
        }

        Commands::Check { registry, format } => {
            commands::check::execute(registry.as_deref(), &format).await
        }

        Commands::Profile {
            config,
            input,
            output,
            write,
            format,
        } => {
            commands::profile::execute(
                config.as_deref(),
                input.as_deref(),
                output.as_deref(),
                write,
                &format,
            )
            .await
        }
    }
}
