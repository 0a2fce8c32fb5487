mod commands;
mod config;
mod logging;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::CliConfig;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Carbon credit calculation toolkit.
#[derive(Parser)]
#[command(name = "scribe", version, about = "Carbon credit calculation toolkit")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to a scribe.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the supported methodologies
    Methodologies,

    /// Validate a calculation request without calculating
    Validate {
        /// Path to the calculation request JSON file
        request: PathBuf,
    },

    /// Assess the data quality of a monitoring document
    Quality {
        /// Path to the monitoring data JSON file
        monitoring: PathBuf,
    },

    /// Calculate credits for a request against an in-memory ledger
    Calculate {
        /// Path to the calculation request JSON file
        request: PathBuf,
        /// Actor recorded as the record's creator
        #[arg(long, default_value = "cli")]
        actor: String,
        /// Recalculate the new credit with this monitoring data JSON file
        #[arg(long)]
        recalculate: Option<PathBuf>,
    },

    /// Run the credit ledger conformance suite against the in-memory ledger
    Conformance,
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match config::read_config(path) {
            Ok(c) => c,
            Err(msg) => {
                report_error(&msg, cli.output, cli.quiet);
                process::exit(1);
            }
        },
        None => CliConfig::default(),
    };

    if let Err(msg) = logging::init_tracing(&config.logging) {
        report_error(&msg, cli.output, cli.quiet);
        process::exit(1);
    }

    match cli.command {
        Commands::Methodologies => {
            commands::methodologies::cmd_methodologies(cli.output);
        }
        Commands::Validate { request } => {
            commands::validate::cmd_validate(&request, &config, cli.output, cli.quiet);
        }
        Commands::Quality { monitoring } => {
            commands::quality::cmd_quality(&monitoring, cli.output, cli.quiet);
        }
        Commands::Calculate {
            request,
            actor,
            recalculate,
        } => {
            runtime(cli.output, cli.quiet).block_on(commands::calculate::cmd_calculate(
                commands::calculate::CalculateOptions {
                    request: &request,
                    actor: &actor,
                    recalculate: recalculate.as_deref(),
                    config: &config,
                    output: cli.output,
                    quiet: cli.quiet,
                },
            ));
        }
        Commands::Conformance => {
            runtime(cli.output, cli.quiet)
                .block_on(commands::conformance::cmd_conformance(cli.output, cli.quiet));
        }
    }
}

fn runtime(output: OutputFormat, quiet: bool) -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(&format!("could not start runtime: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

/// Report an error message in the appropriate format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) {
    let pretty = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization error: {}\"}}", e));
    println!("{}", pretty);
}
