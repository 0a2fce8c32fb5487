use std::path::Path;
use std::process;

use scribe_calc::{CalculationRequest, Engine};
use scribe_ledger::InMemoryLedger;

use super::{print_issues, read_json};
use crate::config::CliConfig;
use crate::{print_json, report_error, OutputFormat};

/// Exits 1 when the request would be rejected by `calculate`.
pub(crate) fn cmd_validate(path: &Path, config: &CliConfig, output: OutputFormat, quiet: bool) {
    let request: CalculationRequest = match read_json(path) {
        Ok(r) => r,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let engine = Engine::with_config(InMemoryLedger::new(), config.engine.clone());
    let results = engine.validate_calculation(&request);

    match output {
        OutputFormat::Json => print_json(&results),
        OutputFormat::Text => {
            if results.is_valid {
                if !quiet {
                    println!(
                        "Valid: {} (data quality {})",
                        path.display(),
                        results.quality_score
                    );
                }
            } else {
                println!("Invalid: {}", path.display());
            }
            print_issues("error", &results.errors);
            if !quiet {
                print_issues("warning", &results.warnings);
            }
            if !results.missing_fields.is_empty() {
                println!("  missing: {}", results.missing_fields.join(", "));
            }
        }
    }

    if !results.is_valid {
        process::exit(1);
    }
}
