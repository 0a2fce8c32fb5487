use std::path::Path;
use std::process;

use scribe_calc::{CalculationRequest, Engine};
use scribe_ledger::{CreditRecord, InMemoryLedger};
use serde_json::{json, Value};
use tracing::debug;

use super::{read_json, report_calculation_error};
use crate::config::CliConfig;
use crate::{print_json, report_error, OutputFormat};

pub(crate) struct CalculateOptions<'a> {
    pub request: &'a Path,
    pub actor: &'a str,
    pub recalculate: Option<&'a Path>,
    pub config: &'a CliConfig,
    pub output: OutputFormat,
    pub quiet: bool,
}

/// Calculate a request, optionally recalculate the new credit, and print
/// the project's history. The ledger lives only for this invocation.
pub(crate) async fn cmd_calculate(opts: CalculateOptions<'_>) {
    let request: CalculationRequest = match read_json(opts.request) {
        Ok(r) => r,
        Err(msg) => {
            report_error(&msg, opts.output, opts.quiet);
            process::exit(1);
        }
    };
    let new_monitoring: Option<Value> = match opts.recalculate {
        Some(path) => match read_json(path) {
            Ok(v) => Some(v),
            Err(msg) => {
                report_error(&msg, opts.output, opts.quiet);
                process::exit(1);
            }
        },
        None => None,
    };

    let engine = Engine::with_config(InMemoryLedger::new(), opts.config.engine.clone());
    let project_id = request.project_id.clone();

    let created = match engine.calculate_credits(request, opts.actor).await {
        Ok(record) => record,
        Err(err) => {
            report_calculation_error(&err, opts.output, opts.quiet);
            process::exit(1);
        }
    };
    debug!(credit_id = %created.id, "calculated");

    let mut latest = created;
    if let Some(monitoring) = new_monitoring {
        latest = match engine
            .recalculate_credits(&latest.id, monitoring, opts.actor)
            .await
        {
            Ok(record) => record,
            Err(err) => {
                report_calculation_error(&err, opts.output, opts.quiet);
                process::exit(1);
            }
        };
    }

    let history = match engine.calculation_history(&project_id, 0).await {
        Ok(h) => h,
        Err(err) => {
            report_calculation_error(&err, opts.output, opts.quiet);
            process::exit(1);
        }
    };

    match opts.output {
        OutputFormat::Json => print_json(&json!({
            "credit": latest,
            "history": history,
        })),
        OutputFormat::Text => print_text(&latest, &history, opts.quiet),
    }
}

fn print_text(credit: &CreditRecord, history: &[CreditRecord], quiet: bool) {
    println!("credit {}", credit.id);
    println!("  project:         {}", credit.project_id);
    println!("  methodology:     {}", credit.methodology_code);
    println!("  vintage:         {}", credit.vintage_year);
    println!("  calculated tons: {}", credit.calculated_tons);
    println!("  buffered tons:   {}", credit.buffered_tons);
    if let Some(score) = credit.data_quality_score {
        println!("  data quality:    {}", score);
    }
    println!("  status:          {}", credit.status);
    if let Some(prev) = &credit.supersedes {
        println!("  supersedes:      {}", prev);
    }
    println!("  input digest:    {}", credit.input_digest);

    if quiet {
        return;
    }
    if let Some(steps) = credit.calculation_steps.as_array() {
        println!("steps:");
        for step in steps {
            let number = step.get("step_number").and_then(Value::as_u64).unwrap_or(0);
            let name = step.get("name").and_then(Value::as_str).unwrap_or("");
            let formula = step.get("formula").and_then(Value::as_str).unwrap_or("");
            println!("  {}. {}: {}", number, name, formula);
        }
    }
    if history.len() > 1 {
        println!("history:");
        for record in history {
            println!("  {} {} {}", record.id, record.status, record.buffered_tons);
        }
    }
}
