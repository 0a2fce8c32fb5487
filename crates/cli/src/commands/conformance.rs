use std::process;

use scribe_ledger::conformance::run_conformance_suite;
use scribe_ledger::InMemoryLedger;
use serde_json::json;

use crate::{print_json, OutputFormat};

pub(crate) async fn cmd_conformance(output: OutputFormat, quiet: bool) {
    let report = run_conformance_suite(|| async { InMemoryLedger::new() }).await;

    match output {
        OutputFormat::Json => {
            let violations: Vec<_> = report
                .violations()
                .map(|check| {
                    json!({
                        "area": check.area.as_str(),
                        "name": check.name,
                        "message": check.violation(),
                    })
                })
                .collect();
            print_json(&json!({
                "passed": report.passed(),
                "failed": report.failed(),
                "total": report.total(),
                "violations": violations,
            }));
        }
        OutputFormat::Text => {
            if !quiet || !report.is_conformant() {
                print!("{}", report);
            }
        }
    }

    if !report.is_conformant() {
        process::exit(1);
    }
}
