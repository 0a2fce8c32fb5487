pub(crate) mod calculate;
pub(crate) mod conformance;
pub(crate) mod methodologies;
pub(crate) mod quality;
pub(crate) mod validate;

use std::path::Path;

use scribe_calc::{CalculationError, ValidationIssue};
use serde::de::DeserializeOwned;

use crate::OutputFormat;

/// Read and parse a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading file '{}': {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("error parsing JSON in '{}': {}", path.display(), e))
}

/// Report an engine error with its stable code.
pub(crate) fn report_calculation_error(err: &CalculationError, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error [{}]: {}", err.code(), err),
        OutputFormat::Json => eprintln!(
            "{}",
            serde_json::json!({
                "error": err.to_string(),
                "code": err.code(),
                "field": err.field(),
            })
        ),
    }
}

pub(crate) fn print_issues(label: &str, issues: &[ValidationIssue]) {
    for issue in issues {
        println!("  {} [{}] {}: {}", label, issue.code, issue.field, issue.message);
    }
}
