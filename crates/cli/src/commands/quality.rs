use std::path::Path;
use std::process;

use scribe_calc::validator::{estimate_data_quality, validate_data_quality};
use scribe_calc::QualityBreakdown;
use serde_json::{json, Value};

use super::{print_issues, read_json, report_calculation_error};
use crate::{print_json, report_error, OutputFormat};

/// Full assessment plus the quick estimate. Exits 1 when the overall score
/// is below the usable threshold.
pub(crate) fn cmd_quality(path: &Path, output: OutputFormat, quiet: bool) {
    let doc: Value = match read_json(path) {
        Ok(v) => v,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let results = match validate_data_quality(&doc) {
        Ok(r) => r,
        Err(err) => {
            report_calculation_error(&err, output, quiet);
            process::exit(1);
        }
    };
    // validate_data_quality already rejected non-objects.
    let breakdown = doc.as_object().map(QualityBreakdown::of);
    let estimate = estimate_data_quality(&doc);

    match output {
        OutputFormat::Json => print_json(&json!({
            "breakdown": breakdown,
            "estimate": estimate,
            "results": results,
        })),
        OutputFormat::Text => {
            if let Some(b) = &breakdown {
                println!("completeness:      {:.2}", b.completeness);
                println!("consistency:       {:.2}", b.consistency);
                println!("temporal coverage: {:.2}", b.temporal_coverage);
                println!("overall:           {:.2}", b.overall);
            }
            println!("estimate:          {:.2}", estimate);
            print_issues("error", &results.errors);
            if !quiet {
                print_issues("warning", &results.warnings);
            }
        }
    }

    if !results.is_valid {
        process::exit(1);
    }
}
