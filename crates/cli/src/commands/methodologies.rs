use scribe_calc::MethodologyRegistry;

use crate::{print_json, OutputFormat};

pub(crate) fn cmd_methodologies(output: OutputFormat) {
    let metadata = MethodologyRegistry::with_builtins().metadata();
    match output {
        OutputFormat::Json => print_json(&metadata),
        OutputFormat::Text => {
            for m in &metadata {
                println!(
                    "{}  {} v{} ({}, minimum period {} days)",
                    m.code, m.name, m.version, m.sector, m.minimum_monitoring_period
                );
                println!("    required: {}", m.required_data_fields.join(", "));
                let buffers: Vec<String> = m
                    .default_buffers
                    .iter()
                    .map(|(tier, rate)| format!("{}={}", tier, rate))
                    .collect();
                println!("    buffers: {}", buffers.join(", "));
            }
        }
    }
}
