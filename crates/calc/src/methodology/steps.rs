//! Append-only calculation log.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::types::{now_rfc3339, CalculationStep};

/// Collects [`CalculationStep`]s in order, numbering them from 1.
#[derive(Debug, Default)]
pub struct StepRecorder {
    steps: Vec<CalculationStep>,
}

impl StepRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step. Inputs and outputs are `(name, value)` pairs.
    pub fn record<const I: usize, const O: usize>(
        &mut self,
        name: &str,
        description: &str,
        formula: &str,
        inputs: [(&str, Value); I],
        outputs: [(&str, Value); O],
    ) {
        let step_number = self.steps.len() as u32 + 1;
        self.steps.push(CalculationStep {
            step_number,
            name: name.to_string(),
            description: description.to_string(),
            formula: formula.to_string(),
            inputs: into_map(inputs),
            outputs: into_map(outputs),
            timestamp: now_rfc3339(),
        });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<CalculationStep> {
        self.steps
    }
}

fn into_map<const N: usize>(pairs: [(&str, Value); N]) -> BTreeMap<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
