//! Request, step, result and metadata types for credit calculations.
//!
//! These are the wire shapes the engine accepts and produces. Monitoring and
//! baseline documents stay semi-structured here; the `inputs` module is the
//! only place they are turned into typed methodology inputs.

pub mod factors;
pub mod validation;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub use factors::UncertaintyFactor;
pub use validation::{ValidationIssue, ValidationResults};

// ──────────────────────────────────────────────
// Request
// ──────────────────────────────────────────────

/// Time window a calculation covers.
///
/// Both ends are optional at the type level so that a payload missing one
/// of them reaches structural validation and is reported by field name
/// instead of failing deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationPeriod {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
}

impl CalculationPeriod {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Both ends, if present.
    pub fn bounds(&self) -> Option<(OffsetDateTime, OffsetDateTime)> {
        Some((self.start?, self.end?))
    }
}

/// Input to one calculation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub vintage_year: i32,
    #[serde(default)]
    pub methodology_code: String,
    #[serde(default)]
    pub calculation_period: CalculationPeriod,
    #[serde(default)]
    pub monitoring_data: serde_json::Value,
    #[serde(default)]
    pub baseline_data: serde_json::Value,
    /// In [0, 1]. Estimated from the monitoring document when absent.
    #[serde(default)]
    pub data_quality_score: Option<f64>,
    /// Keys restricted to [`UncertaintyFactor`] names, values in [0, 1].
    #[serde(default)]
    pub uncertainty_factors: BTreeMap<String, f64>,
}

impl CalculationRequest {
    pub fn new(
        project_id: impl Into<String>,
        vintage_year: i32,
        methodology_code: impl Into<String>,
        period: CalculationPeriod,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            vintage_year,
            methodology_code: methodology_code.into(),
            calculation_period: period,
            monitoring_data: serde_json::Value::Null,
            baseline_data: serde_json::Value::Null,
            data_quality_score: None,
            uncertainty_factors: BTreeMap::new(),
        }
    }

    pub fn with_monitoring_data(mut self, data: serde_json::Value) -> Self {
        self.monitoring_data = data;
        self
    }

    pub fn with_baseline_data(mut self, data: serde_json::Value) -> Self {
        self.baseline_data = data;
        self
    }

    pub fn with_data_quality_score(mut self, score: f64) -> Self {
        self.data_quality_score = Some(score);
        self
    }

    pub fn with_uncertainty_factor(mut self, factor: UncertaintyFactor, value: f64) -> Self {
        self.uncertainty_factors
            .insert(factor.as_str().to_string(), value);
        self
    }
}

// ──────────────────────────────────────────────
// Calculation log and result
// ──────────────────────────────────────────────

/// One arithmetic stage of a calculation.
///
/// Steps are appended in order and never modified afterwards; together with
/// the request they reproduce the result exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationStep {
    /// 1-based, strictly increasing within one calculation.
    pub step_number: u32,
    pub name: String,
    pub description: String,
    pub formula: String,
    pub inputs: BTreeMap<String, serde_json::Value>,
    pub outputs: BTreeMap<String, serde_json::Value>,
    /// RFC 3339 timestamp string.
    pub timestamp: String,
}

/// Output of one methodology run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub methodology_code: String,
    /// Net quantity before the uncertainty buffer. May be negative.
    pub calculated_tons: f64,
    /// `max(0, calculated_tons - uncertainty_buffer)`.
    pub buffered_tons: f64,
    pub data_quality_score: f64,
    pub uncertainty_buffer: f64,
    pub calculation_steps: Vec<CalculationStep>,
    pub input_data: BTreeMap<String, serde_json::Value>,
    pub validation_results: ValidationResults,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

// ──────────────────────────────────────────────
// Methodology description
// ──────────────────────────────────────────────

/// Static description of a methodology, one instance per methodology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodologyMetadata {
    pub code: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub sector: String,
    /// Minimum monitoring period in days.
    pub minimum_monitoring_period: u32,
    pub required_data_fields: Vec<String>,
    /// Buffer rates keyed `conservative`, `moderate`, `high_quality`.
    pub default_buffers: BTreeMap<String, f64>,
    pub co_benefits: Vec<String>,
    pub certification: String,
}

/// Current UTC time as an RFC 3339 string.
pub(crate) fn now_rfc3339() -> String {
    format_timestamp(OffsetDateTime::now_utc())
}

/// Format a timestamp as RFC 3339, falling back to the Unix timestamp if the
/// value is outside the representable range.
pub(crate) fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339)
        .unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn request_deserializes_from_wire_shape() {
        let req: CalculationRequest = serde_json::from_value(json!({
            "project_id": "p-1",
            "vintage_year": 2024,
            "methodology_code": "VM0033",
            "calculation_period": {
                "start": "2022-01-01T00:00:00Z",
                "end": "2024-01-01T00:00:00Z"
            },
            "monitoring_data": { "soil_carbon_measurements": [] },
            "data_quality_score": 0.8,
            "uncertainty_factors": { "sampling_error": 0.1 }
        }))
        .unwrap();
        assert_eq!(req.project_id, "p-1");
        assert_eq!(
            req.calculation_period.bounds(),
            Some((datetime!(2022-01-01 0:00 UTC), datetime!(2024-01-01 0:00 UTC)))
        );
        assert_eq!(req.data_quality_score, Some(0.8));
        assert_eq!(req.uncertainty_factors["sampling_error"], 0.1);
        assert!(req.baseline_data.is_null());
    }

    #[test]
    fn missing_fields_default_instead_of_failing() {
        let req: CalculationRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.project_id.is_empty());
        assert_eq!(req.vintage_year, 0);
        assert_eq!(req.calculation_period.bounds(), None);
        assert!(req.uncertainty_factors.is_empty());
    }

    #[test]
    fn builder_sets_factor_by_vocabulary_name() {
        let req = CalculationRequest::new(
            "p",
            2024,
            "VM0007",
            CalculationPeriod::new(datetime!(2023-01-01 0:00 UTC), datetime!(2024-01-01 0:00 UTC)),
        )
        .with_uncertainty_factor(UncertaintyFactor::ModelUncertainty, 0.2);
        assert_eq!(req.uncertainty_factors["model_uncertainty"], 0.2);
    }

    #[test]
    fn timestamps_format_as_rfc3339() {
        assert_eq!(
            format_timestamp(datetime!(2024-03-01 12:30:00 UTC)),
            "2024-03-01T12:30:00Z"
        );
    }
}
