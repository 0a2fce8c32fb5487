//! Request validation.
//!
//! Structural and methodology checks are fail-fast and return the first
//! problem as a [`CalculationError`]. The data-quality assessment in
//! [`quality`] aggregates instead and reports everything it finds.
//! Nothing in this module has side effects.

pub mod period;
pub mod quality;
pub mod rules;

use std::collections::BTreeMap;

use serde_json::Value;
use time::OffsetDateTime;

use crate::error::CalculationError;
use crate::types::{CalculationRequest, UncertaintyFactor, ValidationResults};

pub use period::{minimum_days, validate_monitoring_period};
pub use quality::{estimate_data_quality, validate_data_quality, QualityBreakdown};
pub use rules::validate_methodology_data;

/// Structural request validator.
///
/// The vintage-year ceiling is the current year plus one. Tests pin the
/// reference year with [`Validator::with_reference_year`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    reference_year: Option<i32>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_year(year: i32) -> Self {
        Self {
            reference_year: Some(year),
        }
    }

    fn current_year(&self) -> i32 {
        self.reference_year
            .unwrap_or_else(|| OffsetDateTime::now_utc().year())
    }

    /// Structural checks, in order: project id, vintage year, methodology
    /// code, period presence, period order, data-quality range, monitoring
    /// data presence, uncertainty factors.
    pub fn validate_calculation_request(
        &self,
        request: &CalculationRequest,
    ) -> Result<(), CalculationError> {
        if request.project_id.trim().is_empty() {
            return Err(CalculationError::invalid("project_id", "project_id is required", None));
        }

        let max_year = self.current_year() + 1;
        if request.vintage_year <= 0 || request.vintage_year > max_year {
            return Err(CalculationError::invalid(
                "vintage_year",
                format!("invalid vintage_year {}", request.vintage_year),
                Some(format!("1..={}", max_year).as_str()),
            ));
        }

        if request.methodology_code.trim().is_empty() {
            return Err(CalculationError::invalid(
                "methodology_code",
                "methodology_code is required",
                None,
            ));
        }

        let Some((start, end)) = request.calculation_period.bounds() else {
            return Err(CalculationError::invalid(
                "calculation_period",
                "calculation_period start and end dates are required",
                None,
            ));
        };
        if end <= start {
            return Err(CalculationError::invalid(
                "calculation_period",
                "calculation_period end date must be after start date",
                None,
            ));
        }

        if let Some(score) = request.data_quality_score {
            if !(0.0..=1.0).contains(&score) {
                return Err(CalculationError::invalid(
                    "data_quality_score",
                    format!("data_quality_score {} out of range", score),
                    Some("[0, 1]"),
                ));
            }
        }

        if is_empty_document(&request.monitoring_data) {
            return Err(CalculationError::invalid(
                "monitoring_data",
                "monitoring_data is required",
                None,
            ));
        }

        self.validate_uncertainty_factors(&request.uncertainty_factors)
    }

    /// Names must come from the [`UncertaintyFactor`] vocabulary and values
    /// must lie in [0, 1].
    pub fn validate_uncertainty_factors(
        &self,
        factors: &BTreeMap<String, f64>,
    ) -> Result<(), CalculationError> {
        for (name, value) in factors {
            if name.parse::<UncertaintyFactor>().is_err() {
                return Err(CalculationError::invalid(
                    format!("uncertainty_factors.{}", name),
                    format!("unknown uncertainty factor: {}", name),
                    Some(UncertaintyFactor::vocabulary().as_str()),
                ));
            }
            if !(0.0..=1.0).contains(value) {
                return Err(CalculationError::invalid(
                    format!("uncertainty_factors.{}", name),
                    format!("uncertainty factor {} out of range", name),
                    Some("[0, 1]"),
                ));
            }
        }
        Ok(())
    }

    /// Requires `baseline_scenario` and a `reference_period` whose end
    /// follows its start. Not part of the calculation gate.
    pub fn validate_baseline_data(&self, doc: &Value) -> Result<(), CalculationError> {
        let data = doc
            .as_object()
            .ok_or_else(|| CalculationError::invalid("baseline_data", "must be an object", None))?;
        for key in ["baseline_scenario", "reference_period"] {
            if !data.contains_key(key) {
                return Err(CalculationError::invalid(
                    format!("baseline_data.{}", key),
                    format!("baseline_data.{} is required", key),
                    None,
                ));
            }
        }

        let reference = data.get("reference_period");
        let field = "baseline_data.reference_period";
        let (Some(start), Some(end)) = (
            reference.and_then(|r| r.get("start")),
            reference.and_then(|r| r.get("end")),
        ) else {
            return Err(CalculationError::invalid(
                field,
                "reference_period must include start and end dates",
                None,
            ));
        };
        let (Some(start), Some(end)) = (
            period::parse_timestamp(Some(start)),
            period::parse_timestamp(Some(end)),
        ) else {
            return Err(CalculationError::invalid(
                field,
                "invalid reference period date format",
                Some("RFC 3339 timestamps"),
            ));
        };
        if end <= start {
            return Err(CalculationError::invalid(
                field,
                "reference_period end date must be after start date",
                None,
            ));
        }
        Ok(())
    }

    pub fn validate_methodology_data(
        &self,
        code: &str,
        data: &Value,
    ) -> Result<(), CalculationError> {
        rules::validate_methodology_data(code, data)
    }

    pub fn validate_monitoring_period(
        &self,
        code: &str,
        period: &Value,
    ) -> Result<(), CalculationError> {
        period::validate_monitoring_period(code, period)
    }

    pub fn validate_data_quality(
        &self,
        doc: &Value,
    ) -> Result<ValidationResults, CalculationError> {
        quality::validate_data_quality(doc)
    }

    pub fn estimate_data_quality(&self, doc: &Value) -> f64 {
        quality::estimate_data_quality(doc)
    }
}

fn is_empty_document(doc: &Value) -> bool {
    match doc {
        Value::Null => true,
        Value::Object(o) => o.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    use crate::types::CalculationPeriod;

    fn valid_request() -> CalculationRequest {
        CalculationRequest::new(
            "project-1",
            2024,
            "VM0007",
            CalculationPeriod::new(datetime!(2023-01-01 0:00 UTC), datetime!(2024-01-01 0:00 UTC)),
        )
        .with_monitoring_data(json!({ "forest_inventory": {} }))
    }

    fn failing_field(request: &CalculationRequest) -> String {
        match Validator::with_reference_year(2024).validate_calculation_request(request) {
            Err(CalculationError::InvalidRequest { field, .. }) => field,
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(Validator::with_reference_year(2024)
            .validate_calculation_request(&valid_request())
            .is_ok());
    }

    #[test]
    fn checks_run_in_order() {
        // Everything wrong: the project id is reported first.
        let mut req = CalculationRequest::new("", 0, "", CalculationPeriod::default());
        assert_eq!(failing_field(&req), "project_id");
        req.project_id = "p".into();
        assert_eq!(failing_field(&req), "vintage_year");
        req.vintage_year = 2024;
        assert_eq!(failing_field(&req), "methodology_code");
        req.methodology_code = "VM0007".into();
        assert_eq!(failing_field(&req), "calculation_period");
        req.calculation_period =
            CalculationPeriod::new(datetime!(2024-01-01 0:00 UTC), datetime!(2023-01-01 0:00 UTC));
        assert_eq!(failing_field(&req), "calculation_period");
        req.calculation_period =
            CalculationPeriod::new(datetime!(2023-01-01 0:00 UTC), datetime!(2024-01-01 0:00 UTC));
        req.data_quality_score = Some(1.5);
        assert_eq!(failing_field(&req), "data_quality_score");
        req.data_quality_score = Some(0.8);
        assert_eq!(failing_field(&req), "monitoring_data");
        req.monitoring_data = json!({ "x": 1 });
        req.uncertainty_factors.insert("vibes".into(), 0.1);
        assert_eq!(failing_field(&req), "uncertainty_factors.vibes");
    }

    #[test]
    fn vintage_year_bounds() {
        let mut req = valid_request();
        req.vintage_year = 2025;
        assert!(Validator::with_reference_year(2024).validate_calculation_request(&req).is_ok());
        req.vintage_year = 2026;
        assert_eq!(failing_field(&req), "vintage_year");
        req.vintage_year = -3;
        assert_eq!(failing_field(&req), "vintage_year");
    }

    #[test]
    fn invalid_vintage_reports_expected_range() {
        let mut req = valid_request();
        req.vintage_year = 3000;
        match Validator::with_reference_year(2024).validate_calculation_request(&req) {
            Err(CalculationError::InvalidRequest { expected, .. }) => {
                assert_eq!(expected.as_deref(), Some("1..=2025"))
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn empty_monitoring_shapes() {
        for empty in [json!(null), json!({}), json!([]), json!("")] {
            let req = valid_request().with_monitoring_data(empty);
            assert_eq!(failing_field(&req), "monitoring_data");
        }
    }

    #[test]
    fn uncertainty_factor_range() {
        let v = Validator::new();
        let mut factors = BTreeMap::new();
        factors.insert("sampling_error".to_string(), 0.2);
        factors.insert("model_uncertainty".to_string(), 1.0);
        assert!(v.validate_uncertainty_factors(&factors).is_ok());
        factors.insert("measurement_error".to_string(), 1.01);
        let err = v.validate_uncertainty_factors(&factors).unwrap_err();
        assert_eq!(err.field(), Some("uncertainty_factors.measurement_error"));
    }

    #[test]
    fn baseline_document_checks() {
        let v = Validator::new();
        assert!(v
            .validate_baseline_data(&json!({
                "baseline_scenario": "continued logging",
                "reference_period": {
                    "start": "2010-01-01T00:00:00Z",
                    "end": "2020-01-01T00:00:00Z"
                }
            }))
            .is_ok());
        assert_eq!(
            v.validate_baseline_data(&json!({ "reference_period": {} }))
                .unwrap_err()
                .field(),
            Some("baseline_data.baseline_scenario")
        );
        assert!(v
            .validate_baseline_data(&json!({
                "baseline_scenario": "x",
                "reference_period": { "start": "2020-01-01T00:00:00Z" }
            }))
            .is_err());
        assert!(v
            .validate_baseline_data(&json!({
                "baseline_scenario": "x",
                "reference_period": {
                    "start": "2020-01-01T00:00:00Z",
                    "end": "2010-01-01T00:00:00Z"
                }
            }))
            .is_err());
    }
}
