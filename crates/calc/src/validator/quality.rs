//! Statistical data-quality assessment of a monitoring document.
//!
//! Unlike the structural checks, the assessment never stops early: every
//! sub-score is computed and every finding reported.

use serde::Serialize;
use serde_json::{Map, Value};
use time::Duration;

use super::period::parse_timestamp;
use crate::error::CalculationError;
use crate::numeric::round_score;
use crate::types::{ValidationIssue, ValidationResults};

/// Source weights for completeness scoring.
const COMPLETENESS_WEIGHTS: [(&str, f64); 5] = [
    ("satellite_data", 0.25),
    ("ground_measurements", 0.25),
    ("iot_sensor_data", 0.20),
    ("third_party_verification", 0.15),
    ("historical_baseline", 0.15),
];

/// Source weights for the quick estimate used when a request has no score.
const ESTIMATE_WEIGHTS: [(&str, f64); 5] = [
    ("satellite_data", 0.30),
    ("ground_measurements", 0.25),
    ("iot_sensor_data", 0.20),
    ("third_party_verification", 0.15),
    ("historical_baseline", 0.10),
];

/// Sub-scores below this produce a warning.
const WARNING_THRESHOLD: f64 = 0.7;
/// Overall scores below this make the data unusable.
const REJECT_THRESHOLD: f64 = 0.5;

/// The three sub-scores and their mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityBreakdown {
    pub completeness: f64,
    pub consistency: f64,
    pub temporal_coverage: f64,
    pub overall: f64,
}

impl QualityBreakdown {
    pub fn of(data: &Map<String, Value>) -> Self {
        let completeness = completeness(data);
        let consistency = consistency(data);
        let temporal_coverage = temporal_coverage(data);
        Self {
            completeness,
            consistency,
            temporal_coverage,
            overall: (completeness + consistency + temporal_coverage) / 3.0,
        }
    }
}

/// Full assessment. Only a non-object document is an error.
pub fn validate_data_quality(doc: &Value) -> Result<ValidationResults, CalculationError> {
    let data = doc.as_object().ok_or_else(|| {
        CalculationError::invalid("monitoring_data", "must be an object", None)
    })?;
    let scores = QualityBreakdown::of(data);
    let mut results = ValidationResults::valid(scores.overall);

    if scores.completeness < WARNING_THRESHOLD {
        results.push_warning(ValidationIssue::new(
            "data_completeness",
            "Data completeness is below recommended threshold",
            "LOW_COMPLETENESS",
        ));
    }
    if scores.consistency < WARNING_THRESHOLD {
        results.push_warning(ValidationIssue::new(
            "data_consistency",
            "Data consistency issues detected",
            "LOW_CONSISTENCY",
        ));
    }
    if scores.temporal_coverage < WARNING_THRESHOLD {
        results.push_warning(ValidationIssue::new(
            "temporal_coverage",
            "Temporal coverage is insufficient",
            "LOW_TEMPORAL_COVERAGE",
        ));
    }

    if scores.overall < REJECT_THRESHOLD {
        results.push_error(ValidationIssue::new(
            "overall_quality",
            "Data quality is too low for reliable calculations",
            "LOW_QUALITY",
        ));
    } else if scores.overall < WARNING_THRESHOLD {
        results.push_warning(ValidationIssue::new(
            "overall_quality",
            "Data quality is moderate; expect a larger uncertainty buffer",
            "MODERATE_QUALITY",
        ));
    }

    Ok(results)
}

/// Quick score from source presence alone, rounded to 2 decimals.
/// 0.5 when no known source is present or the document is not an object.
pub fn estimate_data_quality(doc: &Value) -> f64 {
    let Some(data) = doc.as_object() else {
        return 0.5;
    };
    match weighted_presence(data, &ESTIMATE_WEIGHTS) {
        Some(score) => round_score(score.clamp(0.0, 1.0)),
        None => 0.5,
    }
}

/// Weighted mean of per-source scores over the sources that are present.
fn weighted_presence(data: &Map<String, Value>, weights: &[(&str, f64)]) -> Option<f64> {
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (source, weight) in weights {
        let Some(value) = data.get(*source) else {
            continue;
        };
        total += source_score(value) * weight;
        weight_sum += weight;
    }
    (weight_sum > 0.0).then(|| total / weight_sum)
}

/// An object reports its own `completeness` (clamped to [0, 1]), or 0.8
/// without one. Any other present value counts as 0.7.
fn source_score(value: &Value) -> f64 {
    match value.as_object() {
        Some(obj) => obj
            .get("completeness")
            .and_then(Value::as_f64)
            .map_or(0.8, |c| c.clamp(0.0, 1.0)),
        None => 0.7,
    }
}

fn completeness(data: &Map<String, Value>) -> f64 {
    weighted_presence(data, &COMPLETENESS_WEIGHTS).unwrap_or(0.3)
}

fn measurements(data: &Map<String, Value>) -> &[Value] {
    data.get("measurements")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn consistency(data: &Map<String, Value>) -> f64 {
    let mut score: f64 = 1.0;
    for m in measurements(data).iter().filter_map(Value::as_object) {
        if let Some(value) = m.get("value").and_then(Value::as_f64) {
            if !(0.0..=10_000.0).contains(&value) {
                score -= 0.1;
            }
        }
        if let Some(ts) = m.get("timestamp") {
            if ts.is_string() && parse_timestamp(Some(ts)).is_none() {
                score -= 0.05;
            }
        }
    }
    score.max(0.0)
}

fn temporal_coverage(data: &Map<String, Value>) -> f64 {
    let period = data.get("monitoring_period");
    let start = parse_timestamp(period.and_then(|p| p.get("start")));
    let end = parse_timestamp(period.and_then(|p| p.get("end")));

    let mut score = match (start, end) {
        (Some(start), Some(end)) => {
            let span = end - start;
            if span >= Duration::days(730) {
                1.0
            } else if span >= Duration::days(365) {
                0.8
            } else if span >= Duration::days(180) {
                0.6
            } else if span >= Duration::days(30) {
                0.4
            } else {
                0.2
            }
        }
        _ => 0.0,
    };

    let count = measurements(data).len();
    if count >= 12 {
        score += 0.1;
    } else if count >= 6 {
        score += 0.05;
    }
    f64::min(score, 1.0)
}
