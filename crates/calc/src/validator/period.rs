//! Monitoring-period checks.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::error::CalculationError;
use crate::types::CalculationRequest;

/// Minimum monitoring duration in days, by methodology code.
pub fn minimum_days(code: &str) -> Option<i64> {
    match code {
        "VM0007" | "VM0015" => Some(365),
        "VM0033" => Some(730),
        _ => None,
    }
}

/// Check a `{start, end}` document of RFC 3339 strings against the
/// methodology minimum.
pub fn validate_monitoring_period(code: &str, period: &Value) -> Result<(), CalculationError> {
    let (start, end) = parse_period(code, "monitoring_period", period)?;
    check_duration(code, "monitoring_period", start, end)
}

/// The period check a methodology runs on a request: the embedded
/// `monitoring_period` when the monitoring document has one, otherwise the
/// request's calculation period.
pub(crate) fn validate_request_period(
    code: &str,
    request: &CalculationRequest,
) -> Result<(), CalculationError> {
    if let Some(embedded) = request.monitoring_data.get("monitoring_period") {
        return validate_monitoring_period(code, embedded);
    }
    let (start, end) = request.calculation_period.bounds().ok_or_else(|| {
        CalculationError::invalid(
            "calculation_period",
            "start and end dates are required",
            None,
        )
    })?;
    check_duration(code, "calculation_period", start, end)
}

pub(crate) fn parse_timestamp(value: Option<&Value>) -> Option<OffsetDateTime> {
    value
        .and_then(Value::as_str)
        .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
}

fn parse_period(
    code: &str,
    field: &str,
    period: &Value,
) -> Result<(OffsetDateTime, OffsetDateTime), CalculationError> {
    let obj = period.as_object().ok_or_else(|| {
        CalculationError::methodology_data(
            code,
            field,
            "must be an object with start and end dates",
        )
    })?;
    let (Some(start), Some(end)) = (obj.get("start"), obj.get("end")) else {
        return Err(CalculationError::methodology_data(
            code,
            field,
            "must include start and end dates",
        ));
    };
    let invalid = |part: &str| {
        CalculationError::methodology_data(
            code,
            format!("{}.{}", field, part),
            "invalid RFC 3339 timestamp",
        )
    };
    let start = parse_timestamp(Some(start)).ok_or_else(|| invalid("start"))?;
    let end = parse_timestamp(Some(end)).ok_or_else(|| invalid("end"))?;
    Ok((start, end))
}

fn check_duration(
    code: &str,
    field: &str,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<(), CalculationError> {
    if end <= start {
        return Err(CalculationError::methodology_data(
            code,
            field,
            "end date must be after start date",
        ));
    }
    let Some(days) = minimum_days(code) else {
        return Err(CalculationError::UnsupportedMethodology {
            code: code.to_string(),
        });
    };
    if end - start < Duration::days(days) {
        return Err(CalculationError::methodology_data(
            code,
            field,
            format!("{} requires a monitoring period of at least {} days", code, days),
        ));
    }
    Ok(())
}
