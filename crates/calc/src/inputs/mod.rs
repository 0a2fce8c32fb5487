//! Typed views over the semi-structured monitoring and baseline documents.
//!
//! Methodologies never read raw JSON. Each one parses its documents through
//! this module into plain structs and does arithmetic on those. Parsing is
//! lenient only where a default-value policy exists (absent carbon
//! densities, absent pool values, an absent project emission rate); every
//! other gap is an [`InputError`] naming the field.

pub mod forest;
pub mod grassland;
pub mod soil;

use serde_json::{Map, Value};

pub use forest::{ForestBaseline, ForestMonitoring, LeakageRate, LeakageSource, Stratum};
pub use grassland::{ConversionRateSource, GrasslandInputs};
pub use soil::{SoilSample, SoilSurvey};

/// Version of the document layout these parsers accept. Recorded in every
/// result's metadata so that stored calculations can be replayed against
/// the right parser.
pub const INPUT_SCHEMA_VERSION: u32 = 1;

/// A document field was missing or unusable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct InputError {
    pub field: String,
    pub message: String,
}

impl InputError {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ──────────────────────────────────────────────
// JSON extraction helpers
// ──────────────────────────────────────────────

/// The document as an object, or an error naming `field`.
pub(crate) fn as_object<'a>(
    doc: &'a Value,
    field: &str,
) -> Result<&'a Map<String, Value>, InputError> {
    doc.as_object()
        .ok_or_else(|| InputError::new(field, "must be an object"))
}

/// A numeric member; non-numbers read as absent.
pub(crate) fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

/// A numeric member where absent and zero both mean "use the default".
pub(crate) fn number_or(obj: &Map<String, Value>, key: &str, default: f64) -> f64 {
    match number(obj, key) {
        Some(v) if v != 0.0 => v,
        _ => default,
    }
}

/// A fraction in [0, 1], if the member is present. Present but not a
/// fraction is an error.
pub(crate) fn fraction(
    obj: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<Option<f64>, InputError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_f64() {
            Some(f) if (0.0..=1.0).contains(&f) => Ok(Some(f)),
            Some(f) => Err(InputError::new(
                field,
                format!("must be between 0 and 1, got {}", f),
            )),
            None => Err(InputError::new(field, "must be a number")),
        },
    }
}

/// A required strictly positive number.
pub(crate) fn positive(
    obj: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<f64, InputError> {
    match number(obj, key) {
        Some(v) if v > 0.0 => Ok(v),
        Some(v) => Err(InputError::new(field, format!("must be positive, got {}", v))),
        None => Err(InputError::new(field, "is required and must be a number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn zero_and_absent_fall_back_to_default() {
        let o = obj(json!({ "a": 0, "b": 12.5, "c": "x" }));
        assert_eq!(number_or(&o, "a", 7.0), 7.0);
        assert_eq!(number_or(&o, "b", 7.0), 12.5);
        assert_eq!(number_or(&o, "c", 7.0), 7.0);
        assert_eq!(number_or(&o, "missing", 7.0), 7.0);
    }

    #[test]
    fn fraction_bounds() {
        let o = obj(json!({ "ok": 0.3, "high": 1.5, "text": "low", "null": null }));
        assert_eq!(fraction(&o, "ok", "ok"), Ok(Some(0.3)));
        assert_eq!(fraction(&o, "missing", "missing"), Ok(None));
        assert_eq!(fraction(&o, "null", "null"), Ok(None));
        assert!(fraction(&o, "high", "high").is_err());
        assert!(fraction(&o, "text", "text").is_err());
    }

    #[test]
    fn positive_rejects_zero_and_missing() {
        let o = obj(json!({ "area": 0.0, "depth": 30 }));
        assert_eq!(positive(&o, "depth", "depth"), Ok(30.0));
        assert_eq!(
            positive(&o, "area", "x.area").unwrap_err().field,
            "x.area"
        );
        assert!(positive(&o, "missing", "missing").is_err());
    }

    #[test]
    fn non_object_document_rejected() {
        assert!(as_object(&json!([1, 2]), "monitoring_data").is_err());
        assert!(as_object(&json!({}), "monitoring_data").is_ok());
    }
}
