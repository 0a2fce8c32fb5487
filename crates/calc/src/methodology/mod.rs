//! The methodology contract and its three built-in implementations.
//!
//! A methodology is a pure function set: given a validated request it
//! produces a four-step calculation log and a tonnage result. The final
//! step, the uncertainty buffer, is shared and lives here.

pub mod forest;
pub mod grassland;
pub mod soil;
pub mod steps;

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::CalculationError;
use crate::inputs::{InputError, INPUT_SCHEMA_VERSION};
use crate::numeric::round_tons;
use crate::types::{
    now_rfc3339, CalculationRequest, CalculationResult, MethodologyMetadata, ValidationResults,
};
use crate::validator;

pub use forest::ImprovedForestManagement;
pub use grassland::AvoidedGrasslandConversion;
pub use soil::SoilCarbonSequestration;
pub use steps::StepRecorder;

/// One carbon accounting standard.
pub trait Methodology: Send + Sync {
    /// Registry key, e.g. `"VM0007"`.
    fn code(&self) -> &'static str;

    fn metadata(&self) -> MethodologyMetadata;

    /// Buffer rates by data-quality tier.
    fn buffer_tiers(&self) -> BufferTiers;

    /// Methodology-specific shape checks on the monitoring document plus
    /// the minimum monitoring period.
    fn validate(&self, request: &CalculationRequest) -> Result<(), CalculationError> {
        validator::validate_methodology_data(self.code(), &request.monitoring_data)?;
        validator::period::validate_request_period(self.code(), request)
    }

    /// Deterministic given the request. Expects `request.data_quality_score`
    /// to be resolved.
    fn calculate(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculationResult, CalculationError>;

    /// Buffer amount in tons, rounded to 4 decimals. Never negative.
    fn apply_uncertainty_buffer(&self, tons: f64, data_quality: f64) -> f64 {
        self.buffer_tiers().amount(tons, data_quality)
    }
}

// ──────────────────────────────────────────────
// Buffer tiers
// ──────────────────────────────────────────────

/// Buffer rates for one methodology.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferTiers {
    /// 0.5 ≤ q < 0.7
    pub base: f64,
    /// q ≥ 0.9
    pub high_quality: f64,
    /// 0.7 ≤ q < 0.9
    pub good_quality: f64,
    /// q < 0.5
    pub low_quality: f64,
}

impl BufferTiers {
    pub fn rate(&self, data_quality: f64) -> f64 {
        if data_quality >= 0.9 {
            self.high_quality
        } else if data_quality >= 0.7 {
            self.good_quality
        } else if data_quality < 0.5 {
            self.low_quality
        } else {
            self.base
        }
    }

    pub fn amount(&self, tons: f64, data_quality: f64) -> f64 {
        round_tons(tons.max(0.0) * self.rate(data_quality))
    }

    /// The `default_buffers` table published in metadata.
    pub fn published(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("conservative".to_string(), self.base),
            ("moderate".to_string(), self.good_quality),
            ("high_quality".to_string(), self.high_quality),
        ])
    }
}

// ──────────────────────────────────────────────
// Shared calculation plumbing
// ──────────────────────────────────────────────

pub(crate) fn resolved_quality(
    code: &str,
    request: &CalculationRequest,
) -> Result<f64, CalculationError> {
    request.data_quality_score.ok_or_else(|| {
        CalculationError::invalid(
            "data_quality_score",
            format!("{} calculation requires a resolved data quality score", code),
            Some("[0, 1]"),
        )
    })
}

pub(crate) fn input_failed(code: &str, err: InputError) -> CalculationError {
    CalculationError::failed(code, err.field, err.message)
}

pub(crate) fn finite(code: &str, field: &str, value: f64) -> Result<f64, CalculationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalculationError::failed(
            code,
            field,
            "arithmetic produced a non-finite value",
        ))
    }
}

/// Everything a methodology computed before the buffer stage.
pub(crate) struct NetQuantity<'a> {
    pub name: &'a str,
    pub tons: f64,
    pub input_data: BTreeMap<String, Value>,
    pub notes: Vec<(&'a str, Value)>,
}

/// Record the buffer step and assemble the result.
pub(crate) fn finish<M: Methodology + ?Sized>(
    methodology: &M,
    net: NetQuantity<'_>,
    data_quality: f64,
    mut steps: StepRecorder,
) -> Result<CalculationResult, CalculationError> {
    let code = methodology.code();
    let rate = methodology.buffer_tiers().rate(data_quality);
    let buffer = methodology.apply_uncertainty_buffer(net.tons, data_quality);
    let uncertainty_buffer = finite(code, "uncertainty_buffer", buffer)?;
    let buffered_tons = round_tons((net.tons - uncertainty_buffer).max(0.0));

    steps.record(
        "Apply Uncertainty Buffer",
        "Withhold a data-quality-dependent share of the net quantity",
        "C_buffered = max(0, ΔC - round4(max(ΔC, 0) × buffer_rate))",
        [
            (net.name, json!(net.tons)),
            ("data_quality_score", json!(data_quality)),
            ("buffer_rate", json!(rate)),
        ],
        [
            ("uncertainty_buffer_tons", json!(uncertainty_buffer)),
            ("buffered_tons", json!(buffered_tons)),
        ],
    );

    let mut metadata = BTreeMap::from([
        ("methodology_version".to_string(), json!(methodology.metadata().version)),
        ("input_schema_version".to_string(), json!(INPUT_SCHEMA_VERSION)),
        ("calculation_date".to_string(), json!(now_rfc3339())),
    ]);
    metadata.extend(net.notes.into_iter().map(|(k, v)| (k.to_string(), v)));

    Ok(CalculationResult {
        methodology_code: code.to_string(),
        calculated_tons: net.tons,
        buffered_tons,
        data_quality_score: data_quality,
        uncertainty_buffer,
        calculation_steps: steps.into_steps(),
        input_data: net.input_data,
        validation_results: ValidationResults::valid(data_quality),
        metadata,
    })
}
