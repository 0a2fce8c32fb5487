use serde::{Deserialize, Serialize};

/// Engine behaviour switches.
///
/// Methodology constants (default densities, leakage rates, buffer tiers)
/// are not configurable here; they are part of each methodology's version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Estimate a missing `data_quality_score` from the monitoring document.
    /// When false such requests are rejected.
    pub estimate_missing_quality: bool,
    /// Attach data-quality assessment findings to `validate_calculation`
    /// results as warnings.
    pub assess_quality_on_validate: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            estimate_missing_quality: true,
            assess_quality_on_validate: true,
        }
    }
}
