use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a credit record.
///
/// ```text
/// calculated -> verified -> minting -> minted -> retired
/// calculated | verified -> cancelled
/// ```
///
/// The string forms are persisted in existing ledger rows and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditStatus {
    Calculated,
    Verified,
    Minting,
    Minted,
    Retired,
    Cancelled,
}

impl CreditStatus {
    pub const ALL: [CreditStatus; 6] = [
        CreditStatus::Calculated,
        CreditStatus::Verified,
        CreditStatus::Minting,
        CreditStatus::Minted,
        CreditStatus::Retired,
        CreditStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Calculated => "calculated",
            CreditStatus::Verified => "verified",
            CreditStatus::Minting => "minting",
            CreditStatus::Minted => "minted",
            CreditStatus::Retired => "retired",
            CreditStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses reachable from `self` in one step.
    pub fn next_statuses(&self) -> &'static [CreditStatus] {
        match self {
            CreditStatus::Calculated => &[CreditStatus::Verified, CreditStatus::Cancelled],
            CreditStatus::Verified => &[CreditStatus::Minting, CreditStatus::Cancelled],
            CreditStatus::Minting => &[CreditStatus::Minted],
            CreditStatus::Minted => &[CreditStatus::Retired],
            CreditStatus::Retired | CreditStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: CreditStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    /// Only freshly calculated or verified credits may be recalculated
    /// (and thereby cancelled).
    pub fn is_recalculable(&self) -> bool {
        matches!(self, CreditStatus::Calculated | CreditStatus::Verified)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_statuses().is_empty()
    }
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown credit status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for CreditStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CreditStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// A calculated (and possibly verified, minted, ...) batch of carbon credits.
///
/// Records are never deleted. Recalculation creates a new record whose
/// `supersedes` points at the original, and the original moves to
/// `cancelled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRecord {
    pub id: String,
    pub project_id: String,
    pub vintage_year: i32,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub calculation_period_start: String,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub calculation_period_end: String,

    /// `"VM0007"`, `"VM0015"` or `"VM0033"`.
    pub methodology_code: String,
    pub calculated_tons: f64,
    pub buffered_tons: f64,
    /// Tons actually minted; set by the tokenization workflow.
    pub issued_tons: Option<f64>,
    pub data_quality_score: Option<f64>,

    pub calculation_inputs: serde_json::Value,
    pub calculation_steps: serde_json::Value,
    pub uncertainty_factors: serde_json::Value,
    pub baseline_scenario: serde_json::Value,
    /// SHA-256 (hex) of the canonical JSON of `calculation_inputs`.
    pub input_digest: String,

    pub status: CreditStatus,
    /// Id of the record this one replaced during recalculation.
    pub supersedes: Option<String>,
    /// Optimistic concurrency counter; 0 on create, +1 per update.
    pub version: i64,

    pub created_by: String,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub created_at: String,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub updated_at: String,
}
