//! Conformance test suite for `CreditLedger` implementations.
//!
//! This module provides a backend-agnostic test suite that any
//! `CreditLedger` implementation can run to verify correctness. The suite
//! covers:
//!
//! - **Create/read**: records round-trip, duplicate ids are rejected
//! - **Update**: version validation (OCC) and lifecycle enforcement
//! - **Query**: per-project listing, newest-first ordering, limits
//! - **Error handling**: correct error variants and fields
//! - **Concurrency**: racing updates on one record, exactly one wins
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty ledger for each test:
//!
//! ```ignore
//! use scribe_ledger::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_postgres_ledger().await
//!     }).await;
//!     assert!(report.is_conformant(), "{report}");
//! }
//! ```

mod concurrent;
mod create;
mod error;
mod query;
mod update;

use std::fmt;
use std::future::Future;

use crate::record::{CreditRecord, CreditStatus};
use crate::CreditLedger;

/// Area of the ledger contract a check exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckArea {
    Create,
    Update,
    Query,
    Errors,
    Concurrency,
}

impl CheckArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckArea::Create => "create",
            CheckArea::Update => "update",
            CheckArea::Query => "query",
            CheckArea::Errors => "errors",
            CheckArea::Concurrency => "concurrency",
        }
    }
}

impl fmt::Display for CheckArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one ledger contract check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerCheck {
    pub area: CheckArea,
    pub name: String,
    /// `Err` carries what the ledger did wrong.
    pub outcome: Result<(), String>,
}

impl LedgerCheck {
    fn new(area: CheckArea, name: impl Into<String>, outcome: Result<(), String>) -> Self {
        Self {
            area,
            name: name.into(),
            outcome,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn violation(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}

/// Every check from one suite run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct ConformanceReport {
    pub checks: Vec<LedgerCheck>,
}

impl ConformanceReport {
    pub fn total(&self) -> usize {
        self.checks.len()
    }

    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// True when the ledger honoured every check.
    pub fn is_conformant(&self) -> bool {
        self.checks.iter().all(LedgerCheck::passed)
    }

    pub fn violations(&self) -> impl Iterator<Item = &LedgerCheck> {
        self.checks.iter().filter(|c| !c.passed())
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ledger conformance: {} of {} checks passed, {} failed",
            self.passed(),
            self.total(),
            self.failed()
        )?;
        for check in self.violations() {
            writeln!(
                f,
                "  {} / {}: {}",
                check.area,
                check.name,
                check.violation().unwrap_or_default()
            )?;
        }
        Ok(())
    }
}

/// Run the full conformance suite against a ledger backend.
///
/// `factory` is called once per check and must return an empty ledger.
pub async fn run_conformance_suite<L, F, Fut>(factory: F) -> ConformanceReport
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let mut checks = Vec::new();
    checks.extend(create::run_create_tests(&factory).await);
    checks.extend(error::run_error_tests(&factory).await);
    checks.extend(update::run_update_tests(&factory).await);
    checks.extend(query::run_query_tests(&factory).await);
    checks.extend(concurrent::run_concurrent_tests(&factory).await);
    ConformanceReport { checks }
}

// ── Helpers: record constructors with sensible defaults ──────────────────────

/// A `calculated` VM0007 record at version 0 with small fixed figures.
pub fn make_record(id: &str, project_id: &str) -> CreditRecord {
    CreditRecord {
        id: id.to_string(),
        project_id: project_id.to_string(),
        vintage_year: 2024,
        calculation_period_start: "2024-01-01T00:00:00Z".to_string(),
        calculation_period_end: "2025-01-01T00:00:00Z".to_string(),
        methodology_code: "VM0007".to_string(),
        calculated_tons: 100.0,
        buffered_tons: 80.0,
        issued_tons: None,
        data_quality_score: Some(0.8),
        calculation_inputs: serde_json::json!({"monitoring_data": {}}),
        calculation_steps: serde_json::json!([]),
        uncertainty_factors: serde_json::json!({}),
        baseline_scenario: serde_json::json!({"forest_area": 10.0}),
        input_digest: "0".repeat(64),
        status: CreditStatus::Calculated,
        supersedes: None,
        version: 0,
        created_by: "conformance".to_string(),
        created_at: "2025-01-02T00:00:00Z".to_string(),
        updated_at: "2025-01-02T00:00:00Z".to_string(),
    }
}

/// Create `record` and walk it forward to `status` through legal updates.
async fn create_in_status<L: CreditLedger>(
    ledger: &L,
    record: CreditRecord,
    status: CreditStatus,
) -> Result<CreditRecord, String> {
    let path: &[CreditStatus] = match status {
        CreditStatus::Calculated => &[],
        CreditStatus::Verified => &[CreditStatus::Verified],
        CreditStatus::Minting => &[CreditStatus::Verified, CreditStatus::Minting],
        CreditStatus::Minted => &[
            CreditStatus::Verified,
            CreditStatus::Minting,
            CreditStatus::Minted,
        ],
        CreditStatus::Retired => &[
            CreditStatus::Verified,
            CreditStatus::Minting,
            CreditStatus::Minted,
            CreditStatus::Retired,
        ],
        CreditStatus::Cancelled => &[CreditStatus::Cancelled],
    };
    let mut current = ledger
        .create(record)
        .await
        .map_err(|e| format!("create: {e}"))?;
    for next in path {
        current.status = *next;
        current = ledger
            .update(current)
            .await
            .map_err(|e| format!("advance to {next}: {e}"))?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_and_lists_violations() {
        let report = ConformanceReport {
            checks: vec![
                LedgerCheck::new(CheckArea::Create, "round_trip", Ok(())),
                LedgerCheck::new(
                    CheckArea::Update,
                    "stale_version",
                    Err("expected conflict".to_string()),
                ),
            ],
        };
        assert_eq!((report.passed(), report.failed(), report.total()), (1, 1, 2));
        assert!(!report.is_conformant());
        let text = report.to_string();
        assert!(text.starts_with("ledger conformance: 1 of 2 checks passed, 1 failed"));
        assert!(text.contains("  update / stale_version: expected conflict"));
        assert!(!text.contains("round_trip"));
    }

    #[test]
    fn empty_report_is_conformant() {
        assert!(ConformanceReport::default().is_conformant());
    }
}
