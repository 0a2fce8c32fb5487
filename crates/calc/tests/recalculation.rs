//! Recalculation and supersession against the in-memory ledger.

use async_trait::async_trait;
use scribe_calc::{CalculationError, CalculationPeriod, CalculationRequest, Engine};
use scribe_ledger::{CreditLedger, CreditRecord, CreditStatus, InMemoryLedger, LedgerError};
use serde_json::{json, Value};
use time::macros::datetime;

fn grassland_monitoring(area: f64) -> Value {
    json!({
        "grassland_area": area,
        "carbon_stock_density": 60,
        "project_activities": { "emission_rate": 0.01 },
        "satellite_data": { "completeness": 0.9 }
    })
}

fn request(quality: Option<f64>) -> CalculationRequest {
    let mut req = CalculationRequest::new(
        "project-r",
        2024,
        "VM0015",
        CalculationPeriod::new(datetime!(2023-01-01 0:00 UTC), datetime!(2024-01-01 0:00 UTC)),
    )
    .with_monitoring_data(grassland_monitoring(100.0))
    .with_baseline_data(json!({ "baseline_conversion_rate": 0.3 }));
    req.data_quality_score = quality;
    req
}

/// Drive a stored record forward through legal transitions.
async fn advance<L: CreditLedger>(ledger: &L, id: &str, path: &[CreditStatus]) -> CreditRecord {
    let mut record = ledger.get_by_id(id).await.unwrap();
    for status in path {
        record.status = *status;
        record = ledger.update(record).await.unwrap();
    }
    record
}

#[tokio::test]
async fn recalculation_supersedes_original() {
    let engine = Engine::new(InMemoryLedger::new());
    let original = engine.calculate_credits(request(Some(0.8)), "analyst").await.unwrap();

    let replacement = engine
        .recalculate_credits(&original.id, grassland_monitoring(150.0), "reviewer")
        .await
        .unwrap();

    assert_eq!(replacement.status, CreditStatus::Calculated);
    assert_eq!(replacement.supersedes.as_deref(), Some(original.id.as_str()));
    assert_eq!(replacement.created_by, "reviewer");
    assert!(replacement.calculated_tons > original.calculated_tons);

    let stored = engine.ledger().get_by_id(&original.id).await.unwrap();
    assert_eq!(stored.status, CreditStatus::Cancelled);
    assert_eq!(stored.version, 1);

    let history = engine.calculation_history("project-r", 0).await.unwrap();
    let ids: Vec<_> = history.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, [replacement.id.as_str(), original.id.as_str()]);
}

#[tokio::test]
async fn verified_credit_can_be_recalculated() {
    let engine = Engine::new(InMemoryLedger::new());
    let original = engine.calculate_credits(request(Some(0.8)), "analyst").await.unwrap();
    advance(engine.ledger(), &original.id, &[CreditStatus::Verified]).await;

    engine
        .recalculate_credits(&original.id, grassland_monitoring(120.0), "reviewer")
        .await
        .unwrap();
    let stored = engine.ledger().get_by_id(&original.id).await.unwrap();
    assert_eq!(stored.status, CreditStatus::Cancelled);
}

#[tokio::test]
async fn minted_and_retired_credits_are_refused() {
    let minted_path = [CreditStatus::Verified, CreditStatus::Minting, CreditStatus::Minted];
    for extra in [None, Some(CreditStatus::Retired)] {
        let engine = Engine::new(InMemoryLedger::new());
        let original = engine.calculate_credits(request(Some(0.8)), "analyst").await.unwrap();
        let mut path = minted_path.to_vec();
        path.extend(extra);
        let before = advance(engine.ledger(), &original.id, &path).await;

        let err = engine
            .recalculate_credits(&original.id, grassland_monitoring(150.0), "reviewer")
            .await
            .unwrap_err();
        match err {
            CalculationError::IllegalStateTransition { credit_id, status } => {
                assert_eq!(credit_id, original.id);
                assert_eq!(status, before.status.as_str());
            }
            other => panic!("expected IllegalStateTransition, got {other:?}"),
        }
        assert_eq!(engine.ledger().len(), 1);
        assert_eq!(engine.ledger().get_by_id(&original.id).await.unwrap(), before);
    }
}

#[tokio::test]
async fn unknown_credit_is_a_ledger_error() {
    let engine = Engine::new(InMemoryLedger::new());
    let err = engine
        .recalculate_credits("missing", grassland_monitoring(1.0), "reviewer")
        .await
        .unwrap_err();
    assert!(matches!(err, CalculationError::Ledger(LedgerError::NotFound { .. })));
    assert_eq!(err.code(), "LEDGER_ERROR");
}

#[tokio::test]
async fn invalid_new_data_leaves_original_alone() {
    let engine = Engine::new(InMemoryLedger::new());
    let original = engine.calculate_credits(request(Some(0.8)), "analyst").await.unwrap();

    let err = engine
        .recalculate_credits(&original.id, json!({ "grassland_area": -1 }), "reviewer")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "METHODOLOGY_VALIDATION_ERROR");
    assert_eq!(engine.ledger().len(), 1);
    let stored = engine.ledger().get_by_id(&original.id).await.unwrap();
    assert_eq!(stored.status, CreditStatus::Calculated);
    assert_eq!(stored.version, 0);
}

#[tokio::test]
async fn provided_score_is_reused() {
    let engine = Engine::new(InMemoryLedger::new());
    let original = engine.calculate_credits(request(Some(0.95)), "analyst").await.unwrap();
    let mut sparse = grassland_monitoring(100.0);
    sparse.as_object_mut().unwrap().remove("satellite_data");

    let replacement = engine
        .recalculate_credits(&original.id, sparse, "reviewer")
        .await
        .unwrap();
    assert_eq!(replacement.data_quality_score, Some(0.95));
}

#[tokio::test]
async fn estimated_score_is_re_estimated() {
    let engine = Engine::new(InMemoryLedger::new());
    let original = engine.calculate_credits(request(None), "analyst").await.unwrap();
    assert_eq!(original.data_quality_score, Some(0.9));

    let mut sparse = grassland_monitoring(100.0);
    sparse.as_object_mut().unwrap().remove("satellite_data");
    let replacement = engine
        .recalculate_credits(&original.id, sparse, "reviewer")
        .await
        .unwrap();
    assert_eq!(replacement.data_quality_score, Some(0.5));
}

// ── Partial recalculation ────────────────────────────────────────────────────

/// Accepts creates but fails every update.
struct CancelFails {
    inner: InMemoryLedger,
}

#[async_trait]
impl CreditLedger for CancelFails {
    async fn create(&self, record: CreditRecord) -> Result<CreditRecord, LedgerError> {
        self.inner.create(record).await
    }

    async fn get_by_id(&self, credit_id: &str) -> Result<CreditRecord, LedgerError> {
        self.inner.get_by_id(credit_id).await
    }

    async fn update(&self, _record: CreditRecord) -> Result<CreditRecord, LedgerError> {
        Err(LedgerError::Backend("connection reset".to_string()))
    }

    async fn list_by_project(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<CreditRecord>, LedgerError> {
        self.inner.list_by_project(project_id, limit).await
    }
}

#[tokio::test]
async fn failed_cancel_reports_both_ids() {
    let engine = Engine::new(CancelFails {
        inner: InMemoryLedger::new(),
    });
    let original = engine.calculate_credits(request(Some(0.8)), "analyst").await.unwrap();

    let err = engine
        .recalculate_credits(&original.id, grassland_monitoring(150.0), "reviewer")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "PARTIAL_RECALCULATION");
    let CalculationError::PartialRecalculation {
        original_credit_id,
        new_credit_id,
        source,
    } = err
    else {
        panic!("expected PartialRecalculation");
    };
    assert_eq!(original_credit_id, original.id);
    assert!(matches!(source, LedgerError::Backend(_)));

    // Both records are live until reconciled.
    let replacement = engine.ledger().get_by_id(&new_credit_id).await.unwrap();
    assert_eq!(replacement.supersedes.as_deref(), Some(original.id.as_str()));
    let stored = engine.ledger().get_by_id(&original.id).await.unwrap();
    assert_eq!(stored.status, CreditStatus::Calculated);
}
