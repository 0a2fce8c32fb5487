use std::future::Future;

use super::{make_record, CheckArea, LedgerCheck};
use crate::{CreditLedger, CreditStatus, LedgerError};

pub(super) async fn run_create_tests<L, F, Fut>(factory: &F) -> Vec<LedgerCheck>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    vec![
        LedgerCheck::new(
            CheckArea::Create,
            "create_then_get_round_trips",
            create_then_get_round_trips(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Create,
            "create_preserves_version_0",
            create_preserves_version_0(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Create,
            "duplicate_create_returns_already_exists",
            duplicate_create_returns_already_exists(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Create,
            "duplicate_create_does_not_overwrite",
            duplicate_create_does_not_overwrite(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Create,
            "snapshots_survive_storage",
            snapshots_survive_storage(factory).await,
        ),
    ]
}

// ── 1. A created record reads back field-for-field ───────────────────────────

async fn create_then_get_round_trips<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    let record = make_record("credit-1", "project-a");
    ledger
        .create(record.clone())
        .await
        .map_err(|e| format!("create: {e}"))?;
    let stored = ledger
        .get_by_id("credit-1")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if stored != record {
        return Err(format!("stored record differs: {:?}", stored));
    }
    Ok(())
}

// ── 2. Create does not bump the version ──────────────────────────────────────

async fn create_preserves_version_0<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    let created = ledger
        .create(make_record("credit-1", "project-a"))
        .await
        .map_err(|e| format!("create: {e}"))?;
    if created.version != 0 {
        return Err(format!("expected version 0, got {}", created.version));
    }
    if created.status != CreditStatus::Calculated {
        return Err(format!("expected calculated, got {}", created.status));
    }
    Ok(())
}

// ── 3. Second create with same id fails ──────────────────────────────────────

async fn duplicate_create_returns_already_exists<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    ledger
        .create(make_record("credit-1", "project-a"))
        .await
        .map_err(|e| format!("first create: {e}"))?;
    match ledger.create(make_record("credit-1", "project-b")).await {
        Err(LedgerError::AlreadyExists { credit_id }) if credit_id == "credit-1" => Ok(()),
        other => Err(format!("expected AlreadyExists(credit-1), got {:?}", other)),
    }
}

// ── 4. ...and leaves the original in place ───────────────────────────────────

async fn duplicate_create_does_not_overwrite<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    ledger
        .create(make_record("credit-1", "project-a"))
        .await
        .map_err(|e| format!("first create: {e}"))?;
    let _ = ledger.create(make_record("credit-1", "project-b")).await;
    let stored = ledger
        .get_by_id("credit-1")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if stored.project_id != "project-a" {
        return Err(format!(
            "duplicate create overwrote project_id: {}",
            stored.project_id
        ));
    }
    Ok(())
}

// ── 5. JSON snapshots are stored verbatim ────────────────────────────────────

async fn snapshots_survive_storage<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    let mut record = make_record("credit-1", "project-a");
    record.calculation_steps = serde_json::json!([
        {"step_number": 1, "name": "baseline", "outputs": {"tons": 29600.0}},
        {"step_number": 2, "name": "project", "outputs": {"tons": 33500.0}}
    ]);
    record.uncertainty_factors = serde_json::json!({"sampling_error": 0.05});
    record.supersedes = Some("credit-0".to_string());
    ledger
        .create(record.clone())
        .await
        .map_err(|e| format!("create: {e}"))?;
    let stored = ledger
        .get_by_id("credit-1")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if stored.calculation_steps != record.calculation_steps {
        return Err("calculation_steps changed in storage".to_string());
    }
    if stored.uncertainty_factors != record.uncertainty_factors {
        return Err("uncertainty_factors changed in storage".to_string());
    }
    if stored.supersedes.as_deref() != Some("credit-0") {
        return Err(format!("supersedes lost: {:?}", stored.supersedes));
    }
    Ok(())
}
