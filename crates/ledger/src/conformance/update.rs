use std::future::Future;

use super::{create_in_status, make_record, CheckArea, LedgerCheck};
use crate::{CreditLedger, CreditStatus, LedgerError};

pub(super) async fn run_update_tests<L, F, Fut>(factory: &F) -> Vec<LedgerCheck>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let mut results = vec![
        LedgerCheck::new(
            CheckArea::Update,
            "update_increments_version",
            update_increments_version(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Update,
            "stale_version_returns_conflict",
            stale_version_returns_conflict(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Update,
            "full_lifecycle_walk",
            full_lifecycle_walk(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Update,
            "same_status_update_allowed",
            same_status_update_allowed(factory).await,
        ),
    ];

    for from in CreditStatus::ALL {
        for to in CreditStatus::ALL {
            if from == to {
                continue;
            }
            let name = format!("transition_{}_to_{}", from, to);
            results.push(LedgerCheck::new(
                CheckArea::Update,
                &name,
                transition_matches_lifecycle(factory, from, to).await,
            ));
        }
    }

    results
}

// ── 1. Each successful update bumps the version by one ───────────────────────

async fn update_increments_version<L, F, Fut>(factory: &F) -> Result<(), String>
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
    let mut verified = created.clone();
    verified.status = CreditStatus::Verified;
    let stored = ledger
        .update(verified)
        .await
        .map_err(|e| format!("update: {e}"))?;
    if stored.version != 1 {
        return Err(format!("expected version 1 after update, got {}", stored.version));
    }
    let reread = ledger
        .get_by_id("credit-1")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if reread.version != 1 || reread.status != CreditStatus::Verified {
        return Err(format!(
            "expected verified@1, got {}@{}",
            reread.status, reread.version
        ));
    }
    Ok(())
}

// ── 2. Writing with an old version is rejected ───────────────────────────────

async fn stale_version_returns_conflict<L, F, Fut>(factory: &F) -> Result<(), String>
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

    let mut first = created.clone();
    first.status = CreditStatus::Verified;
    ledger
        .update(first)
        .await
        .map_err(|e| format!("first update: {e}"))?;

    // Second writer still holds version 0.
    let mut second = created;
    second.status = CreditStatus::Cancelled;
    match ledger.update(second).await {
        Err(LedgerError::ConcurrentConflict {
            credit_id,
            expected_version,
        }) => {
            if credit_id != "credit-1" || expected_version != 0 {
                return Err(format!(
                    "conflict fields wrong: {} / {}",
                    credit_id, expected_version
                ));
            }
        }
        other => return Err(format!("expected ConcurrentConflict, got {:?}", other)),
    }

    let stored = ledger
        .get_by_id("credit-1")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if stored.status != CreditStatus::Verified {
        return Err(format!("losing writer changed status to {}", stored.status));
    }
    Ok(())
}

// ── 3. calculated -> verified -> minting -> minted -> retired ────────────────

async fn full_lifecycle_walk<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    let retired = create_in_status(
        &ledger,
        make_record("credit-1", "project-a"),
        CreditStatus::Retired,
    )
    .await?;
    if retired.status != CreditStatus::Retired || retired.version != 4 {
        return Err(format!(
            "expected retired@4, got {}@{}",
            retired.status, retired.version
        ));
    }
    Ok(())
}

// ── 4. Updating other fields without moving status is fine ───────────────────

async fn same_status_update_allowed<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    let minted = create_in_status(
        &ledger,
        make_record("credit-1", "project-a"),
        CreditStatus::Minted,
    )
    .await?;
    let mut issued = minted;
    issued.issued_tons = Some(80.0);
    let stored = ledger
        .update(issued)
        .await
        .map_err(|e| format!("update: {e}"))?;
    if stored.issued_tons != Some(80.0) {
        return Err(format!("issued_tons not stored: {:?}", stored.issued_tons));
    }
    Ok(())
}

// ── 5. Every (from, to) pair obeys the lifecycle table ───────────────────────

async fn transition_matches_lifecycle<L, F, Fut>(
    factory: &F,
    from: CreditStatus,
    to: CreditStatus,
) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    let mut record = create_in_status(&ledger, make_record("credit-1", "project-a"), from).await?;
    record.status = to;
    let result = ledger.update(record).await;

    match (from.can_transition_to(to), result) {
        (true, Ok(stored)) if stored.status == to => Ok(()),
        (true, other) => Err(format!("legal {from} -> {to} rejected: {:?}", other)),
        (false, Err(LedgerError::IllegalTransition { from: f, to: t, .. })) => {
            if f != from.as_str() || t != to.as_str() {
                return Err(format!("IllegalTransition fields wrong: {f} -> {t}"));
            }
            let stored = ledger
                .get_by_id("credit-1")
                .await
                .map_err(|e| format!("get: {e}"))?;
            if stored.status != from {
                return Err(format!("rejected update still wrote {}", stored.status));
            }
            Ok(())
        }
        (false, other) => Err(format!(
            "illegal {from} -> {to} expected IllegalTransition, got {:?}",
            other
        )),
    }
}
