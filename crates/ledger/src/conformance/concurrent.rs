use std::future::Future;
use std::sync::Arc;

use super::{make_record, CheckArea, LedgerCheck};
use crate::{CreditLedger, CreditStatus, LedgerError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<L, F, Fut>(factory: &F) -> Vec<LedgerCheck>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    vec![
        LedgerCheck::new(
            CheckArea::Concurrency,
            "concurrent_updates_exactly_one_wins",
            concurrent_updates_exactly_one_wins(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Concurrency,
            "concurrent_creates_exactly_one_wins",
            concurrent_creates_exactly_one_wins(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Concurrency,
            "concurrent_creates_different_ids_all_succeed",
            concurrent_creates_different_ids_all_succeed(factory).await,
        ),
    ]
}

// ── Concurrent update: exactly one wins ─────────────────────────────────────

/// N tasks each try to move the same record from version 0. Exactly one
/// update succeeds; the rest must get ConcurrentConflict.
async fn concurrent_updates_exactly_one_wins<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = Arc::new(factory().await);
    let created = ledger
        .create(make_record("credit-1", "project-a"))
        .await
        .map_err(|e| format!("create: {e}"))?;

    let mut handles = Vec::new();
    for i in 0..N {
        let l = ledger.clone();
        let mut record = created.clone();
        // Half try to verify, half try to cancel; only one write may land.
        record.status = if i % 2 == 0 {
            CreditStatus::Verified
        } else {
            CreditStatus::Cancelled
        };
        handles.push(tokio::spawn(async move {
            match l.update(record).await {
                Ok(_) => Ok(true),
                Err(LedgerError::ConcurrentConflict { .. }) => Ok(false),
                Err(e) => Err(e),
            }
        }));
    }

    let mut winners = 0usize;
    for handle in handles {
        let won = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: LedgerError| format!("ledger error: {e}"))?;
        if won {
            winners += 1;
        }
    }
    if winners != 1 {
        return Err(format!("expected exactly 1 winner, got {winners}"));
    }

    let stored = ledger
        .get_by_id("credit-1")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if stored.version != 1 {
        return Err(format!("expected version 1, got {}", stored.version));
    }
    Ok(())
}

// ── Concurrent create with one id: exactly one wins ──────────────────────────

async fn concurrent_creates_exactly_one_wins<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = Arc::new(factory().await);
    let mut handles = Vec::new();
    for i in 0..N {
        let l = ledger.clone();
        handles.push(tokio::spawn(async move {
            let record = make_record("credit-1", &format!("project-{i}"));
            match l.create(record).await {
                Ok(_) => Ok(true),
                Err(LedgerError::AlreadyExists { .. }) => Ok(false),
                Err(e) => Err(e),
            }
        }));
    }

    let mut winners = 0usize;
    for handle in handles {
        let won = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: LedgerError| format!("ledger error: {e}"))?;
        if won {
            winners += 1;
        }
    }
    if winners != 1 {
        return Err(format!("expected exactly 1 winner, got {winners}"));
    }
    Ok(())
}

// ── Concurrent creates with distinct ids never interfere ─────────────────────

async fn concurrent_creates_different_ids_all_succeed<L, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = Arc::new(factory().await);
    let mut handles = Vec::new();
    for i in 0..N {
        let l = ledger.clone();
        handles.push(tokio::spawn(async move {
            l.create(make_record(&format!("credit-{i}"), "project-a"))
                .await
        }));
    }
    for handle in handles {
        handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e| format!("create: {e}"))?;
    }
    let records = ledger
        .list_by_project("project-a", 0)
        .await
        .map_err(|e| format!("list: {e}"))?;
    if records.len() != N {
        return Err(format!("expected {N} records, got {}", records.len()));
    }
    Ok(())
}
