use std::future::Future;

use super::{make_record, CheckArea, LedgerCheck};
use crate::{CreditLedger, LedgerError};

pub(super) async fn run_error_tests<L, F, Fut>(factory: &F) -> Vec<LedgerCheck>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    vec![
        LedgerCheck::new(
            CheckArea::Errors,
            "get_by_id_nonexistent",
            get_by_id_nonexistent(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Errors,
            "not_found_has_correct_field",
            not_found_has_correct_field(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Errors,
            "update_nonexistent",
            update_nonexistent(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Errors,
            "list_by_project_empty_for_unknown_project",
            list_by_project_empty_for_unknown_project(factory).await,
        ),
    ]
}

// ── 1. get_by_id on empty ledger returns NotFound ────────────────────────────

async fn get_by_id_nonexistent<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    match ledger.get_by_id("credit-999").await {
        Err(LedgerError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound, got {:?}", other)),
    }
}

// ── 2. NotFound carries the requested id ─────────────────────────────────────

async fn not_found_has_correct_field<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    match ledger.get_by_id("credit-42").await {
        Err(LedgerError::NotFound { credit_id }) => {
            if credit_id != "credit-42" {
                return Err(format!(
                    "expected credit_id \"credit-42\", got \"{}\"",
                    credit_id
                ));
            }
            Ok(())
        }
        other => Err(format!("expected NotFound, got {:?}", other)),
    }
}

// ── 3. update of an unknown record returns NotFound ──────────────────────────

async fn update_nonexistent<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    match ledger.update(make_record("ghost", "project-a")).await {
        Err(LedgerError::NotFound { credit_id }) if credit_id == "ghost" => Ok(()),
        other => Err(format!("expected NotFound(ghost), got {:?}", other)),
    }
}

// ── 4. Listing an unknown project is empty, not an error ─────────────────────

async fn list_by_project_empty_for_unknown_project<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    ledger
        .create(make_record("credit-1", "project-a"))
        .await
        .map_err(|e| format!("create: {e}"))?;
    let records = ledger
        .list_by_project("project-zzz", 0)
        .await
        .map_err(|e| format!("list: {e}"))?;
    if !records.is_empty() {
        return Err(format!("expected empty list, got {} records", records.len()));
    }
    Ok(())
}
