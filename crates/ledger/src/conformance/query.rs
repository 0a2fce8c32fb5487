use std::future::Future;

use super::{make_record, CheckArea, LedgerCheck};
use crate::{CreditLedger, CreditStatus};

pub(super) async fn run_query_tests<L, F, Fut>(factory: &F) -> Vec<LedgerCheck>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    vec![
        LedgerCheck::new(
            CheckArea::Query,
            "list_filters_by_project",
            list_filters_by_project(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Query,
            "list_newest_first",
            list_newest_first(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Query,
            "list_respects_limit",
            list_respects_limit(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Query,
            "list_limit_zero_is_unlimited",
            list_limit_zero_is_unlimited(factory).await,
        ),
        LedgerCheck::new(
            CheckArea::Query,
            "list_includes_cancelled_records",
            list_includes_cancelled_records(factory).await,
        ),
    ]
}

async fn seed<L: CreditLedger>(ledger: &L, ids: &[(&str, &str)]) -> Result<(), String> {
    for (id, project) in ids {
        ledger
            .create(make_record(id, project))
            .await
            .map_err(|e| format!("create {id}: {e}"))?;
    }
    Ok(())
}

fn ids(records: &[crate::CreditRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

async fn list_filters_by_project<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    seed(&ledger, &[("a-1", "project-a"), ("b-1", "project-b"), ("a-2", "project-a")]).await?;
    let records = ledger
        .list_by_project("project-a", 0)
        .await
        .map_err(|e| format!("list: {e}"))?;
    if records.iter().any(|r| r.project_id != "project-a") {
        return Err(format!("foreign project leaked: {:?}", ids(&records)));
    }
    if records.len() != 2 {
        return Err(format!("expected 2 records, got {:?}", ids(&records)));
    }
    Ok(())
}

async fn list_newest_first<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    seed(&ledger, &[("first", "p"), ("second", "p"), ("third", "p")]).await?;
    let records = ledger
        .list_by_project("p", 0)
        .await
        .map_err(|e| format!("list: {e}"))?;
    if ids(&records) != ["third", "second", "first"] {
        return Err(format!("expected newest first, got {:?}", ids(&records)));
    }
    Ok(())
}

async fn list_respects_limit<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    seed(&ledger, &[("first", "p"), ("second", "p"), ("third", "p")]).await?;
    let records = ledger
        .list_by_project("p", 2)
        .await
        .map_err(|e| format!("list: {e}"))?;
    if ids(&records) != ["third", "second"] {
        return Err(format!("expected [third, second], got {:?}", ids(&records)));
    }
    Ok(())
}

async fn list_limit_zero_is_unlimited<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    let many: Vec<(String, &str)> = (0..25).map(|i| (format!("credit-{i}"), "p")).collect();
    let refs: Vec<(&str, &str)> = many.iter().map(|(id, p)| (id.as_str(), *p)).collect();
    seed(&ledger, &refs).await?;
    let records = ledger
        .list_by_project("p", 0)
        .await
        .map_err(|e| format!("list: {e}"))?;
    if records.len() != 25 {
        return Err(format!("expected 25 records, got {}", records.len()));
    }
    Ok(())
}

async fn list_includes_cancelled_records<L, F, Fut>(factory: &F) -> Result<(), String>
where
    L: CreditLedger,
    F: Fn() -> Fut,
    Fut: Future<Output = L>,
{
    let ledger = factory().await;
    seed(&ledger, &[("old", "p")]).await?;
    let mut old = ledger
        .get_by_id("old")
        .await
        .map_err(|e| format!("get: {e}"))?;
    old.status = CreditStatus::Cancelled;
    ledger
        .update(old)
        .await
        .map_err(|e| format!("cancel: {e}"))?;
    let mut replacement = make_record("new", "p");
    replacement.supersedes = Some("old".to_string());
    ledger
        .create(replacement)
        .await
        .map_err(|e| format!("create: {e}"))?;

    let records = ledger
        .list_by_project("p", 0)
        .await
        .map_err(|e| format!("list: {e}"))?;
    let statuses: Vec<_> = records.iter().map(|r| (r.id.as_str(), r.status)).collect();
    if statuses != [("new", CreditStatus::Calculated), ("old", CreditStatus::Cancelled)] {
        return Err(format!("unexpected history: {:?}", statuses));
    }
    Ok(())
}
