use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::LedgerError;
use crate::record::CreditRecord;
use crate::traits::CreditLedger;

/// A process-local ledger backed by a mutex-guarded map.
///
/// Used by the CLI and by tests. It honours the full `CreditLedger`
/// contract (version checks, lifecycle enforcement, newest-first listing)
/// so it passes the [`conformance`](crate::conformance) suite.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<String, CreditRecord>,
    /// Record ids in insertion order.
    order: Vec<String>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored, across all projects.
    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, LedgerError> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::Backend("in-memory ledger lock poisoned".to_string()))
    }
}

#[async_trait]
impl CreditLedger for InMemoryLedger {
    async fn create(&self, record: CreditRecord) -> Result<CreditRecord, LedgerError> {
        let mut inner = self.lock()?;
        if inner.records.contains_key(&record.id) {
            return Err(LedgerError::AlreadyExists {
                credit_id: record.id,
            });
        }
        inner.order.push(record.id.clone());
        inner.records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, credit_id: &str) -> Result<CreditRecord, LedgerError> {
        let inner = self.lock()?;
        inner
            .records
            .get(credit_id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound {
                credit_id: credit_id.to_string(),
            })
    }

    async fn update(&self, mut record: CreditRecord) -> Result<CreditRecord, LedgerError> {
        let mut inner = self.lock()?;
        let stored = inner
            .records
            .get_mut(&record.id)
            .ok_or_else(|| LedgerError::NotFound {
                credit_id: record.id.clone(),
            })?;

        if stored.version != record.version {
            return Err(LedgerError::ConcurrentConflict {
                credit_id: record.id,
                expected_version: record.version,
            });
        }
        if stored.status != record.status && !stored.status.can_transition_to(record.status) {
            return Err(LedgerError::IllegalTransition {
                credit_id: record.id,
                from: stored.status.to_string(),
                to: record.status.to_string(),
            });
        }

        record.version += 1;
        *stored = record.clone();
        Ok(record)
    }

    async fn list_by_project(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<CreditRecord>, LedgerError> {
        let inner = self.lock()?;
        let matching = inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.records.get(id))
            .filter(|r| r.project_id == project_id)
            .cloned();
        Ok(if limit == 0 {
            matching.collect()
        } else {
            matching.take(limit).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::run_conformance_suite;
    use crate::CreditStatus;

    #[tokio::test]
    async fn in_memory_ledger_passes_conformance() {
        let report = run_conformance_suite(|| async { InMemoryLedger::new() }).await;
        assert!(report.is_conformant(), "{report}");
        assert!(report.total() > 0);
    }

    #[tokio::test]
    async fn len_tracks_creates() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.is_empty());
        let mut record = crate::conformance::make_record("c-1", "p-1");
        ledger.create(record.clone()).await.unwrap();
        record.id = "c-2".to_string();
        ledger.create(record).await.unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn rejected_update_leaves_record_untouched() {
        let ledger = InMemoryLedger::new();
        let record = crate::conformance::make_record("c-1", "p-1");
        ledger.create(record.clone()).await.unwrap();

        let mut minted = record.clone();
        minted.status = CreditStatus::Minted;
        minted.buffered_tons = 1.0;
        assert!(ledger.update(minted).await.is_err());

        let stored = ledger.get_by_id("c-1").await.unwrap();
        assert_eq!(stored, record);
    }
}
