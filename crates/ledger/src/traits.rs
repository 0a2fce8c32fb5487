use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LedgerError;
use crate::record::CreditRecord;

/// The storage trait for carbon credit ledgers.
///
/// A `CreditLedger` implementation provides durable storage for
/// [`CreditRecord`]s. The calculation engine needs exactly four
/// operations; verification, minting and retirement workflows drive the
/// remaining status transitions through `update`.
///
/// ## Version validation
///
/// `update` performs an optimistic concurrency check: the stored record's
/// `version` must equal the incoming record's `version`, otherwise the
/// method returns `Err(LedgerError::ConcurrentConflict { .. })`. On success
/// the stored version is incremented and the stored record is returned.
///
/// ## Lifecycle enforcement
///
/// When `update` changes `status`, the edge must be allowed by
/// [`CreditStatus::can_transition_to`](crate::CreditStatus::can_transition_to);
/// otherwise the method returns `Err(LedgerError::IllegalTransition { .. })`
/// and nothing is written.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so a ledger can be
/// shared across async tasks.
#[async_trait]
pub trait CreditLedger: Send + Sync + 'static {
    /// Insert a new record.
    ///
    /// Returns `Err(LedgerError::AlreadyExists)` if the id is taken.
    async fn create(&self, record: CreditRecord) -> Result<CreditRecord, LedgerError>;

    /// Read a record by id.
    ///
    /// Returns `Err(LedgerError::NotFound)` if no such record exists.
    async fn get_by_id(&self, credit_id: &str) -> Result<CreditRecord, LedgerError>;

    /// Apply a version-validated update to an existing record.
    ///
    /// Returns the stored record (with its new version) on success.
    async fn update(&self, record: CreditRecord) -> Result<CreditRecord, LedgerError>;

    /// List a project's records, newest first.
    ///
    /// - `limit`: maximum number of results (0 = no limit)
    async fn list_by_project(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<CreditRecord>, LedgerError>;
}

#[async_trait]
impl<L: CreditLedger> CreditLedger for Arc<L> {
    async fn create(&self, record: CreditRecord) -> Result<CreditRecord, LedgerError> {
        (**self).create(record).await
    }

    async fn get_by_id(&self, credit_id: &str) -> Result<CreditRecord, LedgerError> {
        (**self).get_by_id(credit_id).await
    }

    async fn update(&self, record: CreditRecord) -> Result<CreditRecord, LedgerError> {
        (**self).update(record).await
    }

    async fn list_by_project(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<CreditRecord>, LedgerError> {
        (**self).list_by_project(project_id, limit).await
    }
}
