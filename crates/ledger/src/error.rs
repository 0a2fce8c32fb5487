/// All errors that can be returned by a CreditLedger implementation.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No record with the given id exists.
    #[error("credit not found: {credit_id}")]
    NotFound { credit_id: String },

    /// A record with this id already exists; `create` never overwrites.
    #[error("credit already exists: {credit_id}")]
    AlreadyExists { credit_id: String },

    /// Optimistic concurrency control conflict: the stored record's version
    /// no longer matches the version the caller read.
    #[error("concurrent conflict on credit {credit_id}: expected version {expected_version}")]
    ConcurrentConflict {
        credit_id: String,
        expected_version: i64,
    },

    /// The update would move the record along an edge the credit
    /// lifecycle does not allow.
    #[error("illegal status transition for credit {credit_id}: {from} -> {to}")]
    IllegalTransition {
        credit_id: String,
        from: String,
        to: String,
    },

    /// A backend-specific storage error (DB connection, serialization, etc.).
    #[error("ledger backend error: {0}")]
    Backend(String),
}
