//! Credit ledger boundary for the carbon credit calculation engine.
//!
//! The ledger is the durable store of [`CreditRecord`]s. The engine only
//! needs four operations from it (see [`CreditLedger`]); everything else
//! about persistence belongs to the backend.

pub mod conformance;
mod error;
mod memory;
mod record;
mod traits;

pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use record::{CreditRecord, CreditStatus, ParseStatusError};
pub use traits::CreditLedger;
