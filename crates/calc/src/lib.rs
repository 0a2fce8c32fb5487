//! Carbon credit calculation engine.
//!
//! Turns monitoring and baseline measurements into credit records using one
//! of three methodologies:
//!
//! | Code | Methodology |
//! |---|---|
//! | `VM0007` | Improved Forest Management |
//! | `VM0015` | Avoided Grassland Conversion |
//! | `VM0033` | Soil Carbon Sequestration |
//!
//! The [`Engine`] validates a [`CalculationRequest`], dispatches to the
//! [`Methodology`] registered for its code, and persists the result through
//! a [`scribe_ledger::CreditLedger`]. Recalculation creates a replacement
//! record and cancels the original.
//!
//! Everything except the ledger calls is synchronous and side-effect free.

pub mod config;
pub mod engine;
pub mod error;
pub mod inputs;
pub mod methodology;
pub mod numeric;
pub mod registry;
pub mod types;
pub mod validator;

pub use config::EngineConfig;
pub use engine::{Engine, QualitySource};
pub use error::CalculationError;
pub use methodology::{BufferTiers, Methodology};
pub use registry::MethodologyRegistry;
pub use types::{
    CalculationPeriod, CalculationRequest, CalculationResult, CalculationStep, MethodologyMetadata,
    UncertaintyFactor, ValidationIssue, ValidationResults,
};
pub use validator::{QualityBreakdown, Validator};
