use scribe_ledger::LedgerError;

use crate::types::ValidationIssue;

/// Errors produced by validation, calculation and the engine workflow.
///
/// Validation and calculation failures never write to the ledger. Only the
/// `Ledger` and `PartialRecalculation` variants can follow a write.
#[derive(Debug, thiserror::Error)]
pub enum CalculationError {
    /// The request failed a structural check.
    #[error("invalid request field '{field}': {message}")]
    InvalidRequest {
        field: String,
        message: String,
        /// Human-readable description of the accepted range, if any.
        expected: Option<String>,
    },

    #[error("unsupported methodology: {code}")]
    UnsupportedMethodology { code: String },

    /// Monitoring or baseline data does not have the shape the methodology
    /// requires.
    #[error("{methodology} validation failed on '{field}': {message}")]
    MethodologyValidationFailed {
        methodology: String,
        field: String,
        message: String,
    },

    /// The inputs passed validation but the arithmetic could not complete.
    #[error("{methodology} calculation failed on '{field}': {message}")]
    CalculationFailed {
        methodology: String,
        field: String,
        message: String,
    },

    #[error("credit {credit_id} cannot be recalculated in status {status}")]
    IllegalStateTransition { credit_id: String, status: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The replacement record was created but the original could not be
    /// cancelled. Both records are live until reconciled.
    #[error(
        "recalculation of {original_credit_id} created {new_credit_id} \
         but failed to cancel the original: {source}"
    )]
    PartialRecalculation {
        original_credit_id: String,
        new_credit_id: String,
        #[source]
        source: LedgerError,
    },
}

impl CalculationError {
    pub(crate) fn invalid(
        field: impl Into<String>,
        message: impl Into<String>,
        expected: Option<&str>,
    ) -> Self {
        CalculationError::InvalidRequest {
            field: field.into(),
            message: message.into(),
            expected: expected.map(str::to_string),
        }
    }

    pub(crate) fn methodology_data(
        methodology: &str,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CalculationError::MethodologyValidationFailed {
            methodology: methodology.to_string(),
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn failed(
        methodology: &str,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CalculationError::CalculationFailed {
            methodology: methodology.to_string(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable API error code.
    pub fn code(&self) -> &'static str {
        match self {
            CalculationError::InvalidRequest { .. } => "VALIDATION_ERROR",
            CalculationError::UnsupportedMethodology { .. } => "UNSUPPORTED_METHODOLOGY",
            CalculationError::MethodologyValidationFailed { .. } => "METHODOLOGY_VALIDATION_ERROR",
            CalculationError::CalculationFailed { .. } => "CALCULATION_FAILED",
            CalculationError::IllegalStateTransition { .. } => "ILLEGAL_STATE_TRANSITION",
            CalculationError::Ledger(_) => "LEDGER_ERROR",
            CalculationError::PartialRecalculation { .. } => "PARTIAL_RECALCULATION",
        }
    }

    /// The request field the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            CalculationError::InvalidRequest { field, .. }
            | CalculationError::MethodologyValidationFailed { field, .. }
            | CalculationError::CalculationFailed { field, .. } => Some(field),
            CalculationError::UnsupportedMethodology { .. } => Some("methodology_code"),
            CalculationError::IllegalStateTransition { .. }
            | CalculationError::Ledger(_)
            | CalculationError::PartialRecalculation { .. } => None,
        }
    }

    pub fn to_issue(&self) -> ValidationIssue {
        let message = match self {
            CalculationError::InvalidRequest {
                message,
                expected: Some(expected),
                ..
            } => format!("{} (expected {})", message, expected),
            CalculationError::InvalidRequest { message, .. }
            | CalculationError::MethodologyValidationFailed { message, .. }
            | CalculationError::CalculationFailed { message, .. } => message.clone(),
            other => other.to_string(),
        };
        ValidationIssue::new(self.field().unwrap_or(""), message, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            CalculationError::invalid("vintage_year", "out of range", None).code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            CalculationError::UnsupportedMethodology {
                code: "VM9999".into()
            }
            .code(),
            "UNSUPPORTED_METHODOLOGY"
        );
        assert_eq!(
            CalculationError::Ledger(LedgerError::Backend("down".into())).code(),
            "LEDGER_ERROR"
        );
    }

    #[test]
    fn issue_includes_expected_range() {
        let err = CalculationError::invalid("data_quality_score", "out of range", Some("[0, 1]"));
        let issue = err.to_issue();
        assert_eq!(issue.field, "data_quality_score");
        assert_eq!(issue.message, "out of range (expected [0, 1])");
        assert_eq!(issue.code, "VALIDATION_ERROR");
    }

    #[test]
    fn unsupported_methodology_points_at_code_field() {
        let err = CalculationError::UnsupportedMethodology {
            code: "VM9999".into(),
        };
        assert_eq!(err.field(), Some("methodology_code"));
        assert_eq!(err.to_issue().message, "unsupported methodology: VM9999");
    }

    #[test]
    fn partial_recalculation_keeps_ledger_source() {
        let err = CalculationError::PartialRecalculation {
            original_credit_id: "old".into(),
            new_credit_id: "new".into(),
            source: LedgerError::Backend("timeout".into()),
        };
        assert!(err.to_string().contains("old"));
        assert!(err.to_string().contains("new"));
        assert!(err.source().is_some());
        assert_eq!(err.field(), None);
    }
}
