use serde::{Deserialize, Serialize};

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    /// Stable machine-readable code, e.g. `VALIDATION_ERROR`.
    pub code: String,
}

impl ValidationIssue {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: code.into(),
        }
    }
}

/// Aggregated outcome of a validation pass.
///
/// Structural checks stop at the first error, so `errors` holds at most one
/// entry for them. The data-quality assessment reports every finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResults {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub missing_fields: Vec<String>,
    pub quality_score: f64,
}

impl ValidationResults {
    pub fn valid(quality_score: f64) -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            missing_fields: Vec::new(),
            quality_score,
        }
    }

    pub fn invalid(issue: ValidationIssue) -> Self {
        Self {
            is_valid: false,
            errors: vec![issue],
            warnings: Vec::new(),
            missing_fields: Vec::new(),
            quality_score: 0.0,
        }
    }

    /// Record an error and mark the results invalid.
    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.is_valid = false;
        self.errors.push(issue);
    }

    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_error_invalidates() {
        let mut results = ValidationResults::valid(0.9);
        results.push_warning(ValidationIssue::new("a", "meh", "W"));
        assert!(results.is_valid);
        results.push_error(ValidationIssue::new("b", "bad", "E"));
        assert!(!results.is_valid);
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.warnings.len(), 1);
    }

    #[test]
    fn invalid_carries_issue_and_zero_score() {
        let issue = ValidationIssue::new("project_id", "empty", "VALIDATION_ERROR");
        let results = ValidationResults::invalid(issue);
        assert!(!results.is_valid);
        assert_eq!(results.errors[0].field, "project_id");
        assert_eq!(results.quality_score, 0.0);
    }
}
