use std::fmt;
use thiserror::Error;

/// A single violated constraint on a request field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Error taxonomy of the valuation core.
///
/// `Validation` and `InsufficientData` are expected operational conditions:
/// the caller reports field problems back to the user, or moves on to a
/// lower-fidelity data-source strategy. `InvariantViolation` means the
/// adjustment/confidence logic produced an impossible result and must halt
/// the computation rather than return a plausible-looking number.
#[derive(Debug, Error)]
pub enum ValuationError {
    #[error("request validation failed: {}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("no quality market listings after filtering ({candidates} candidates in)")]
    InsufficientData { candidates: usize },

    #[error("valuation invariant violated: {0}")]
    InvariantViolation(String),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_issue() {
        let err = ValuationError::Validation(vec![
            ValidationIssue {
                field: "vin",
                message: "must be exactly 17 characters".into(),
            },
            ValidationIssue {
                field: "zipCode",
                message: "must be a 5-digit ZIP".into(),
            },
        ]);
        let text = err.to_string();
        assert!(text.contains("vin"));
        assert!(text.contains("zipCode"));
    }
}
