//! Validation outcomes and the aggregated report

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Status of one validator run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    Warning,
    Failed,
}

/// A named sub-check inside a validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
}

impl ValidationCheck {
    pub fn new(name: &str, passed: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed,
            message: message.into(),
        }
    }
}

/// Result of one validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Validator label, e.g. `tool:kubectl`
    pub validator: String,
    pub status: ValidationStatus,
    pub message: Option<String>,
    #[serde(default)]
    pub checks: Vec<ValidationCheck>,
    #[serde(default)]
    pub details: HashMap<String, Value>,
}

impl ValidationOutcome {
    pub fn new(validator: &str, status: ValidationStatus) -> Self {
        Self {
            validator: validator.to_string(),
            status,
            message: None,
            checks: Vec::new(),
            details: HashMap::new(),
        }
    }

    pub fn passed(validator: &str, message: impl Into<String>) -> Self {
        Self::new(validator, ValidationStatus::Passed).with_message(message)
    }

    pub fn warning(validator: &str, message: impl Into<String>) -> Self {
        Self::new(validator, ValidationStatus::Warning).with_message(message)
    }

    pub fn failed(validator: &str, message: impl Into<String>) -> Self {
        Self::new(validator, ValidationStatus::Failed).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }

    /// Record a check. A failed check downgrades the status to `severity`
    /// unless the outcome is already worse.
    pub fn record(&mut self, check: ValidationCheck, severity: ValidationStatus) {
        if !check.passed {
            self.escalate(severity);
        }
        self.checks.push(check);
    }

    /// Move to a worse status; never improves it
    pub fn escalate(&mut self, status: ValidationStatus) {
        let rank = |s: ValidationStatus| match s {
            ValidationStatus::Passed => 0,
            ValidationStatus::Warning => 1,
            ValidationStatus::Failed => 2,
        };
        if rank(status) > rank(self.status) {
            self.status = status;
        }
    }
}

/// Aggregate of all validators run before execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub all_passed: bool,
    pub has_warnings: bool,
    pub results: Vec<ValidationOutcome>,
    pub summary: String,
}

impl ValidationReport {
    pub fn from_outcomes(results: Vec<ValidationOutcome>) -> Self {
        let failed = results
            .iter()
            .filter(|r| r.status == ValidationStatus::Failed)
            .count();
        let warnings = results
            .iter()
            .filter(|r| r.status == ValidationStatus::Warning)
            .count();

        let summary = if failed > 0 {
            format!("{} prerequisites failed validation", failed)
        } else if warnings > 0 {
            format!("Prerequisites passed with {} warnings", warnings)
        } else {
            "All prerequisites validated successfully".to_string()
        };

        Self {
            all_passed: failed == 0,
            has_warnings: warnings > 0,
            results,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prefers_failures() {
        let report = ValidationReport::from_outcomes(vec![
            ValidationOutcome::passed("tool:sh", "ok"),
            ValidationOutcome::warning("fs", "missing"),
            ValidationOutcome::failed("tool:kubectl", "not found"),
        ]);
        assert!(!report.all_passed);
        assert!(report.has_warnings);
        assert_eq!(report.summary, "1 prerequisites failed validation");
    }

    #[test]
    fn test_summary_warnings_only() {
        let report = ValidationReport::from_outcomes(vec![ValidationOutcome::warning("fs", "x")]);
        assert!(report.all_passed);
        assert_eq!(report.summary, "Prerequisites passed with 1 warnings");
    }

    #[test]
    fn test_empty_report_passes() {
        let report = ValidationReport::from_outcomes(Vec::new());
        assert!(report.all_passed);
        assert!(!report.has_warnings);
        assert_eq!(report.summary, "All prerequisites validated successfully");
    }

    #[test]
    fn test_escalate_never_improves() {
        let mut outcome = ValidationOutcome::new("k8s", ValidationStatus::Failed);
        outcome.record(
            ValidationCheck::new("namespace_access", false, "no"),
            ValidationStatus::Warning,
        );
        assert_eq!(outcome.status, ValidationStatus::Failed);
        assert_eq!(outcome.checks.len(), 1);
    }
}
