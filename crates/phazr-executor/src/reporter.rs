//! Reporting seam
//!
//! The engine emits notifications here and never inspects what a reporter
//! does with them.

use phazr_core::{ExecutionResult, Operation, Phase, PhaseResult};
use phazr_validators::ValidationReport;
use tracing::{error, info, warn};

/// Receives progress notifications from a run. Every method defaults to a
/// no-op so implementors only override what they render.
pub trait Reporter: Send + Sync {
    fn header(&self) {}

    fn info(&self, _message: &str) {}

    fn warning(&self, _message: &str) {}

    fn error(&self, _message: &str) {}

    fn phase_started(&self, _phase: &Phase, _total_operations: usize) {}

    /// `index` is 1-based within the phase
    fn operation_started(&self, _operation: &Operation, _index: usize, _total: usize) {}

    fn operation_finished(&self, _result: &ExecutionResult, _index: usize, _total: usize) {}

    fn phase_summary(&self, _result: &PhaseResult) {}

    fn run_summary(&self, _results: &[PhaseResult]) {}

    fn validation_report(&self, _report: &ValidationReport) {}
}

/// Discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Emits notifications as tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn warning(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }

    fn phase_started(&self, phase: &Phase, total_operations: usize) {
        info!(phase = %phase.name, total_operations, "Phase started");
    }

    fn operation_started(&self, operation: &Operation, index: usize, total: usize) {
        info!(
            operation = %operation.description,
            op_type = %operation.op_type,
            "[{}/{}] Starting",
            index,
            total
        );
    }

    fn operation_finished(&self, result: &ExecutionResult, index: usize, total: usize) {
        if result.success {
            info!(
                operation = %result.operation.description,
                duration = result.duration,
                retries = result.retries_used,
                "[{}/{}] Succeeded",
                index,
                total
            );
        } else {
            warn!(
                operation = %result.operation.description,
                error = result.error.as_deref().unwrap_or("unknown error"),
                retries = result.retries_used,
                "[{}/{}] Failed",
                index,
                total
            );
        }
    }

    fn phase_summary(&self, result: &PhaseResult) {
        info!(
            phase = %result.phase_name,
            version = %result.version,
            total = result.total_operations,
            successful = result.successful_operations,
            failed = result.failed_operations,
            skipped = result.skipped_operations,
            duration = result.duration,
            "Phase finished ({:.1}% success)",
            result.success_rate()
        );
    }

    fn run_summary(&self, results: &[PhaseResult]) {
        let failed = results.iter().filter(|r| !r.is_successful()).count();
        info!(phases = results.len(), failed, "Run finished");
    }

    fn validation_report(&self, report: &ValidationReport) {
        for outcome in &report.results {
            info!(
                validator = %outcome.validator,
                status = ?outcome.status,
                message = outcome.message.as_deref().unwrap_or(""),
                "Validation result"
            );
        }
        if report.all_passed {
            info!("{}", report.summary);
        } else {
            error!("{}", report.summary);
        }
    }
}
