//! Console rendering of run progress

use phazr_core::{ExecutionResult, Operation, OperationType, Phase, PhaseResult};
use phazr_executor::Reporter;
use phazr_validators::{ValidationReport, ValidationStatus};

const WIDTH: usize = 70;

/// Cut `text` to at most `max` characters, marking the cut with `...`
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn type_label(op_type: OperationType) -> &'static str {
    match op_type {
        OperationType::ScriptExec => "script",
        OperationType::KubectlExec => "exec",
        OperationType::KubectlRestart => "restart",
        OperationType::KubectlApply => "apply",
        OperationType::KubectlDelete => "delete",
        OperationType::HttpRequest => "http",
        OperationType::Custom => "custom",
        OperationType::Skip => "skip",
    }
}

/// Outcome word shown for a finished operation
pub fn status_label(result: &ExecutionResult) -> &'static str {
    if result.is_skip() {
        "SKIPPED"
    } else if result.success {
        "SUCCESS"
    } else {
        "FAILED"
    }
}

/// Boxed, line-oriented output on stdout; errors go to stderr
#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter {
    verbose: bool,
    dry_run: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            dry_run: false,
        }
    }

    /// In dry-run mode the synthetic result output is always shown
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn boxed(&self, text: &str) {
        println!("║ {:<width$} ║", truncate(text, WIDTH - 2), width = WIDTH - 2);
    }

    fn detail_lines(&self, marker: &str, text: &str, lines: usize) {
        for line in detail_rows(marker, text, lines) {
            self.boxed(&line);
        }
    }

    /// Rows printed under a finished operation's status line
    fn result_details(&self, result: &ExecutionResult) -> Vec<String> {
        let mut rows = Vec::new();
        if !result.success {
            if let Some(error) = &result.error {
                rows.extend(detail_rows("→", error, 2));
            }
        }
        if self.verbose || self.dry_run {
            if let Some(output) = &result.output {
                rows.extend(detail_rows("→", output, 2));
            }
        }
        rows
    }
}

fn detail_rows(marker: &str, text: &str, lines: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(lines)
        .map(|line| format!("      {} {}", marker, line))
        .collect()
}

impl Reporter for ConsoleReporter {
    fn header(&self) {
        println!("╔{}╗", "═".repeat(WIDTH));
        self.boxed("phazr - phase-based workflow orchestration");
        if self.dry_run {
            self.boxed("DRY RUN: operations are reported, not executed");
        }
        println!("╚{}╝", "═".repeat(WIDTH));
        println!();
    }

    fn info(&self, message: &str) {
        println!("ℹ {}", message);
    }

    fn warning(&self, message: &str) {
        println!("⚠ {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    fn phase_started(&self, phase: &Phase, total_operations: usize) {
        let title = match &phase.icon {
            Some(icon) => format!("{} Phase: {}", icon, phase.name.to_uppercase()),
            None => format!("Phase: {}", phase.name.to_uppercase()),
        };
        let subtitle = match &phase.description {
            Some(description) => format!("{} ({} operations)", description, total_operations),
            None => format!("{} operations", total_operations),
        };

        println!();
        println!("╔{}╗", "═".repeat(WIDTH));
        self.boxed(&title);
        self.boxed(&subtitle);
        println!("╠{}╣", "═".repeat(WIDTH));
    }

    fn operation_started(&self, operation: &Operation, index: usize, total: usize) {
        self.boxed(&format!(
            "[{:2}/{:2}] {:<7} {}",
            index,
            total,
            type_label(operation.op_type),
            operation.description
        ));
        if self.verbose && !operation.command.is_empty() {
            self.detail_lines("$", &operation.command, 3);
        }
    }

    fn operation_finished(&self, result: &ExecutionResult, _index: usize, _total: usize) {
        let retries = if result.retries_used > 0 {
            format!(", {} retries", result.retries_used)
        } else {
            String::new()
        };
        self.boxed(&format!(
            "        {} ({:.1}s{})",
            status_label(result),
            result.duration,
            retries
        ));

        for line in self.result_details(result) {
            self.boxed(&line);
        }
    }

    fn phase_summary(&self, result: &PhaseResult) {
        println!("╠{}╣", "═".repeat(WIDTH));
        self.boxed(&format!(
            "{}: {} passed, {} failed, {} skipped | {:.1}s | {:.0}%",
            result.phase_name,
            result.successful_operations,
            result.failed_operations,
            result.skipped_operations,
            result.duration,
            result.success_rate()
        ));
        println!("╚{}╝", "═".repeat(WIDTH));
    }

    fn run_summary(&self, results: &[PhaseResult]) {
        let total: usize = results.iter().map(|r| r.total_operations).sum();
        let failed: usize = results.iter().map(|r| r.failed_operations).sum();
        let duration: f64 = results.iter().map(|r| r.duration).sum();

        println!();
        println!(
            "{:<20} {:>6} {:>7} {:>7} {:>8}",
            "Phase", "Total", "Passed", "Failed", "Time"
        );
        for result in results {
            println!(
                "{:<20} {:>6} {:>7} {:>7} {:>7.1}s",
                truncate(&result.phase_name, 20),
                result.total_operations,
                result.successful_operations,
                result.failed_operations,
                result.duration
            );
        }
        println!();
        if failed == 0 {
            println!("✓ {} phases, {} operations in {:.1}s", results.len(), total, duration);
        } else {
            eprintln!("✗ {} of {} operations failed", failed, total);
        }
    }

    fn validation_report(&self, report: &ValidationReport) {
        println!("Prerequisites validation");
        for outcome in &report.results {
            let status = match outcome.status {
                ValidationStatus::Passed => "PASS",
                ValidationStatus::Warning => "WARN",
                ValidationStatus::Failed => "FAIL",
            };
            println!(
                "  {:<5} {:<24} {}",
                status,
                outcome.validator,
                outcome.message.as_deref().unwrap_or("")
            );
            if self.verbose || outcome.status != ValidationStatus::Passed {
                for check in &outcome.checks {
                    println!(
                        "        {} {}: {}",
                        if check.passed { "✓" } else { "✗" },
                        check.name,
                        check.message
                    );
                }
            }
        }
        if report.all_passed {
            println!("{}", report.summary);
        } else {
            eprintln!("{}", report.summary);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ééééé", 5), "ééééé");
    }

    #[test]
    fn test_status_label() {
        let skip = Arc::new(Operation::new(OperationType::Skip, "", "placeholder"));
        let script = Arc::new(Operation::new(OperationType::ScriptExec, "true", "run"));

        assert_eq!(status_label(&ExecutionResult::failure(skip, "no handler")), "SKIPPED");
        assert_eq!(
            status_label(&ExecutionResult::success(script.clone(), "")),
            "SUCCESS"
        );
        assert_eq!(status_label(&ExecutionResult::failure(script, "x")), "FAILED");
    }

    #[test]
    fn test_dry_run_output_shown_without_verbose() {
        let op = Arc::new(Operation::new(OperationType::ScriptExec, "true", "Seed data"));
        let result = ExecutionResult::success(op, "[DRY RUN] Would execute: Seed data");

        let quiet = ConsoleReporter::new(false);
        assert!(quiet.result_details(&result).is_empty());

        let dry = ConsoleReporter::new(false).with_dry_run(true);
        assert_eq!(
            dry.result_details(&result),
            vec!["      → [DRY RUN] Would execute: Seed data".to_string()]
        );
    }

    #[test]
    fn test_failure_error_shown_first() {
        let op = Arc::new(Operation::new(OperationType::ScriptExec, "false", "Break"));
        let mut result = ExecutionResult::failure(op, "exit status 1\n\nsecond\nthird");
        result.output = Some("partial".to_string());

        let rows = ConsoleReporter::new(true).result_details(&result);
        assert_eq!(
            rows,
            vec![
                "      → exit status 1".to_string(),
                "      → second".to_string(),
                "      → partial".to_string(),
            ]
        );
    }
}
