//! Test doubles shared by the unit tests

use async_trait::async_trait;
use phazr_core::{
    EnvironmentConfig, ExecutionResult, Operation, OperationType, Phase, PhaseResult,
};
use phazr_handlers::OperationHandler;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::conditions::ConditionEvaluator;
use crate::reporter::Reporter;

/// Behaviour is picked from the operation command:
/// `ok`, `fail`, `fault`, `panic`, `sleep:<ms>`, `flaky:<n>` (faults n times).
#[derive(Default)]
pub struct ScriptedHandler {
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedHandler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OperationHandler for ScriptedHandler {
    async fn execute(
        &self,
        operation: &Arc<Operation>,
        _environment: &EnvironmentConfig,
    ) -> anyhow::Result<ExecutionResult> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let command = operation.command.as_str();
        let outcome = if let Some(ms) = command.strip_prefix("sleep:") {
            tokio::time::sleep(Duration::from_millis(ms.parse()?)).await;
            Ok(ExecutionResult::success(operation.clone(), command))
        } else if let Some(n) = command.strip_prefix("flaky:") {
            if call < n.parse()? {
                Err(anyhow::anyhow!("flaky attempt {}", call))
            } else {
                Ok(ExecutionResult::success(operation.clone(), "recovered"))
            }
        } else {
            match command {
                "fail" => Ok(ExecutionResult::failure(operation.clone(), "exit 1")),
                "fault" => Err(anyhow::anyhow!("connection reset")),
                "panic" => panic!("handler exploded"),
                _ => Ok(ExecutionResult::success(operation.clone(), "done")),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

/// Fixed answers for skip conditions and post-checks
pub struct FixedConditions {
    pub skip: bool,
    pub test_passes: bool,
    pub test_runs: AtomicUsize,
}

impl FixedConditions {
    pub fn new(skip: bool, test_passes: bool) -> Self {
        Self {
            skip,
            test_passes,
            test_runs: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ConditionEvaluator for FixedConditions {
    async fn evaluate_condition(&self, _condition: &str) -> bool {
        self.skip
    }

    async fn run_test_command(&self, _command: &str) -> bool {
        self.test_runs.fetch_add(1, Ordering::SeqCst);
        self.test_passes
    }
}

/// Records notifications as short strings
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, event: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Reporter for RecordingReporter {
    fn warning(&self, message: &str) {
        self.push(format!("warning:{}", message));
    }

    fn error(&self, message: &str) {
        self.push(format!("error:{}", message));
    }

    fn phase_started(&self, phase: &Phase, total_operations: usize) {
        self.push(format!("phase:{}:{}", phase.name, total_operations));
    }

    fn operation_started(&self, operation: &Operation, index: usize, total: usize) {
        self.push(format!("start:{}:{}/{}", operation.description, index, total));
    }

    fn operation_finished(&self, result: &ExecutionResult, index: usize, total: usize) {
        self.push(format!(
            "finish:{}:{}/{}:{}",
            result.operation.description, index, total, result.success
        ));
    }

    fn phase_summary(&self, result: &PhaseResult) {
        self.push(format!("summary:{}", result.phase_name));
    }
}

pub fn op(command: &str, description: &str) -> Arc<Operation> {
    Arc::new(Operation::new(OperationType::ScriptExec, command, description))
}
