//! Execution Engine - runs operations and operation groups
//!
//! A single operation goes through skip check, handler lookup and a bounded
//! retry loop. Groups run either sequentially, stopping at the first failure
//! of a `fail_on_error` operation, or in fixed-width concurrent batches.

use futures::future::join_all;
use futures::FutureExt;
use phazr_core::{ExecutionResult, Operation, OrchestratorConfig};
use phazr_handlers::HandlerRegistry;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn, Instrument, Span};

use crate::conditions::ConditionEvaluator;
use crate::reporter::Reporter;

const SKIPPED_OUTPUT: &str = "Operation skipped due to condition";
const TEST_COMMAND_FAILED: &str = "Test command failed";

/// Executes operations against the configured environment.
///
/// Cheap to clone; parallel batches hand a clone to each spawned task.
#[derive(Clone)]
pub struct ExecutionEngine {
    config: Arc<OrchestratorConfig>,
    registry: Arc<HandlerRegistry>,
    conditions: Arc<dyn ConditionEvaluator>,
    reporter: Arc<dyn Reporter>,
}

impl ExecutionEngine {
    pub fn new(
        config: Arc<OrchestratorConfig>,
        registry: Arc<HandlerRegistry>,
        conditions: Arc<dyn ConditionEvaluator>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            registry,
            conditions,
            reporter,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Synthetic result used in dry-run mode
    pub fn dry_run_result(operation: &Arc<Operation>) -> ExecutionResult {
        ExecutionResult::success(
            operation.clone(),
            format!("[DRY RUN] Would execute: {}", operation.description),
        )
        .stamped()
    }

    /// Run one operation through skip check, handler lookup and retries.
    ///
    /// Never fails: every outcome, including a panicking handler, ends up in
    /// the returned result.
    pub async fn execute_operation(&self, operation: &Arc<Operation>) -> ExecutionResult {
        if let Some(condition) = &operation.skip_if {
            if self.conditions.evaluate_condition(condition).await {
                info!(operation = %operation.description, condition = %condition, "Skipping operation");
                return ExecutionResult::success(operation.clone(), SKIPPED_OUTPUT).stamped();
            }
        }

        let Some(handler) = self.registry.get_handler(operation.op_type) else {
            error!(op_type = %operation.op_type, "No handler registered");
            return ExecutionResult::failure(
                operation.clone(),
                format!(
                    "No handler registered for operation type: {}",
                    operation.op_type
                ),
            )
            .stamped();
        };

        let start = Instant::now();
        let max_retries = operation.retry_count;
        let mut attempts: u32 = 0;
        let mut last_error = String::new();

        while attempts <= max_retries {
            debug!(operation = %operation.description, attempt = attempts + 1, "Executing operation");

            let attempt = AssertUnwindSafe(handler.execute(operation, &self.config.environment))
                .catch_unwind()
                .await;

            let outcome = match attempt {
                Ok(Ok(result)) if result.success => {
                    let checked = match &operation.test_command {
                        Some(test) => self.conditions.run_test_command(test).await,
                        None => true,
                    };
                    if checked {
                        Ok(result)
                    } else {
                        Err(TEST_COMMAND_FAILED.to_string())
                    }
                }
                // A handler that reports failure is terminal.
                Ok(Ok(result)) => Ok(result),
                Ok(Err(e)) => Err(format!("{:#}", e)),
                Err(panic) => Err(panic_message(panic.as_ref())),
            };

            match outcome {
                Ok(mut result) => {
                    result.retries_used = attempts;
                    result.duration = start.elapsed().as_secs_f64();
                    if result.timestamp.is_none() {
                        result = result.stamped();
                    }
                    return result;
                }
                Err(message) => {
                    last_error = message;
                    attempts += 1;
                    if attempts <= max_retries {
                        warn!(
                            error = %last_error,
                            "Retry {}/{} for {}",
                            attempts,
                            max_retries,
                            operation.description
                        );
                        tokio::time::sleep(Duration::from_secs(operation.retry_delay_secs)).await;
                    }
                }
            }
        }

        error!(
            operation = %operation.description,
            attempts,
            error = %last_error,
            "Operation failed after retries"
        );
        let mut result = ExecutionResult::failure(operation.clone(), last_error)
            .with_duration(start.elapsed().as_secs_f64())
            .stamped();
        result.retries_used = attempts;
        result
    }

    async fn run(&self, operation: &Arc<Operation>) -> ExecutionResult {
        if self.config.execution.dry_run {
            Self::dry_run_result(operation)
        } else {
            self.execute_operation(operation).await
        }
    }

    /// Run a group one operation at a time.
    ///
    /// `offset` is the number of operations declared in the phase before this
    /// group; `total` is the phase total used in notifications.
    pub async fn execute_sequential(
        &self,
        operations: &[Arc<Operation>],
        offset: usize,
        total: usize,
    ) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(operations.len());

        for (i, operation) in operations.iter().enumerate() {
            let index = offset + i + 1;
            self.reporter.operation_started(operation, index, total);

            let result = self.run(operation).await;
            self.reporter.operation_finished(&result, index, total);

            let stop = !result.success && operation.fail_on_error;
            results.push(result);
            if stop {
                warn!(
                    operation = %operation.description,
                    remaining = operations.len() - i - 1,
                    "Stopping group after failed operation"
                );
                break;
            }
        }

        results
    }

    /// Run a group in concurrent batches of at most `max_parallel`.
    ///
    /// Results keep input order. A task that dies becomes a failed result;
    /// `fail_on_error` is not consulted mid-batch.
    pub async fn execute_parallel(
        &self,
        operations: &[Arc<Operation>],
        offset: usize,
        total: usize,
    ) -> Vec<ExecutionResult> {
        let width = self.config.execution.max_parallel.max(1);
        info!(operations = operations.len(), width, "Executing group in parallel");

        for (i, operation) in operations.iter().enumerate() {
            self.reporter.operation_started(operation, offset + i + 1, total);
        }

        let mut results = Vec::with_capacity(operations.len());
        for (batch, chunk) in operations.chunks(width).enumerate() {
            let handles: Vec<_> = chunk
                .iter()
                .map(|operation| {
                    let engine = self.clone();
                    let operation = operation.clone();
                    tokio::spawn(
                        async move { engine.run(&operation).await }.instrument(Span::current()),
                    )
                })
                .collect();

            let outcomes = join_all(handles).await;

            for (i, (operation, outcome)) in chunk.iter().zip(outcomes).enumerate() {
                let result = match outcome {
                    Ok(result) => result,
                    Err(e) => {
                        error!(operation = %operation.description, error = %e, "Parallel task failed");
                        ExecutionResult::failure(operation.clone(), e.to_string()).stamped()
                    }
                };
                let index = offset + batch * width + i + 1;
                self.reporter.operation_finished(&result, index, total);
                results.push(result);
            }
        }

        results
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
