//! Shell script handler

use async_trait::async_trait;
use phazr_core::{EnvironmentConfig, ExecutionResult, Operation};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::handler::OperationHandler;
use crate::process::{run_command, shell, ProcessOutput};

/// Runs `script_exec` operations through `sh -c`.
///
/// The child sees the parent environment plus `NAMESPACE`, `ENVIRONMENT`,
/// `KUBE_CONTEXT` (when set) and one `OP_<KEY>` variable per metadata entry.
#[derive(Debug, Clone, Default)]
pub struct ScriptHandler;

impl ScriptHandler {
    pub fn new() -> Self {
        Self
    }
}

/// Environment variables exported to a script
pub fn script_environment(
    operation: &Operation,
    environment: &EnvironmentConfig,
) -> Vec<(String, String)> {
    let namespace = operation
        .namespace
        .clone()
        .unwrap_or_else(|| environment.namespace.clone());

    let mut vars = vec![
        ("NAMESPACE".to_string(), namespace),
        ("ENVIRONMENT".to_string(), environment.name.clone()),
    ];

    if let Some(context) = &environment.context {
        vars.push(("KUBE_CONTEXT".to_string(), context.clone()));
    }

    let mut metadata: Vec<_> = operation.metadata.iter().collect();
    metadata.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in metadata {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        vars.push((format!("OP_{}", key.to_uppercase()), value));
    }

    vars
}

/// Map a finished process to a result; stderr is only reported on failure
pub(crate) fn process_result(operation: &Arc<Operation>, output: ProcessOutput) -> ExecutionResult {
    if output.success() {
        ExecutionResult::success(operation.clone(), output.stdout)
    } else {
        let mut result = ExecutionResult::failure(operation.clone(), output.stderr);
        if result.error.as_deref().map_or(true, str::is_empty) {
            result.error = Some(format!("Command exited with code {}", output.exit_code));
        }
        result
            .with_output(output.stdout)
            .with_metadata("exit_code", Value::from(output.exit_code))
    }
}

#[async_trait]
impl OperationHandler for ScriptHandler {
    async fn execute(
        &self,
        operation: &Arc<Operation>,
        environment: &EnvironmentConfig,
    ) -> anyhow::Result<ExecutionResult> {
        info!(
            command = %operation.command,
            timeout = operation.timeout_secs,
            "Executing script"
        );

        let mut command = shell(&operation.command);
        command.envs(script_environment(operation, environment));

        let limit = Duration::from_secs(operation.timeout_secs);
        let result = match run_command(command, None, limit).await {
            Ok(output) => {
                debug!(exit_code = output.exit_code, "Script completed");
                process_result(operation, output)
            }
            Err(e) => ExecutionResult::failure(operation.clone(), e.to_string()),
        };

        Ok(result)
    }
}
