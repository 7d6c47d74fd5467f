//! Kubernetes handlers
//!
//! Each handler shells out to `kubectl`, honouring the environment's context
//! and the operation's namespace override. The binary name is configurable so
//! that a wrapper (or a stand-in during tests) can be used.

use async_trait::async_trait;
use phazr_core::{EnvironmentConfig, ExecutionResult, Operation};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::handler::OperationHandler;
use crate::process::run_command;
use crate::script::process_result;

const DEFAULT_KUBECTL: &str = "kubectl";

/// Where a manifest comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// Inline JSON or YAML, piped through stdin
    Inline(String),
    /// Path to a manifest file or directory
    Path(String),
}

impl ManifestSource {
    /// Inline when the payload starts with `{` or `---`, otherwise a path
    pub fn from_command(command: &str) -> Self {
        let trimmed = command.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with("---") {
            ManifestSource::Inline(command.to_string())
        } else {
            ManifestSource::Path(command.trim().to_string())
        }
    }
}

/// Shared kubectl invocation settings
#[derive(Debug, Clone)]
struct Kubectl {
    binary: String,
}

impl Default for Kubectl {
    fn default() -> Self {
        Self {
            binary: DEFAULT_KUBECTL.to_string(),
        }
    }
}

impl Kubectl {
    fn command(&self, environment: &EnvironmentConfig, args: &[String]) -> Command {
        let mut command = Command::new(&self.binary);
        command.args(context_args(environment)).args(args);
        command
    }

    async fn run(
        &self,
        operation: &Arc<Operation>,
        environment: &EnvironmentConfig,
        args: Vec<String>,
        stdin: Option<Vec<u8>>,
    ) -> ExecutionResult {
        let limit = Duration::from_secs(operation.timeout_secs);
        self.run_within(operation, environment, args, stdin, limit)
            .await
    }

    async fn run_within(
        &self,
        operation: &Arc<Operation>,
        environment: &EnvironmentConfig,
        args: Vec<String>,
        stdin: Option<Vec<u8>>,
        limit: Duration,
    ) -> ExecutionResult {
        debug!(binary = %self.binary, args = ?args, ?limit, "Running kubectl");
        let command = self.command(environment, &args);
        match run_command(command, stdin, limit).await {
            Ok(output) => process_result(operation, output),
            Err(e) => ExecutionResult::failure(operation.clone(), e.to_string()),
        }
    }
}

/// Time left before `deadline`, or `None` once it has passed
fn remaining(deadline: Instant) -> Option<Duration> {
    let left = deadline.saturating_duration_since(Instant::now());
    (!left.is_zero()).then_some(left)
}

fn context_args(environment: &EnvironmentConfig) -> Vec<String> {
    match &environment.context {
        Some(context) => vec!["--context".to_string(), context.clone()],
        None => Vec::new(),
    }
}

fn namespace_for(operation: &Operation, environment: &EnvironmentConfig) -> String {
    operation
        .namespace
        .clone()
        .unwrap_or_else(|| environment.namespace.clone())
}

fn require_service<'a>(operation: &'a Operation, action: &str) -> Result<&'a str, String> {
    operation
        .service
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Service name required for kubectl {}", action))
}

/// Arguments for `kubectl exec`
pub fn exec_args(
    operation: &Operation,
    environment: &EnvironmentConfig,
) -> Result<Vec<String>, String> {
    let service = require_service(operation, "exec")?;
    let mut args = vec![
        "exec".to_string(),
        "-n".to_string(),
        namespace_for(operation, environment),
        service.to_string(),
    ];
    if let Some(container) = &operation.container {
        args.push("-c".to_string());
        args.push(container.clone());
    }
    args.extend(["--", "sh", "-c"].map(String::from));
    args.push(operation.command.clone());
    Ok(args)
}

/// Arguments for `kubectl rollout restart`
pub fn restart_args(
    operation: &Operation,
    environment: &EnvironmentConfig,
) -> Result<Vec<String>, String> {
    let service = require_service(operation, "restart")?;
    Ok(vec![
        "rollout".to_string(),
        "restart".to_string(),
        "deployment".to_string(),
        service.to_string(),
        "-n".to_string(),
        namespace_for(operation, environment),
    ])
}

/// Arguments for `kubectl rollout status`
pub fn rollout_status_args(deployment: &str, namespace: &str, timeout_secs: u64) -> Vec<String> {
    vec![
        "rollout".to_string(),
        "status".to_string(),
        "deployment".to_string(),
        deployment.to_string(),
        "-n".to_string(),
        namespace.to_string(),
        format!("--timeout={}s", timeout_secs),
    ]
}

/// Arguments and stdin for `kubectl apply`
pub fn apply_args(
    operation: &Operation,
    environment: &EnvironmentConfig,
) -> (Vec<String>, Option<Vec<u8>>) {
    let mut args = vec![
        "apply".to_string(),
        "-n".to_string(),
        namespace_for(operation, environment),
    ];
    let stdin = match ManifestSource::from_command(&operation.command) {
        ManifestSource::Inline(manifest) => {
            args.extend(["-f", "-"].map(String::from));
            Some(manifest.into_bytes())
        }
        ManifestSource::Path(path) => {
            args.push("-f".to_string());
            args.push(path);
            None
        }
    };
    (args, stdin)
}

/// Arguments and stdin for `kubectl delete`.
///
/// Besides manifests, a plain resource reference such as `deployment/api`
/// or `configmap settings` is passed through as resource arguments.
pub fn delete_args(
    operation: &Operation,
    environment: &EnvironmentConfig,
) -> (Vec<String>, Option<Vec<u8>>) {
    let mut args = vec![
        "delete".to_string(),
        "-n".to_string(),
        namespace_for(operation, environment),
    ];
    let stdin = match ManifestSource::from_command(&operation.command) {
        ManifestSource::Inline(manifest) => {
            args.extend(["-f", "-"].map(String::from));
            Some(manifest.into_bytes())
        }
        ManifestSource::Path(path) if is_manifest_path(&path) => {
            args.push("-f".to_string());
            args.push(path);
            None
        }
        ManifestSource::Path(resource) => {
            args.extend(resource.split_whitespace().map(String::from));
            None
        }
    };
    (args, stdin)
}

fn is_manifest_path(path: &str) -> bool {
    [".yaml", ".yml", ".json"]
        .iter()
        .any(|ext| path.ends_with(ext))
}

/// Handler for `kubectl_exec`
#[derive(Debug, Clone, Default)]
pub struct KubectlExecHandler {
    kubectl: Kubectl,
}

impl KubectlExecHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different kubectl binary
    pub fn with_binary(binary: &str) -> Self {
        Self {
            kubectl: Kubectl {
                binary: binary.to_string(),
            },
        }
    }
}

#[async_trait]
impl OperationHandler for KubectlExecHandler {
    async fn execute(
        &self,
        operation: &Arc<Operation>,
        environment: &EnvironmentConfig,
    ) -> anyhow::Result<ExecutionResult> {
        let args = match exec_args(operation, environment) {
            Ok(args) => args,
            Err(e) => return Ok(ExecutionResult::failure(operation.clone(), e)),
        };
        info!(service = ?operation.service, "Executing command in pod");
        Ok(self.kubectl.run(operation, environment, args, None).await)
    }
}

/// Handler for `kubectl_restart`, optionally waiting for the rollout
#[derive(Debug, Clone, Default)]
pub struct KubectlRestartHandler {
    kubectl: Kubectl,
}

impl KubectlRestartHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different kubectl binary
    pub fn with_binary(binary: &str) -> Self {
        Self {
            kubectl: Kubectl {
                binary: binary.to_string(),
            },
        }
    }
}

#[async_trait]
impl OperationHandler for KubectlRestartHandler {
    async fn execute(
        &self,
        operation: &Arc<Operation>,
        environment: &EnvironmentConfig,
    ) -> anyhow::Result<ExecutionResult> {
        let args = match restart_args(operation, environment) {
            Ok(args) => args,
            Err(e) => return Ok(ExecutionResult::failure(operation.clone(), e)),
        };
        info!(service = ?operation.service, "Restarting deployment");

        // Restart and rollout wait share one timeout budget
        let deadline = Instant::now() + Duration::from_secs(operation.timeout_secs);
        let mut result = self.kubectl.run(operation, environment, args, None).await;
        if !result.success || !operation.wait_for_ready {
            if result.success && result.output.as_deref().map_or(true, str::is_empty) {
                result.output = Some("Restart successful".to_string());
            }
            return Ok(result);
        }

        // Service presence was checked by restart_args
        let deployment = operation.service.as_deref().unwrap_or_default();
        let namespace = namespace_for(operation, environment);
        let not_ready = || {
            ExecutionResult::failure(
                operation.clone(),
                format!(
                    "Deployment {} did not become ready within {} seconds",
                    deployment, operation.timeout_secs
                ),
            )
        };
        let Some(left) = remaining(deadline) else {
            return Ok(not_ready());
        };

        let status_args = rollout_status_args(deployment, &namespace, left.as_secs().max(1));
        let status = self
            .kubectl
            .run_within(operation, environment, status_args, None, left)
            .await;

        if !status.success {
            return Ok(not_ready());
        }

        Ok(result)
    }
}

/// Handler for `kubectl_apply`
#[derive(Debug, Clone, Default)]
pub struct KubectlApplyHandler {
    kubectl: Kubectl,
}

impl KubectlApplyHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different kubectl binary
    pub fn with_binary(binary: &str) -> Self {
        Self {
            kubectl: Kubectl {
                binary: binary.to_string(),
            },
        }
    }
}

#[async_trait]
impl OperationHandler for KubectlApplyHandler {
    async fn execute(
        &self,
        operation: &Arc<Operation>,
        environment: &EnvironmentConfig,
    ) -> anyhow::Result<ExecutionResult> {
        let (args, stdin) = apply_args(operation, environment);
        info!(inline = stdin.is_some(), "Applying manifests");
        Ok(self.kubectl.run(operation, environment, args, stdin).await)
    }
}

/// Handler for `kubectl_delete`
#[derive(Debug, Clone, Default)]
pub struct KubectlDeleteHandler {
    kubectl: Kubectl,
}

impl KubectlDeleteHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different kubectl binary
    pub fn with_binary(binary: &str) -> Self {
        Self {
            kubectl: Kubectl {
                binary: binary.to_string(),
            },
        }
    }
}

#[async_trait]
impl OperationHandler for KubectlDeleteHandler {
    async fn execute(
        &self,
        operation: &Arc<Operation>,
        environment: &EnvironmentConfig,
    ) -> anyhow::Result<ExecutionResult> {
        let (args, stdin) = delete_args(operation, environment);
        info!(inline = stdin.is_some(), "Deleting resources");
        Ok(self.kubectl.run(operation, environment, args, stdin).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phazr_core::OperationType;

    fn env() -> EnvironmentConfig {
        EnvironmentConfig::new("dev", "apps").with_context("kind-dev")
    }

    #[test]
    fn test_exec_args() {
        let op = Operation::new(OperationType::KubectlExec, "ls /data", "List")
            .with_service("api-0")
            .with_container("app");
        let args = exec_args(&op, &env()).unwrap();
        assert_eq!(
            args,
            ["exec", "-n", "apps", "api-0", "-c", "app", "--", "sh", "-c", "ls /data"]
        );
    }

    #[test]
    fn test_exec_requires_service() {
        let op = Operation::new(OperationType::KubectlExec, "ls", "List");
        assert_eq!(
            exec_args(&op, &env()).unwrap_err(),
            "Service name required for kubectl exec"
        );
    }

    #[test]
    fn test_restart_args_use_namespace_override() {
        let op = Operation::new(OperationType::KubectlRestart, "", "Restart")
            .with_service("api")
            .with_namespace("edge");
        assert_eq!(
            restart_args(&op, &env()).unwrap(),
            ["rollout", "restart", "deployment", "api", "-n", "edge"]
        );
        assert_eq!(
            rollout_status_args("api", "edge", 60),
            ["rollout", "status", "deployment", "api", "-n", "edge", "--timeout=60s"]
        );
    }

    #[test]
    fn test_apply_inline_and_path() {
        let inline = Operation::new(OperationType::KubectlApply, "---\nkind: ConfigMap", "cm");
        let (args, stdin) = apply_args(&inline, &env());
        assert_eq!(args, ["apply", "-n", "apps", "-f", "-"]);
        assert_eq!(stdin.as_deref(), Some("---\nkind: ConfigMap".as_bytes()));

        let path = Operation::new(OperationType::KubectlApply, "k8s/base", "base");
        let (args, stdin) = apply_args(&path, &env());
        assert_eq!(args, ["apply", "-n", "apps", "-f", "k8s/base"]);
        assert!(stdin.is_none());
    }

    #[test]
    fn test_delete_resource_reference() {
        let op = Operation::new(OperationType::KubectlDelete, "configmap settings", "rm");
        let (args, _) = delete_args(&op, &env());
        assert_eq!(args, ["delete", "-n", "apps", "configmap", "settings"]);

        let file = Operation::new(OperationType::KubectlDelete, "old.yaml", "rm");
        let (args, _) = delete_args(&file, &env());
        assert_eq!(args, ["delete", "-n", "apps", "-f", "old.yaml"]);
    }

    #[tokio::test]
    async fn test_exec_handler_passes_context() {
        let op = Arc::new(
            Operation::new(OperationType::KubectlExec, "whoami", "Who").with_service("api-0"),
        );
        let result = KubectlExecHandler::with_binary("echo")
            .execute(&op, &env())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(
            result.output.as_deref().map(str::trim),
            Some("--context kind-dev exec -n apps api-0 -- sh -c whoami")
        );
    }

    #[tokio::test]
    async fn test_restart_without_service_fails() {
        let op = Arc::new(Operation::new(OperationType::KubectlRestart, "", "Restart"));
        let result = KubectlRestartHandler::with_binary("echo")
            .execute(&op, &env())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Service name required for kubectl restart")
        );
    }

    #[tokio::test]
    async fn test_restart_reports_default_output() {
        let op = Arc::new(
            Operation::new(OperationType::KubectlRestart, "", "Restart").with_service("api"),
        );
        let result = KubectlRestartHandler::with_binary("true")
            .execute(&op, &env())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output.as_deref(), Some("Restart successful"));
    }

    #[tokio::test]
    async fn test_restart_failure_skips_wait() {
        let op = Arc::new(
            Operation::new(OperationType::KubectlRestart, "", "Restart")
                .with_service("api")
                .with_wait_for_ready(true),
        );
        let result = KubectlRestartHandler::with_binary("false")
            .execute(&op, &env())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Command exited with code 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_shrinks_to_deadline() {
        let deadline = Instant::now() + Duration::from_secs(10);

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(remaining(deadline), Some(Duration::from_secs(6)));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(remaining(deadline), None);
    }

    #[tokio::test]
    async fn test_missing_binary_is_failure_result() {
        let op = Arc::new(Operation::new(OperationType::KubectlApply, "k8s/", "Apply"));
        let result = KubectlApplyHandler::with_binary("/nonexistent/kubectl")
            .execute(&op, &env())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .starts_with("Failed to spawn command"));
    }
}
