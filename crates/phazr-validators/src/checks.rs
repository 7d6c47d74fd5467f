//! Built-in validators

use async_trait::async_trait;
use phazr_handlers::process::{run_command, shell};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::prerequisite::Validator;
use crate::report::{ValidationCheck, ValidationOutcome, ValidationStatus};

const TOOL_TIMEOUT: Duration = Duration::from_secs(5);
const CLUSTER_TIMEOUT: Duration = Duration::from_secs(10);
const ENDPOINT_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks that a tool is installed by running its version command
#[derive(Debug, Clone)]
pub struct ToolValidator {
    tool: String,
    version_command: String,
}

impl ToolValidator {
    /// Probe with `<tool> --version`
    pub fn new(tool: &str) -> Self {
        Self {
            tool: tool.to_string(),
            version_command: format!("{} --version", tool),
        }
    }

    pub fn with_version_command(tool: &str, version_command: &str) -> Self {
        Self {
            tool: tool.to_string(),
            version_command: version_command.to_string(),
        }
    }
}

#[async_trait]
impl Validator for ToolValidator {
    async fn validate(&self) -> ValidationOutcome {
        let label = format!("tool:{}", self.tool);
        match run_command(shell(&self.version_command), None, TOOL_TIMEOUT).await {
            Ok(output) if output.success() => {
                let version = if output.stdout.trim().is_empty() {
                    output.stderr.trim().to_string()
                } else {
                    output.stdout.trim().to_string()
                };
                ValidationOutcome::passed(&label, format!("{} is available", self.tool))
                    .with_detail("version", Value::String(version))
            }
            Ok(_) => ValidationOutcome::failed(&label, format!("{} command failed", self.tool)),
            Err(phazr_handlers::process::ProcessError::Timeout(_)) => {
                ValidationOutcome::failed(&label, format!("{} command timed out", self.tool))
            }
            Err(e) => {
                ValidationOutcome::failed(&label, format!("{} not found: {}", self.tool, e))
            }
        }
    }
}

/// Checks cluster connectivity, namespace access and pod permissions.
///
/// Losing the cluster fails the validator and skips the remaining checks;
/// the others only produce warnings.
#[derive(Debug, Clone)]
pub struct KubernetesValidator {
    namespace: String,
    context: Option<String>,
    binary: String,
}

impl KubernetesValidator {
    pub fn new(namespace: &str, context: Option<&str>) -> Self {
        Self {
            namespace: namespace.to_string(),
            context: context.map(String::from),
            binary: "kubectl".to_string(),
        }
    }

    /// Use a different kubectl binary
    pub fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(&self.binary);
        if let Some(context) = &self.context {
            command.arg("--context").arg(context);
        }
        command.args(args);
        command
    }
}

#[async_trait]
impl Validator for KubernetesValidator {
    async fn validate(&self) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new("kubernetes", ValidationStatus::Passed);

        match run_command(self.command(&["cluster-info"]), None, CLUSTER_TIMEOUT).await {
            Ok(output) if output.success() => outcome.record(
                ValidationCheck::new("cluster_connectivity", true, "Connected to cluster"),
                ValidationStatus::Failed,
            ),
            Ok(output) => {
                outcome.record(
                    ValidationCheck::new(
                        "cluster_connectivity",
                        false,
                        format!("Cannot connect to cluster: {}", output.stderr.trim()),
                    ),
                    ValidationStatus::Failed,
                );
                return outcome;
            }
            Err(e) => {
                outcome.record(
                    ValidationCheck::new(
                        "cluster_connectivity",
                        false,
                        format!("Cannot connect to cluster: {}", e),
                    ),
                    ValidationStatus::Failed,
                );
                return outcome;
            }
        }

        let namespace_check = match run_command(
            self.command(&["get", "namespace", &self.namespace]),
            None,
            CLUSTER_TIMEOUT,
        )
        .await
        {
            Ok(output) if output.success() => ValidationCheck::new(
                "namespace_access",
                true,
                format!("Namespace {} is accessible", self.namespace),
            ),
            Ok(_) => ValidationCheck::new(
                "namespace_access",
                false,
                format!("Cannot access namespace {}", self.namespace),
            ),
            Err(e) => ValidationCheck::new(
                "namespace_access",
                false,
                format!("Error checking namespace: {}", e),
            ),
        };
        outcome.record(namespace_check, ValidationStatus::Warning);

        match run_command(
            self.command(&["auth", "can-i", "list", "pods", "-n", &self.namespace]),
            None,
            CLUSTER_TIMEOUT,
        )
        .await
        {
            Ok(output) => outcome.record(
                ValidationCheck::new(
                    "pod_permissions",
                    output.success(),
                    if output.success() {
                        "Can list pods"
                    } else {
                        "Cannot list pods"
                    },
                ),
                ValidationStatus::Warning,
            ),
            Err(e) => debug!(error = %e, "Pod permission check unavailable"),
        }

        outcome
    }
}

/// Checks that required paths exist; missing paths are warnings
#[derive(Debug, Clone, Default)]
pub struct FileSystemValidator {
    paths: Vec<PathBuf>,
}

impl FileSystemValidator {
    pub fn new<P: AsRef<Path>>(paths: &[P]) -> Self {
        Self {
            paths: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
        }
    }
}

#[async_trait]
impl Validator for FileSystemValidator {
    async fn validate(&self) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new("filesystem", ValidationStatus::Passed);

        for path in &self.paths {
            let display = path.display().to_string();
            let check = match tokio::fs::metadata(path).await {
                Ok(meta) => ValidationCheck::new(
                    &display,
                    true,
                    if meta.is_dir() { "directory" } else { "file" },
                ),
                Err(_) => ValidationCheck::new(
                    &display,
                    false,
                    format!("Path {} does not exist", display),
                ),
            };
            outcome.record(check, ValidationStatus::Warning);
        }

        outcome
    }
}

/// Checks that endpoints answer an HTTP HEAD; unreachable ones are warnings
#[derive(Debug, Clone, Default)]
pub struct NetworkValidator {
    endpoints: Vec<String>,
    client: reqwest::Client,
}

impl NetworkValidator {
    pub fn new(endpoints: &[&str]) -> Self {
        Self {
            endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Validator for NetworkValidator {
    async fn validate(&self) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new("network", ValidationStatus::Passed);

        for endpoint in &self.endpoints {
            let check = match self
                .client
                .head(endpoint)
                .timeout(ENDPOINT_TIMEOUT)
                .send()
                .await
            {
                Ok(response) => ValidationCheck::new(
                    endpoint,
                    true,
                    format!("Reachable (HTTP {})", response.status().as_u16()),
                ),
                Err(e) => ValidationCheck::new(endpoint, false, e.to_string()),
            };
            outcome.record(check, ValidationStatus::Warning);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_filesystem_missing_path_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        std::fs::write(&present, "x").unwrap();
        let missing = dir.path().join("missing.txt");

        let outcome = FileSystemValidator::new(&[dir.path().to_path_buf(), present, missing])
            .validate()
            .await;

        assert_eq!(outcome.status, ValidationStatus::Warning);
        assert_eq!(outcome.checks.len(), 3);
        assert_eq!(outcome.checks[0].message, "directory");
        assert_eq!(outcome.checks[1].message, "file");
        assert!(!outcome.checks[2].passed);
    }

    #[tokio::test]
    async fn test_tool_validator_custom_command() {
        let outcome = ToolValidator::with_version_command("shell", "echo 1.2.3")
            .validate()
            .await;
        assert_eq!(outcome.status, ValidationStatus::Passed);
        assert_eq!(outcome.details.get("version"), Some(&Value::from("1.2.3")));
        assert_eq!(outcome.message.as_deref(), Some("shell is available"));
    }

    #[tokio::test]
    async fn test_tool_validator_failure() {
        let outcome = ToolValidator::with_version_command("broken", "exit 2")
            .validate()
            .await;
        assert_eq!(outcome.status, ValidationStatus::Failed);
        assert_eq!(outcome.message.as_deref(), Some("broken command failed"));
    }

    #[tokio::test]
    async fn test_unreachable_cluster_stops_checks() {
        let outcome = KubernetesValidator::new("default", Some("ctx"))
            .with_binary("false")
            .validate()
            .await;
        assert_eq!(outcome.status, ValidationStatus::Failed);
        assert_eq!(outcome.checks.len(), 1);
        assert_eq!(outcome.checks[0].name, "cluster_connectivity");
    }

    #[tokio::test]
    async fn test_reachable_cluster_runs_all_checks() {
        let outcome = KubernetesValidator::new("default", None)
            .with_binary("true")
            .validate()
            .await;
        assert_eq!(outcome.status, ValidationStatus::Passed);
        let names: Vec<_> = outcome.checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            ["cluster_connectivity", "namespace_access", "pod_permissions"]
        );
    }
}
