//! Operations - the unit of work executed by the engine

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Type tag of an operation; selects the handler that executes it.
///
/// The set is closed: an unknown tag is rejected when the configuration is
/// deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Execute a shell script
    ScriptExec,
    /// Execute a command inside a pod
    KubectlExec,
    /// Restart a deployment
    KubectlRestart,
    /// Apply manifests
    KubectlApply,
    /// Delete resources
    KubectlDelete,
    /// Make an HTTP API call
    HttpRequest,
    /// Custom, caller-registered handler
    Custom,
    /// Placeholder that is counted as skipped
    Skip,
}

impl OperationType {
    pub const ALL: [OperationType; 8] = [
        OperationType::ScriptExec,
        OperationType::KubectlExec,
        OperationType::KubectlRestart,
        OperationType::KubectlApply,
        OperationType::KubectlDelete,
        OperationType::HttpRequest,
        OperationType::Custom,
        OperationType::Skip,
    ];

    /// Wire name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::ScriptExec => "script_exec",
            OperationType::KubectlExec => "kubectl_exec",
            OperationType::KubectlRestart => "kubectl_restart",
            OperationType::KubectlApply => "kubectl_apply",
            OperationType::KubectlDelete => "kubectl_delete",
            OperationType::HttpRequest => "http_request",
            OperationType::Custom => "custom",
            OperationType::Skip => "skip",
        }
    }

    /// Whether the operation drives `kubectl`
    pub fn is_kubernetes(&self) -> bool {
        matches!(
            self,
            OperationType::KubectlExec
                | OperationType::KubectlRestart
                | OperationType::KubectlApply
                | OperationType::KubectlDelete
        )
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_timeout() -> u64 {
    300
}

fn default_retry_delay() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

/// A single executable operation.
///
/// Built once from configuration and shared read-only (behind an `Arc`) by
/// every result produced for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Command payload; meaning depends on `op_type`
    pub command: String,
    /// Human-readable description
    pub description: String,
    #[serde(rename = "type")]
    pub op_type: OperationType,

    /// Deployment/pod name for kubectl operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Namespace override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Container for kubectl exec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default)]
    pub wait_for_ready: bool,
    /// Per-attempt timeout, enforced by the handler
    #[serde(rename = "timeout", default = "default_timeout")]
    pub timeout_secs: u64,

    /// Post-check run after a successful attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,
    /// Reserved, not interpreted by the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(rename = "retry_delay", default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_if: Option<String>,
    #[serde(default = "default_true")]
    pub fail_on_error: bool,

    /// Opaque to the engine, passed through to handlers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl Operation {
    /// Create an operation with default policy fields
    pub fn new(op_type: OperationType, command: &str, description: &str) -> Self {
        Self {
            command: command.to_string(),
            description: description.to_string(),
            op_type,
            service: None,
            namespace: None,
            container: None,
            wait_for_ready: false,
            timeout_secs: default_timeout(),
            test_command: None,
            expected_output: None,
            retry_count: 0,
            retry_delay_secs: default_retry_delay(),
            skip_if: None,
            fail_on_error: true,
            metadata: HashMap::new(),
        }
    }

    pub fn with_service(mut self, service: &str) -> Self {
        self.service = Some(service.to_string());
        self
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_container(mut self, container: &str) -> Self {
        self.container = Some(container.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set retry ceiling and delay between attempts
    pub fn with_retries(mut self, retry_count: u32, retry_delay_secs: u64) -> Self {
        self.retry_count = retry_count;
        self.retry_delay_secs = retry_delay_secs;
        self
    }

    pub fn with_skip_if(mut self, condition: &str) -> Self {
        self.skip_if = Some(condition.to_string());
        self
    }

    pub fn with_test_command(mut self, command: &str) -> Self {
        self.test_command = Some(command.to_string());
        self
    }

    pub fn with_fail_on_error(mut self, fail_on_error: bool) -> Self {
        self.fail_on_error = fail_on_error;
        self
    }

    pub fn with_wait_for_ready(mut self, wait: bool) -> Self {
        self.wait_for_ready = wait;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}
