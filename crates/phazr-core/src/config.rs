//! Configuration model
//!
//! These are the in-memory, already-validated shapes the engine consumes.
//! Reading them from files lives in `phazr-config`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::operation::{Operation, OperationType};
use crate::phase::Phase;

/// Target context passed to every handler call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub name: String,
    /// Default Kubernetes namespace
    pub namespace: String,
    /// Kubernetes context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl EnvironmentConfig {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            context: None,
            cluster: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = Some(context.to_string());
        self
    }
}

fn default_true() -> bool {
    true
}

fn default_max_parallel() -> usize {
    5
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_sequential_types() -> Vec<OperationType> {
    vec![OperationType::KubectlRestart, OperationType::KubectlDelete]
}

/// Run-wide execution policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Report operations without executing them
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_true")]
    pub interactive: bool,
    /// Run parallel-safe groups concurrently
    #[serde(default)]
    pub parallel: bool,
    /// Width of a parallel batch
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
    #[serde(default)]
    pub continue_on_error: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Operation types that force their whole group to run sequentially
    #[serde(default = "default_sequential_types")]
    pub sequential_types: Vec<OperationType>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            interactive: true,
            parallel: false,
            max_parallel: default_max_parallel(),
            continue_on_error: false,
            verbose: false,
            log_level: default_log_level(),
            sequential_types: default_sequential_types(),
        }
    }
}

impl ExecutionConfig {
    /// Whether a group may run concurrently under the global `parallel` flag
    pub fn is_parallel_safe(&self, operations: &[Arc<Operation>]) -> bool {
        !operations
            .iter()
            .any(|op| self.sequential_types.contains(&op.op_type))
    }
}

/// The operations available for one named release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionConfig {
    pub version: String,
    pub groups: BTreeMap<String, Vec<Arc<Operation>>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl VersionConfig {
    /// Create a version, rejecting empty groups
    pub fn new(
        version: &str,
        groups: BTreeMap<String, Vec<Arc<Operation>>>,
        metadata: HashMap<String, Value>,
    ) -> Result<Self> {
        if let Some((name, _)) = groups.iter().find(|(_, ops)| ops.is_empty()) {
            return Err(Error::config(format!("Group '{}' cannot be empty", name)));
        }
        Ok(Self {
            version: version.to_string(),
            groups,
            metadata,
        })
    }

    /// Operations of a group, if the group exists
    pub fn group(&self, name: &str) -> Option<&[Arc<Operation>]> {
        self.groups.get(name).map(|ops| ops.as_slice())
    }

    pub fn operation_count(&self) -> usize {
        self.groups.values().map(|ops| ops.len()).sum()
    }
}

/// Complete orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Versions in declaration order
    pub versions: Vec<VersionConfig>,
    /// Phases in execution order
    pub phases: Vec<Phase>,
    pub environment: EnvironmentConfig,
    pub execution: ExecutionConfig,
    pub metadata: HashMap<String, Value>,
}

impl OrchestratorConfig {
    pub fn new(environment: EnvironmentConfig) -> Self {
        Self {
            versions: Vec::new(),
            phases: Vec::new(),
            environment,
            execution: ExecutionConfig::default(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_version(mut self, version: VersionConfig) -> Self {
        self.versions.push(version);
        self
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn with_execution(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    /// Look up a version by key
    pub fn version(&self, key: &str) -> Option<&VersionConfig> {
        self.versions.iter().find(|v| v.version == key)
    }

    /// First declared version
    pub fn default_version(&self) -> Option<&VersionConfig> {
        self.versions.first()
    }

    /// First phase with the given name
    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// Phase name -> group names
    pub fn phase_mappings(&self) -> BTreeMap<String, Vec<String>> {
        self.phases
            .iter()
            .map(|p| (p.name.clone(), p.groups.clone()))
            .collect()
    }

    /// Every configured operation across all versions
    pub fn operations(&self) -> impl Iterator<Item = &Arc<Operation>> {
        self.versions
            .iter()
            .flat_map(|v| v.groups.values())
            .flat_map(|ops| ops.iter())
    }
}
