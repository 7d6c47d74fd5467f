//! Execution results, aggregated operation -> phase

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::operation::{Operation, OperationType};
use crate::phase::Phase;

/// Unix timestamp (seconds) as a string
pub fn timestamp_now() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Outcome of one operation's whole attempt sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Operation that was attempted
    pub operation: Arc<Operation>,
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
    /// Wall-clock seconds for the whole attempt sequence
    pub duration: f64,
    pub timestamp: Option<String>,
    pub retries_used: u32,
    /// Handler-specific extras, e.g. HTTP status code
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl ExecutionResult {
    /// Create a successful result
    pub fn success(operation: Arc<Operation>, output: impl Into<String>) -> Self {
        Self {
            operation,
            success: true,
            output: Some(output.into()),
            error: None,
            duration: 0.0,
            timestamp: None,
            retries_used: 0,
            metadata: HashMap::new(),
        }
    }

    /// Create a failed result
    pub fn failure(operation: Arc<Operation>, error: impl Into<String>) -> Self {
        Self {
            operation,
            success: false,
            output: None,
            error: Some(error.into()),
            duration: 0.0,
            timestamp: None,
            retries_used: 0,
            metadata: HashMap::new(),
        }
    }

    /// Set output
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Set duration
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Stamp with the current time
    pub fn stamped(mut self) -> Self {
        self.timestamp = Some(timestamp_now());
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Whether the underlying operation is a skip placeholder
    pub fn is_skip(&self) -> bool {
        self.operation.op_type == OperationType::Skip
    }
}

/// Aggregate outcome of one phase run against one version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_config: Option<Phase>,
    pub version: String,
    /// Results across all groups, in group order
    pub results: Vec<ExecutionResult>,
    pub total_operations: usize,
    pub successful_operations: usize,
    /// Unsuccessful results whose operation is not `skip`
    pub failed_operations: usize,
    /// Results whose operation is `skip`
    pub skipped_operations: usize,
    /// Wall-clock seconds for the whole phase
    pub duration: f64,
}

impl PhaseResult {
    /// Aggregate counts from a result list
    pub fn from_results(
        phase_name: &str,
        phase_config: Option<Phase>,
        version: &str,
        results: Vec<ExecutionResult>,
        duration: f64,
    ) -> Self {
        let successful_operations = results.iter().filter(|r| r.success).count();
        let failed_operations = results
            .iter()
            .filter(|r| !r.success && !r.is_skip())
            .count();
        let skipped_operations = results.iter().filter(|r| r.is_skip()).count();

        Self {
            phase_name: phase_name.to_string(),
            phase_config,
            version: version.to_string(),
            total_operations: results.len(),
            successful_operations,
            failed_operations,
            skipped_operations,
            results,
            duration,
        }
    }

    /// A phase with no operations
    pub fn empty(phase_name: &str, phase_config: Option<Phase>, version: &str) -> Self {
        Self::from_results(phase_name, phase_config, version, Vec::new(), 0.0)
    }

    /// Success rate as a percentage; 100 for an empty phase
    pub fn success_rate(&self) -> f64 {
        if self.total_operations == 0 {
            return 100.0;
        }
        self.successful_operations as f64 / self.total_operations as f64 * 100.0
    }

    pub fn is_successful(&self) -> bool {
        self.failed_operations == 0
    }
}
