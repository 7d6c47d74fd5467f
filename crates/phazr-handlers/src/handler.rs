//! Core handler trait
//!
//! Defines the interface every operation type is executed through.

use async_trait::async_trait;
use phazr_core::{EnvironmentConfig, ExecutionResult, Operation};
use std::sync::Arc;

/// Performs the effect of one operation type.
///
/// Environmental failures (non-zero exit, timeout, HTTP error) must be
/// returned as `Ok` with `success = false`. An `Err` signals a handler fault
/// and is retried by the engine according to the operation's retry policy.
///
/// Handlers own timeout enforcement: a call must not outlive
/// `operation.timeout_secs`, and any spawned process must be reaped before
/// returning.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Execute the operation against the environment
    async fn execute(
        &self,
        operation: &Arc<Operation>,
        environment: &EnvironmentConfig,
    ) -> anyhow::Result<ExecutionResult>;
}

/// Type alias for shared handlers
pub type BoxedHandler = Arc<dyn OperationHandler>;
