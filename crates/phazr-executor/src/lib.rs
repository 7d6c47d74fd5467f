//! phazr-executor: Phase-based execution engine
//!
//! Features:
//! - Per-operation skip conditions, retries and post-checks
//! - Sequential groups with stop-on-failure, bounded parallel batches
//! - Phase aggregation with group-level continue-on-error
//! - Ordered phase runs gated on dependencies completed earlier in the run

pub mod conditions;
pub mod engine;
pub mod orchestrator;
pub mod phase;
pub mod reporter;

#[cfg(test)]
pub(crate) mod testing;

pub use conditions::{ConditionEvaluator, StaticConditions};
pub use engine::ExecutionEngine;
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use phase::PhaseRunner;
pub use reporter::{NullReporter, Reporter, TracingReporter};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::conditions::{ConditionEvaluator, StaticConditions};
    pub use super::engine::ExecutionEngine;
    pub use super::orchestrator::{Orchestrator, OrchestratorBuilder};
    pub use super::phase::PhaseRunner;
    pub use super::reporter::{NullReporter, Reporter, TracingReporter};
    pub use phazr_core::{
        EnvironmentConfig, ExecutionConfig, ExecutionResult, Operation, OperationType,
        OrchestratorConfig, Phase, PhaseResult, VersionConfig,
    };
    pub use phazr_handlers::{HandlerRegistry, OperationHandler};
}
