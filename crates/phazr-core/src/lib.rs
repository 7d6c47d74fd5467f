//! Core types for phazr
//!
//! # Modules
//!
//! - `config`: Environment, execution and orchestrator configuration
//! - `error`: Error types and Result alias
//! - `operation`: Operations and their type tags
//! - `phase`: Phase definitions
//! - `result`: Execution and phase results

pub mod config;
pub mod error;
pub mod operation;
pub mod phase;
pub mod result;

// Re-exports
pub use config::{EnvironmentConfig, ExecutionConfig, OrchestratorConfig, VersionConfig};
pub use error::{Error, Result};
pub use operation::{Operation, OperationType};
pub use phase::Phase;
pub use result::{ExecutionResult, PhaseResult};
