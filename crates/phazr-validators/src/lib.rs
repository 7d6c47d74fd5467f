//! phazr-validators: Prerequisite validation
//!
//! Independent checks run once before execution: tool presence, cluster
//! connectivity, filesystem paths and network endpoints.

pub mod checks;
pub mod prerequisite;
pub mod report;

pub use checks::{FileSystemValidator, KubernetesValidator, NetworkValidator, ToolValidator};
pub use prerequisite::{EnvironmentValidator, PrerequisiteValidator, Validator};
pub use report::{ValidationCheck, ValidationOutcome, ValidationReport, ValidationStatus};
