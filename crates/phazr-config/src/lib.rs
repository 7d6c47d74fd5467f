//! phazr-config: Configuration files for phazr
//!
//! YAML or JSON documents are read into raw trees, deep-merged when several
//! files are given, then parsed into an [`OrchestratorConfig`].
//!
//! [`OrchestratorConfig`]: phazr_core::OrchestratorConfig

pub mod document;
pub mod env;
pub mod manager;

pub use document::ConfigFormat;
pub use env::apply_env_overrides;
pub use manager::ConfigManager;
