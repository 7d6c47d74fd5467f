//! Configuration manager

use phazr_core::{Error, OperationType, OrchestratorConfig, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::document::{deep_merge, parse_document, to_document, ConfigFormat};

/// Loads, merges, saves and checks configuration files
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ConfigManager {
    /// `config_dir` is the fallback directory for relative paths, `./config`
    /// when not given
    pub fn new(config_dir: Option<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.unwrap_or_else(|| PathBuf::from("config")),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn resolve(&self, file: &Path) -> Result<PathBuf> {
        if file.exists() {
            return Ok(file.to_path_buf());
        }
        let fallback = self.config_dir.join(file);
        if fallback.exists() {
            return Ok(fallback);
        }
        Err(Error::config(format!(
            "Configuration file not found: {}",
            file.display()
        )))
    }

    fn read_raw(path: &Path, format: ConfigFormat) -> Result<serde_yaml::Value> {
        let text = std::fs::read_to_string(path)?;
        format.parse(&text)
    }

    pub fn load_config(&self, file: impl AsRef<Path>) -> Result<OrchestratorConfig> {
        let path = self.resolve(file.as_ref())?;
        let format = ConfigFormat::from_path(&path).ok_or_else(|| {
            Error::config(format!(
                "Unsupported config format: {}",
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("(none)")
            ))
        })?;

        info!(path = %path.display(), "Loading configuration");
        parse_document(Self::read_raw(&path, format)?)
    }

    /// Deep-merge files left to right. Files with unsupported extensions
    /// are skipped.
    pub fn merge_configs<P: AsRef<Path>>(&self, files: &[P]) -> Result<OrchestratorConfig> {
        let mut merged = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());

        for file in files {
            let path = file.as_ref();
            let Some(format) = ConfigFormat::from_path(path) else {
                warn!(path = %path.display(), "Skipping file with unsupported format");
                continue;
            };
            debug!(path = %path.display(), "Merging configuration");
            let raw = Self::read_raw(path, format)?;
            if !raw.is_null() {
                deep_merge(&mut merged, raw);
            }
        }

        parse_document(merged)
    }

    /// Write as YAML or JSON, by extension
    pub fn save_config(&self, config: &OrchestratorConfig, file: impl AsRef<Path>) -> Result<()> {
        let path = file.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::config(format!("Unsupported output format: {}", path.display()))
        })?;

        let text = format.render(&to_document(config)?)?;
        std::fs::write(path, text)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Static checks; an empty list means the configuration is usable
    pub fn validate_config(&self, config: &OrchestratorConfig) -> Vec<String> {
        let mut issues = Vec::new();

        if config.versions.is_empty() {
            issues.push("No versions defined in configuration".to_string());
        }

        for version in &config.versions {
            if version.groups.is_empty() {
                issues.push(format!("Version {} has no operation groups", version.version));
            }
            for (group, operations) in &version.groups {
                for (i, op) in operations.iter().enumerate() {
                    let needs_service = matches!(
                        op.op_type,
                        OperationType::KubectlExec | OperationType::KubectlRestart
                    );
                    if needs_service && op.service.as_deref().map_or(true, str::is_empty) {
                        issues.push(format!(
                            "Operation {} in {} ({}) is {} but missing service",
                            i, group, version.version, op.op_type
                        ));
                    }
                }
            }
        }

        if config.environment.namespace.is_empty() {
            issues.push("No namespace specified in environment configuration".to_string());
        }

        let mut seen = HashSet::new();
        for phase in &config.phases {
            if !seen.insert(phase.name.as_str()) {
                issues.push(format!("Phase '{}' is defined more than once", phase.name));
            }
            for group in &phase.groups {
                if !config.versions.iter().any(|v| v.groups.contains_key(group)) {
                    issues.push(format!(
                        "Phase mapping '{}' references non-existent group '{}'",
                        phase.name, group
                    ));
                }
            }
        }

        issues
    }
}
