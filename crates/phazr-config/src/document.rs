//! On-disk document shape
//!
//! ```yaml
//! versions:
//!   "1.0.0":
//!     infra: [ ... operations ... ]
//!     metadata: { ... }   # reserved key, never a group
//! phases: [ ... ]
//! environment: { name: staging, namespace: apps }
//! execution: { parallel: true }
//! metadata: { ... }
//! ```

use phazr_core::{
    EnvironmentConfig, Error, ExecutionConfig, Operation, OrchestratorConfig, Phase, Result,
    VersionConfig,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

const METADATA_KEY: &str = "metadata";

/// Supported file formats, picked by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(ConfigFormat::Yaml),
            Some("json") => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Parse text into a raw tree. JSON goes through the YAML value type so
    /// key order is kept.
    pub fn parse(self, text: &str) -> Result<Value> {
        Ok(match self {
            ConfigFormat::Yaml => serde_yaml::from_str(text)?,
            ConfigFormat::Json => serde_json::from_str(text)?,
        })
    }

    pub fn render(self, document: &Value) -> Result<String> {
        Ok(match self {
            ConfigFormat::Yaml => serde_yaml::to_string(document)?,
            ConfigFormat::Json => serde_json::to_string_pretty(document)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    versions: Mapping,
    #[serde(default)]
    phases: Vec<Phase>,
    environment: EnvironmentConfig,
    #[serde(default)]
    execution: ExecutionConfig,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    metadata: HashMap<String, JsonValue>,
}

/// Recursively merge `overlay` into `base`; non-mapping values are replaced
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) if existing.is_mapping() && value.is_mapping() => {
                        deep_merge(existing, value)
                    }
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn key_string(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::config(format!("Unsupported mapping key: {:?}", other))),
    }
}

fn parse_version(key: &str, body: Value) -> Result<VersionConfig> {
    let Value::Mapping(entries) = body else {
        return Err(Error::config(format!("Version {} must be a mapping", key)));
    };

    let mut groups = BTreeMap::new();
    let mut metadata = HashMap::new();
    for (name, value) in entries {
        let name = key_string(&name)?;
        if name == METADATA_KEY {
            metadata = serde_yaml::from_value(value)?;
            continue;
        }
        let operations: Vec<Arc<Operation>> = serde_yaml::from_value(value)?;
        groups.insert(name, operations);
    }

    VersionConfig::new(key, groups, metadata)
}

/// Build a configuration from a raw tree
pub fn parse_document(raw: Value) -> Result<OrchestratorConfig> {
    let raw = if raw.is_null() {
        Value::Mapping(Mapping::new())
    } else {
        raw
    };
    let document: ConfigDocument = serde_yaml::from_value(raw)?;

    let mut versions = Vec::with_capacity(document.versions.len());
    for (key, body) in document.versions {
        let key = key_string(&key)?;
        versions.push(parse_version(&key, body)?);
    }

    Ok(OrchestratorConfig {
        versions,
        phases: document.phases,
        environment: document.environment,
        execution: document.execution,
        metadata: document.metadata,
    })
}

/// Turn a configuration back into a raw tree, versions in declaration order
pub fn to_document(config: &OrchestratorConfig) -> Result<Value> {
    let mut versions = Mapping::new();
    for version in &config.versions {
        let mut body = Mapping::new();
        for (group, operations) in &version.groups {
            body.insert(
                Value::String(group.clone()),
                serde_yaml::to_value(operations)?,
            );
        }
        if !version.metadata.is_empty() {
            body.insert(
                Value::String(METADATA_KEY.to_string()),
                serde_yaml::to_value(&version.metadata)?,
            );
        }
        versions.insert(Value::String(version.version.clone()), Value::Mapping(body));
    }

    let document = ConfigDocument {
        versions,
        phases: config.phases.clone(),
        environment: config.environment.clone(),
        execution: config.execution.clone(),
        metadata: config.metadata.clone(),
    };
    Ok(serde_yaml::to_value(document)?)
}
