//! Phase definitions

use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

/// A named, orderable stage of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Identifier, unique within a run
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Presentation hint only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Group names resolved against the active version, in order
    #[serde(default)]
    pub groups: Vec<String>,
    /// Phases that must have completed earlier in the same run
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub continue_on_error: bool,
    /// Run every group of this phase with parallel execution
    #[serde(default)]
    pub parallel_groups: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Phase {
    /// Create an enabled phase with no groups
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            icon: None,
            groups: Vec::new(),
            depends_on: Vec::new(),
            continue_on_error: false,
            parallel_groups: false,
            enabled: true,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_groups(mut self, groups: &[&str]) -> Self {
        self.groups = groups.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn with_depends_on(mut self, phases: &[&str]) -> Self {
        self.depends_on = phases.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn with_parallel_groups(mut self, parallel: bool) -> Self {
        self.parallel_groups = parallel;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
