//! Environment variable overrides for the execution section
//!
//! | Variable | Field |
//! |---|---|
//! | `PHAZR_DRY_RUN` | `dry_run` |
//! | `PHAZR_PARALLEL` | `parallel` |
//! | `PHAZR_MAX_PARALLEL` | `max_parallel` |
//! | `PHAZR_CONTINUE_ON_ERROR` | `continue_on_error` |
//! | `PHAZR_VERBOSE` | `verbose` |
//! | `PHAZR_LOG_LEVEL` | `log_level` |

use phazr_core::ExecutionConfig;
use tracing::{debug, warn};

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Apply overrides from the process environment
pub fn apply_env_overrides(execution: &mut ExecutionConfig) {
    apply_overrides(execution, |key| {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    });
}

/// Apply overrides from any key lookup
pub fn apply_overrides<F>(execution: &mut ExecutionConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let flags: [(&str, &mut bool); 4] = [
        ("PHAZR_DRY_RUN", &mut execution.dry_run),
        ("PHAZR_PARALLEL", &mut execution.parallel),
        ("PHAZR_CONTINUE_ON_ERROR", &mut execution.continue_on_error),
        ("PHAZR_VERBOSE", &mut execution.verbose),
    ];
    for (key, field) in flags {
        if let Some(value) = lookup(key) {
            *field = parse_bool(&value);
            debug!(key, value = *field, "Execution override");
        }
    }

    if let Some(value) = lookup("PHAZR_MAX_PARALLEL") {
        match value.parse() {
            Ok(max_parallel) => execution.max_parallel = max_parallel,
            Err(_) => warn!(value = %value, "Ignoring invalid PHAZR_MAX_PARALLEL"),
        }
    }

    if let Some(level) = lookup("PHAZR_LOG_LEVEL") {
        execution.log_level = level;
    }
}
