//! Phase Runner - resolves a phase's groups against a version and runs them

use phazr_core::{
    Error, ExecutionResult, Operation, OrchestratorConfig, Phase, PhaseResult, Result,
    VersionConfig,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::engine::ExecutionEngine;
use crate::reporter::Reporter;

/// Runs phases group by group
#[derive(Clone)]
pub struct PhaseRunner {
    config: Arc<OrchestratorConfig>,
    engine: ExecutionEngine,
    reporter: Arc<dyn Reporter>,
}

impl PhaseRunner {
    pub fn new(
        config: Arc<OrchestratorConfig>,
        engine: ExecutionEngine,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            engine,
            reporter,
        }
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// Run `phase` against the version named `version`
    pub async fn run_phase(&self, phase: &Phase, version: &str) -> Result<PhaseResult> {
        let version_config = self
            .config
            .version(version)
            .ok_or_else(|| Error::VersionNotFound(version.to_string()))?;
        Ok(self.run(phase, version_config).await)
    }

    /// Run `phase` against an already resolved version
    pub async fn run(&self, phase: &Phase, version: &VersionConfig) -> PhaseResult {
        if phase.groups.is_empty() {
            self.reporter.warning(&format!(
                "No operations configured for phase: {}",
                phase.name
            ));
            return PhaseResult::empty(&phase.name, Some(phase.clone()), &version.version);
        }

        let total: usize = phase
            .groups
            .iter()
            .filter_map(|group| version.group(group))
            .map(|ops| ops.len())
            .sum();
        info!(phase = %phase.name, version = %version.version, total, "Running phase");
        self.reporter.phase_started(phase, total);

        let start = Instant::now();
        let mut results: Vec<ExecutionResult> = Vec::with_capacity(total);
        // Declared position; a group that stops early leaves a gap
        let mut index = 0;

        for group in &phase.groups {
            let Some(operations) = version.group(group) else {
                warn!(phase = %phase.name, group = %group, "Group not found in version");
                self.reporter
                    .warning(&format!("Group '{}' not found in version config", group));
                continue;
            };

            let group_results = if self.should_parallelize(phase, operations) {
                self.engine
                    .execute_parallel(operations, index, total)
                    .await
            } else {
                self.engine
                    .execute_sequential(operations, index, total)
                    .await
            };
            index += operations.len();

            let failed = group_results.iter().any(|r| !r.success);
            results.extend(group_results);

            if failed && !phase.continue_on_error && !self.config.execution.continue_on_error {
                self.reporter
                    .error(&format!("Group {} had failures, stopping phase", group));
                break;
            }
        }

        let result = PhaseResult::from_results(
            &phase.name,
            Some(phase.clone()),
            &version.version,
            results,
            start.elapsed().as_secs_f64(),
        );
        self.reporter.phase_summary(&result);
        result
    }

    /// Whether a group of `phase` runs concurrently
    pub fn should_parallelize(&self, phase: &Phase, operations: &[Arc<Operation>]) -> bool {
        phase.parallel_groups
            || (self.config.execution.parallel
                && self.config.execution.is_parallel_safe(operations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::StaticConditions;
    use crate::testing::{op, RecordingReporter, ScriptedHandler};
    use phazr_core::{EnvironmentConfig, ExecutionConfig, OperationType};
    use phazr_handlers::HandlerRegistry;
    use std::collections::{BTreeMap, HashMap};

    fn version(groups: &[(&str, Vec<Arc<Operation>>)]) -> VersionConfig {
        let groups: BTreeMap<_, _> = groups
            .iter()
            .map(|(name, ops)| (name.to_string(), ops.clone()))
            .collect();
        VersionConfig::new("1.0.0", groups, HashMap::new()).unwrap()
    }

    fn runner(
        execution: ExecutionConfig,
        version: VersionConfig,
    ) -> (PhaseRunner, Arc<ScriptedHandler>, Arc<RecordingReporter>) {
        let handler = Arc::new(ScriptedHandler::default());
        let reporter = Arc::new(RecordingReporter::default());
        let mut registry = HandlerRegistry::new();
        registry.register_arc(OperationType::ScriptExec, handler.clone());
        registry.register_arc(OperationType::KubectlRestart, handler.clone());

        let config = Arc::new(
            OrchestratorConfig::new(EnvironmentConfig::new("test", "default"))
                .with_execution(execution)
                .with_version(version),
        );
        let engine = ExecutionEngine::new(
            config.clone(),
            Arc::new(registry),
            Arc::new(StaticConditions),
            reporter.clone(),
        );
        (PhaseRunner::new(config, engine, reporter.clone()), handler, reporter)
    }

    #[tokio::test]
    async fn test_unknown_version_is_fatal() {
        let (runner, _, _) = runner(
            ExecutionConfig::default(),
            version(&[("g", vec![op("ok", "A")])]),
        );

        let err = runner
            .run_phase(&Phase::new("p").with_groups(&["g"]), "9.9.9")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::VersionNotFound(ref v) if v == "9.9.9"));
    }

    #[tokio::test]
    async fn test_phase_without_groups_is_empty_success() {
        let (runner, handler, reporter) = runner(
            ExecutionConfig::default(),
            version(&[("g", vec![op("ok", "A")])]),
        );

        let result = runner.run_phase(&Phase::new("noop"), "1.0.0").await.unwrap();

        assert_eq!(result.total_operations, 0);
        assert!(result.is_successful());
        assert_eq!(handler.calls(), 0);
        assert_eq!(
            reporter.events(),
            ["warning:No operations configured for phase: noop"]
        );
    }

    #[tokio::test]
    async fn test_missing_group_is_warning() {
        let (runner, _, reporter) = runner(
            ExecutionConfig::default(),
            version(&[("g", vec![op("ok", "A")])]),
        );
        let phase = Phase::new("p").with_groups(&["absent", "g"]);

        let result = runner.run_phase(&phase, "1.0.0").await.unwrap();

        assert_eq!(result.total_operations, 1);
        assert!(result.is_successful());
        let events = reporter.events();
        assert_eq!(events[0], "phase:p:1");
        assert_eq!(
            events[1],
            "warning:Group 'absent' not found in version config"
        );
    }

    // g1 = [ok, fail(fail_on_error=false), ok], g2 = [ok]
    fn tolerant_first_group() -> VersionConfig {
        let tolerated = Arc::new(
            Operation::new(OperationType::ScriptExec, "fail", "B").with_fail_on_error(false),
        );
        version(&[
            ("g1", vec![op("ok", "A"), tolerated, op("ok", "C")]),
            ("g2", vec![op("ok", "D")]),
        ])
    }

    #[tokio::test]
    async fn test_group_failure_stops_phase() {
        let (runner, handler, reporter) =
            runner(ExecutionConfig::default(), tolerant_first_group());
        let phase = Phase::new("p").with_groups(&["g1", "g2"]);

        let result = runner.run_phase(&phase, "1.0.0").await.unwrap();

        assert_eq!(result.total_operations, 3);
        assert_eq!(result.successful_operations, 2);
        assert_eq!(result.failed_operations, 1);
        assert!(!result.is_successful());
        assert_eq!(handler.calls(), 3);
        assert!(reporter
            .events()
            .contains(&"error:Group g1 had failures, stopping phase".to_string()));
    }

    #[tokio::test]
    async fn test_phase_continue_on_error_runs_remaining_groups() {
        let (runner, handler, _) = runner(ExecutionConfig::default(), tolerant_first_group());
        let phase = Phase::new("p")
            .with_groups(&["g1", "g2"])
            .with_continue_on_error(true);

        let result = runner.run_phase(&phase, "1.0.0").await.unwrap();

        assert_eq!(result.total_operations, 4);
        assert_eq!(result.failed_operations, 1);
        assert_eq!(handler.calls(), 4);
    }

    #[tokio::test]
    async fn test_global_continue_on_error_runs_remaining_groups() {
        let execution = ExecutionConfig {
            continue_on_error: true,
            ..ExecutionConfig::default()
        };
        let (runner, _, _) = runner(execution, tolerant_first_group());
        let phase = Phase::new("p").with_groups(&["g1", "g2"]);

        let result = runner.run_phase(&phase, "1.0.0").await.unwrap();

        assert_eq!(result.total_operations, 4);
    }

    #[tokio::test]
    async fn test_skip_operations_are_not_failures() {
        let skip = Arc::new(Operation::new(OperationType::Skip, "", "Placeholder"));
        let (runner, _, _) = runner(
            ExecutionConfig {
                continue_on_error: true,
                ..ExecutionConfig::default()
            },
            version(&[("g", vec![skip, op("ok", "A")])]),
        );

        let result = runner
            .run_phase(&Phase::new("p").with_groups(&["g"]), "1.0.0")
            .await
            .unwrap();

        assert_eq!(result.total_operations, 1);
        assert_eq!(result.skipped_operations, 1);
        assert_eq!(result.failed_operations, 0);
        assert!(result.is_successful());
    }

    #[test]
    fn test_parallel_decision() {
        let restart = Arc::new(Operation::new(OperationType::KubectlRestart, "", "Restart"));
        let safe = vec![op("ok", "A"), op("ok", "B")];
        let unsafe_group = vec![op("ok", "A"), restart];
        let plain = Phase::new("p");
        let forced = Phase::new("p").with_parallel_groups(true);

        let (sequential, _, _) = runner(ExecutionConfig::default(), version(&[]));
        assert!(!sequential.should_parallelize(&plain, &safe));
        assert!(sequential.should_parallelize(&forced, &unsafe_group));

        let (parallel, _, _) = runner(
            ExecutionConfig {
                parallel: true,
                ..ExecutionConfig::default()
            },
            version(&[]),
        );
        assert!(parallel.should_parallelize(&plain, &safe));
        assert!(!parallel.should_parallelize(&plain, &unsafe_group));
        assert!(parallel.should_parallelize(&forced, &unsafe_group));
    }

    #[tokio::test]
    async fn test_indices_span_groups() {
        let (runner, _, reporter) = runner(
            ExecutionConfig::default(),
            version(&[
                ("g1", vec![op("ok", "A")]),
                ("g2", vec![op("ok", "B"), op("ok", "C")]),
            ]),
        );
        let phase = Phase::new("p").with_groups(&["g1", "g2"]);

        runner.run_phase(&phase, "1.0.0").await.unwrap();

        let starts: Vec<_> = reporter
            .events()
            .into_iter()
            .filter(|e| e.starts_with("start:"))
            .collect();
        assert_eq!(starts, ["start:A:1/3", "start:B:2/3", "start:C:3/3"]);
        assert_eq!(reporter.events().last().map(String::as_str), Some("summary:p"));
    }

    #[tokio::test]
    async fn test_indices_keep_declared_positions_after_early_stop() {
        let (runner, _, reporter) = runner(
            ExecutionConfig::default(),
            version(&[
                ("g1", vec![op("ok", "A"), op("fail", "B"), op("ok", "C")]),
                ("g2", vec![op("ok", "D")]),
            ]),
        );
        let phase = Phase::new("p")
            .with_groups(&["g1", "g2"])
            .with_continue_on_error(true);

        let result = runner.run_phase(&phase, "1.0.0").await.unwrap();

        let starts: Vec<_> = reporter
            .events()
            .into_iter()
            .filter(|e| e.starts_with("start:"))
            .collect();
        assert_eq!(starts, ["start:A:1/4", "start:B:2/4", "start:D:4/4"]);
        assert_eq!(result.total_operations, 3);
    }
}
