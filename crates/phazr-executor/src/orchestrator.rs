//! Orchestration Driver
//!
//! Walks the configured phases in declaration order, skipping disabled
//! phases and phases whose dependencies did not run earlier in the same run.

use phazr_core::{Error, OrchestratorConfig, Phase, PhaseResult, Result};
use phazr_handlers::HandlerRegistry;
use phazr_validators::{EnvironmentValidator, PrerequisiteValidator, ValidationReport};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::conditions::{ConditionEvaluator, StaticConditions};
use crate::engine::ExecutionEngine;
use crate::phase::PhaseRunner;
use crate::reporter::{Reporter, TracingReporter};

/// Builder for [`Orchestrator`]; every collaborator is optional
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    registry: Option<HandlerRegistry>,
    validator: Option<Arc<dyn EnvironmentValidator>>,
    reporter: Option<Arc<dyn Reporter>>,
    conditions: Option<Arc<dyn ConditionEvaluator>>,
    span: Option<Span>,
}

impl OrchestratorBuilder {
    /// Use this registry as-is instead of the built-in handlers
    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn validator(mut self, validator: Arc<dyn EnvironmentValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn conditions(mut self, conditions: Arc<dyn ConditionEvaluator>) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Parent span for everything the orchestrator logs
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let mut seen = HashSet::new();
        for phase in &self.config.phases {
            if !seen.insert(phase.name.as_str()) {
                return Err(Error::DuplicatePhase(phase.name.clone()));
            }
        }

        let span = self.span.unwrap_or_else(|| {
            info_span!(
                "orchestrator",
                environment = %self.config.environment.name,
                namespace = %self.config.environment.namespace
            )
        });
        let config = Arc::new(self.config);
        let registry = Arc::new(
            self.registry
                .unwrap_or_else(HandlerRegistry::with_builtin_handlers),
        );
        let reporter = self
            .reporter
            .unwrap_or_else(|| Arc::new(TracingReporter) as Arc<dyn Reporter>);
        let conditions = self
            .conditions
            .unwrap_or_else(|| Arc::new(StaticConditions) as Arc<dyn ConditionEvaluator>);
        let validator = self.validator.unwrap_or_else(|| {
            Arc::new(PrerequisiteValidator::new()) as Arc<dyn EnvironmentValidator>
        });

        debug!(handlers = registry.len(), phases = config.phases.len(), "Orchestrator built");

        let engine = ExecutionEngine::new(config.clone(), registry, conditions, reporter.clone());
        let runner = PhaseRunner::new(config.clone(), engine, reporter.clone());

        Ok(Orchestrator {
            config,
            runner,
            validator,
            reporter,
            span,
        })
    }
}

/// Runs phases of a configuration against one of its versions
pub struct Orchestrator {
    config: Arc<OrchestratorConfig>,
    runner: PhaseRunner,
    validator: Arc<dyn EnvironmentValidator>,
    reporter: Arc<dyn Reporter>,
    span: Span,
}

impl Orchestrator {
    /// Build with default collaborators
    pub fn new(config: OrchestratorConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: OrchestratorConfig) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            registry: None,
            validator: None,
            reporter: None,
            conditions: None,
            span: None,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        self.runner.engine().registry()
    }

    /// Tools the configured operations need; `kubectl` if any operation is
    /// of a Kubernetes type
    pub fn required_tools(&self) -> Vec<String> {
        let mut tools = Vec::new();
        if self.config.operations().any(|op| op.op_type.is_kubernetes()) {
            tools.push("kubectl".to_string());
        }
        tools
    }

    pub async fn validate_prerequisites(&self) -> ValidationReport {
        let tools = self.required_tools();
        let report = self
            .validator
            .validate(&self.config.environment, &tools)
            .instrument(self.span.clone())
            .await;
        self.reporter.validation_report(&report);
        report
    }

    /// Run every enabled phase in order; `None` picks the first declared version
    pub async fn run_full_setup(&self, version: Option<&str>) -> Result<Vec<PhaseResult>> {
        let version = self.resolve_version(version)?;
        let span = info_span!(parent: &self.span, "run", run_id = %Uuid::new_v4(), version = %version);

        self.run_phases(&version).instrument(span).await
    }

    /// Run a single phase; `None` picks the first declared version
    pub async fn run_phase(&self, phase: &Phase, version: Option<&str>) -> Result<PhaseResult> {
        let version = self.resolve_version(version)?;
        self.runner
            .run_phase(phase, &version)
            .instrument(self.span.clone())
            .await
    }

    pub async fn run_phase_by_name(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<PhaseResult> {
        let phase = self
            .config
            .phase(name)
            .ok_or_else(|| Error::PhaseNotFound(name.to_string()))?;
        self.run_phase(phase, version).await
    }

    async fn run_phases(&self, version: &str) -> Result<Vec<PhaseResult>> {
        info!(phases = self.config.phases.len(), "Starting full setup");
        self.reporter.header();

        let mut results = Vec::new();
        let mut completed: HashSet<&str> = HashSet::new();

        for phase in &self.config.phases {
            if !phase.enabled {
                debug!(phase = %phase.name, "Phase disabled");
                self.reporter
                    .info(&format!("Skipping disabled phase: {}", phase.name));
                continue;
            }

            let missing: Vec<&str> = phase
                .depends_on
                .iter()
                .map(String::as_str)
                .filter(|dep| !completed.contains(dep))
                .collect();
            if !missing.is_empty() {
                warn!(phase = %phase.name, missing = ?missing, "Dependencies not met");
                self.reporter.warning(&format!(
                    "Skipping phase {}: dependencies not met ({})",
                    phase.name,
                    missing.join(", ")
                ));
                continue;
            }

            let result = self.runner.run_phase(phase, version).await?;
            completed.insert(phase.name.as_str());
            let stop = !result.is_successful()
                && !phase.continue_on_error
                && !self.config.execution.continue_on_error;
            results.push(result);

            if stop {
                self.reporter
                    .error(&format!("Phase {} failed, stopping execution", phase.name));
                break;
            }
        }

        self.reporter.run_summary(&results);
        info!(phases_run = results.len(), "Full setup finished");
        Ok(results)
    }

    fn resolve_version(&self, version: Option<&str>) -> Result<String> {
        match version {
            Some(key) => self
                .config
                .version(key)
                .map(|v| v.version.clone())
                .ok_or_else(|| Error::VersionNotFound(key.to_string())),
            None => self
                .config
                .default_version()
                .map(|v| v.version.clone())
                .ok_or(Error::NoVersions),
        }
    }
}
