//! Aggregating prerequisite validator

use async_trait::async_trait;
use phazr_core::EnvironmentConfig;
use std::sync::Arc;
use tracing::{debug, info};

use crate::checks::{KubernetesValidator, ToolValidator};
use crate::report::{ValidationOutcome, ValidationReport};

/// A single independent check
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self) -> ValidationOutcome;
}

/// Validation capability consumed by the orchestrator
#[async_trait]
pub trait EnvironmentValidator: Send + Sync {
    /// Run every check for `environment` and the tools the run needs
    async fn validate(
        &self,
        environment: &EnvironmentConfig,
        required_tools: &[String],
    ) -> ValidationReport;
}

/// Runs tool checks for the required tools, a Kubernetes check when
/// `kubectl` is required, then any custom validators, in that order.
#[derive(Default)]
pub struct PrerequisiteValidator {
    validators: Vec<Arc<dyn Validator>>,
}

impl PrerequisiteValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a custom validator
    pub fn add_validator<V: Validator + 'static>(&mut self, validator: V) {
        self.validators.push(Arc::new(validator));
    }

    /// Builder form of [`add_validator`](Self::add_validator)
    pub fn with_validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.add_validator(validator);
        self
    }

    fn plan(
        &self,
        environment: &EnvironmentConfig,
        required_tools: &[String],
    ) -> Vec<Arc<dyn Validator>> {
        let mut validators: Vec<Arc<dyn Validator>> = required_tools
            .iter()
            .map(|tool| Arc::new(ToolValidator::new(tool)) as Arc<dyn Validator>)
            .collect();

        if required_tools.iter().any(|t| t == "kubectl") {
            validators.push(Arc::new(KubernetesValidator::new(
                &environment.namespace,
                environment.context.as_deref(),
            )));
        }

        validators.extend(self.validators.iter().cloned());
        validators
    }
}

#[async_trait]
impl EnvironmentValidator for PrerequisiteValidator {
    async fn validate(
        &self,
        environment: &EnvironmentConfig,
        required_tools: &[String],
    ) -> ValidationReport {
        let validators = self.plan(environment, required_tools);
        info!(count = validators.len(), "Running prerequisite validators");

        let mut outcomes = Vec::with_capacity(validators.len());
        for validator in validators {
            let outcome = validator.validate().await;
            debug!(validator = %outcome.validator, status = ?outcome.status, "Validator finished");
            outcomes.push(outcome);
        }

        ValidationReport::from_outcomes(outcomes)
    }
}
