//! Skip-condition and post-check evaluation

use async_trait::async_trait;

/// Evaluates `skip_if` conditions and `test_command` post-checks
#[async_trait]
pub trait ConditionEvaluator: Send + Sync {
    /// `true` skips the operation
    async fn evaluate_condition(&self, condition: &str) -> bool;

    /// `true` confirms a successful attempt
    async fn run_test_command(&self, command: &str) -> bool;
}

/// Never skips and accepts every post-check.
///
/// Real condition semantics are deliberately left to callers, who can
/// inject their own evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticConditions;

#[async_trait]
impl ConditionEvaluator for StaticConditions {
    async fn evaluate_condition(&self, _condition: &str) -> bool {
        false
    }

    async fn run_test_command(&self, _command: &str) -> bool {
        true
    }
}
