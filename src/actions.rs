//! Safety-gated execution of pre-approved remediation actions

use crate::detector::DetectedBottleneck;
use crate::error::{BottleneckDetectionError, BottleneckDetectionResult};
use crate::patterns::{AutomatedAction, BottleneckPattern};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Scripts the executor is allowed to run.
///
/// Pattern data is runtime-configurable, so a pattern can only ever name
/// a routine from this fixed list; everything else fails closed. This
/// boundary is what keeps externally supplied pattern definitions from
/// reaching arbitrary code.
const SAFE_ACTION_SCRIPTS: [&str; 5] = [
    "reduce-request-rate",
    "enable-circuit-breaker",
    "increase-cache-memory",
    "clear-cache-evictions",
    "reduce-batch-size",
];

/// Result of an automated action execution attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Whether the action ran to completion
    pub success: bool,
    /// What happened, or why the action was refused
    pub message: String,
    /// Routine output when the action ran
    pub result: Option<Value>,
}

impl ActionOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            result: None,
        }
    }
}

/// Executes pre-approved remediation routines against active bottlenecks
#[derive(Debug, Default)]
pub struct ActionExecutor;

impl ActionExecutor {
    /// Create an executor.
    pub fn new() -> Self {
        Self
    }

    /// Execute one of the pattern's declared automated actions against a
    /// bottleneck.
    ///
    /// Refuses actions that require approval and scripts outside the
    /// allow-list; routine failures surface as failed outcomes rather
    /// than errors.
    pub fn execute(
        &self,
        pattern: &BottleneckPattern,
        bottleneck: &DetectedBottleneck,
        action_id: &str,
    ) -> ActionOutcome {
        let Some(action) = Self::find_action(pattern, action_id) else {
            return ActionOutcome::failure(format!(
                "Action not found: {action_id} on pattern {}",
                pattern.id
            ));
        };

        if action.requires_approval {
            warn!(
                action_id = %action.id,
                bottleneck_id = %bottleneck.id,
                "refusing automated action pending approval"
            );
            return ActionOutcome::failure(format!(
                "Action '{}' requires approval before execution",
                action.name
            ));
        }

        match self.run_allowlisted(&action.script, bottleneck) {
            Ok(result) => {
                info!(
                    action_id = %action.id,
                    script = %action.script,
                    bottleneck_id = %bottleneck.id,
                    "automated action executed"
                );
                ActionOutcome {
                    success: true,
                    message: format!("Executed '{}' for bottleneck {}", action.name, bottleneck.id),
                    result: Some(result),
                }
            }
            Err(e) => ActionOutcome::failure(e.to_string()),
        }
    }

    /// Look up a pattern's declared automated action by id.
    pub fn describe(pattern: &BottleneckPattern, action_id: &str) -> Option<AutomatedAction> {
        Self::find_action(pattern, action_id).cloned()
    }

    fn find_action<'a>(
        pattern: &'a BottleneckPattern,
        action_id: &str,
    ) -> Option<&'a AutomatedAction> {
        pattern.automated_actions.iter().find(|a| a.id == action_id)
    }

    fn run_allowlisted(
        &self,
        script: &str,
        bottleneck: &DetectedBottleneck,
    ) -> BottleneckDetectionResult<Value> {
        if !SAFE_ACTION_SCRIPTS.contains(&script) {
            return Err(BottleneckDetectionError::ActionExecutionFailed {
                script: script.to_string(),
                reason: "Unsafe or unknown action script".to_string(),
            });
        }

        let result = match script {
            "reduce-request-rate" => json!({
                "applied": "rate-limit",
                "requestRateFactor": 0.5,
                "bottleneckId": bottleneck.id,
            }),
            "enable-circuit-breaker" => json!({
                "applied": "circuit-breaker",
                "state": "open",
                "cooldownSecs": 120,
                "bottleneckId": bottleneck.id,
            }),
            "increase-cache-memory" => json!({
                "applied": "cache-resize",
                "memoryLimitFactor": 1.5,
                "bottleneckId": bottleneck.id,
            }),
            "clear-cache-evictions" => json!({
                "applied": "eviction-reset",
                "clearedBacklog": true,
                "bottleneckId": bottleneck.id,
            }),
            "reduce-batch-size" => json!({
                "applied": "batch-resize",
                "batchSizeFactor": 0.5,
                "bottleneckId": bottleneck.id,
            }),
            _ => unreachable!("script passed allow-list membership"),
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::ImpactLevel;
    use crate::patterns::{
        AnomalyDetectorConfig, BottleneckCondition, ComparisonOperator, PatternCategory,
        PatternSeverity,
    };
    use chrono::Utc;
    use ordered_float::OrderedFloat;
    use std::collections::HashMap;

    fn pattern_with_actions(actions: Vec<AutomatedAction>) -> BottleneckPattern {
        BottleneckPattern {
            id: "cache-thrash".to_string(),
            name: "Cache Thrashing".to_string(),
            description: String::new(),
            severity: PatternSeverity::Warning,
            category: PatternCategory::Efficiency,
            conditions: vec![BottleneckCondition {
                metric: "caching.hitRate".to_string(),
                operator: ComparisonOperator::LessThan,
                threshold: 60.0,
                duration_secs: 300,
                weight: 100.0,
            }],
            primary_indicators: vec!["caching.hitRate".to_string()],
            correlated_indicators: vec![],
            anomaly_detector: AnomalyDetectorConfig::default(),
            minimum_confidence: 65.0,
            impact_threshold: 50.0,
            recommendations: vec![],
            automated_actions: actions,
        }
    }

    fn action_with_script(script: &str, requires_approval: bool) -> AutomatedAction {
        AutomatedAction {
            id: "act-1".to_string(),
            name: "Test Action".to_string(),
            description: String::new(),
            script: script.to_string(),
            requires_approval,
        }
    }

    fn active_bottleneck() -> DetectedBottleneck {
        DetectedBottleneck {
            id: "cache-thrash-1700000000000".to_string(),
            pattern_id: "cache-thrash".to_string(),
            timestamp: Utc::now(),
            confidence: OrderedFloat(80.0),
            impact: ImpactLevel::Moderate,
            metrics: HashMap::new(),
            correlations: vec![],
            recommendations: vec![],
            resolved: false,
            resolution: None,
            resolution_time: None,
        }
    }

    #[test]
    fn test_execute_allowlisted_script() {
        let executor = ActionExecutor::new();
        let pattern = pattern_with_actions(vec![action_with_script("increase-cache-memory", false)]);
        let bottleneck = active_bottleneck();

        let outcome = executor.execute(&pattern, &bottleneck, "act-1");
        assert!(outcome.success);
        assert!(outcome.message.contains("Test Action"));

        let result = outcome.result.unwrap();
        assert_eq!(result["applied"], "cache-resize");
        assert_eq!(result["bottleneckId"], bottleneck.id.as_str());
    }

    #[test]
    fn test_every_allowlisted_script_runs() {
        let executor = ActionExecutor::new();
        let bottleneck = active_bottleneck();

        for script in SAFE_ACTION_SCRIPTS {
            let pattern = pattern_with_actions(vec![action_with_script(script, false)]);
            let outcome = executor.execute(&pattern, &bottleneck, "act-1");
            assert!(outcome.success, "script {script} should execute");
            assert!(outcome.result.is_some());
        }
    }

    #[test]
    fn test_unknown_script_fails_closed() {
        let executor = ActionExecutor::new();
        let pattern = pattern_with_actions(vec![action_with_script("rm -rf /", false)]);
        let bottleneck = active_bottleneck();

        let outcome = executor.execute(&pattern, &bottleneck, "act-1");
        assert!(!outcome.success);
        assert!(outcome.message.contains("Unsafe or unknown action script"));
        assert!(outcome.result.is_none());
    }

    #[test]
    fn test_approval_required_refuses_execution() {
        let executor = ActionExecutor::new();
        let pattern = pattern_with_actions(vec![action_with_script("enable-circuit-breaker", true)]);
        let bottleneck = active_bottleneck();

        let outcome = executor.execute(&pattern, &bottleneck, "act-1");
        assert!(!outcome.success);
        assert!(outcome.message.contains("requires approval"));
        assert!(outcome.result.is_none());
    }

    #[test]
    fn test_unknown_action_id() {
        let executor = ActionExecutor::new();
        let pattern = pattern_with_actions(vec![action_with_script("reduce-batch-size", false)]);
        let bottleneck = active_bottleneck();

        let outcome = executor.execute(&pattern, &bottleneck, "no-such-action");
        assert!(!outcome.success);
        assert!(outcome.message.contains("Action not found"));
    }

    #[test]
    fn test_describe_returns_declared_action() {
        let pattern = pattern_with_actions(vec![action_with_script("reduce-request-rate", false)]);

        let described = ActionExecutor::describe(&pattern, "act-1").unwrap();
        assert_eq!(described.script, "reduce-request-rate");
        assert!(ActionExecutor::describe(&pattern, "other").is_none());
    }
}
