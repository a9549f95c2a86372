//! Declarative bottleneck pattern data model

use serde::{Deserialize, Serialize};

/// Pattern severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternSeverity {
    /// Critical patterns alert immediately on detection
    Critical,
    /// Warning patterns indicate degradation worth investigating
    Warning,
    /// Informational patterns track low-impact inefficiencies
    Info,
}

/// Pattern category classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternCategory {
    /// Latency and throughput degradation
    Performance,
    /// Resource exhaustion and saturation
    Capacity,
    /// Error rates and failure cascades
    Reliability,
    /// Wasted work and suboptimal resource usage
    Efficiency,
}

/// Comparison operators for pattern conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    /// Value strictly above threshold
    GreaterThan,
    /// Value strictly below threshold
    LessThan,
    /// Value at or above threshold
    GreaterThanOrEqual,
    /// Value at or below threshold
    LessThanOrEqual,
    /// Value equal to threshold
    Equal,
}

/// A single weighted threshold condition within a pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleneckCondition {
    /// Dotted metric path, e.g. `overall.averageResponseTime`
    pub metric: String,
    /// Comparison applied between the extracted value and the threshold
    pub operator: ComparisonOperator,
    /// Threshold value
    pub threshold: f64,
    /// Advisory breach duration in seconds; not a sliding-window check
    pub duration_secs: u64,
    /// Confidence weight (0-100) contributed when the condition breaches
    pub weight: f64,
}

/// Advisory anomaly detection tuning carried on a pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyDetectorConfig {
    /// Sample window size
    pub window_size: usize,
    /// Detection sensitivity in standard deviations
    pub sensitivity: f64,
    /// Baseline establishment period in seconds
    pub baseline_period_secs: u64,
}

impl Default for AnomalyDetectorConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            sensitivity: 2.5,
            baseline_period_secs: 3600,
        }
    }
}

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationPriority {
    /// Act immediately
    High,
    /// Act soon
    Medium,
    /// Act when convenient
    Low,
}

/// Remediation advice declared on a pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRecommendation {
    /// What to do
    pub summary: String,
    /// How urgently to do it
    pub priority: RecommendationPriority,
}

/// Rollout strategy for applying a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RolloutStrategy {
    /// Apply everywhere at once
    Immediate,
    /// Ramp up progressively
    Gradual,
    /// Trial on a small slice first
    Canary,
}

/// Recommendation attached to a detected bottleneck.
///
/// Built from the pattern's declared recommendations at detection time,
/// annotated with execution defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// What to do
    pub summary: String,
    /// How urgently to do it
    pub priority: RecommendationPriority,
    /// Whether the recommendation is applied automatically
    pub automated: bool,
    /// How the change should be rolled out
    pub rollout_strategy: RolloutStrategy,
}

impl From<&PatternRecommendation> for Recommendation {
    fn from(rec: &PatternRecommendation) -> Self {
        Self {
            summary: rec.summary.clone(),
            priority: rec.priority,
            automated: false,
            rollout_strategy: RolloutStrategy::Gradual,
        }
    }
}

/// Pre-approved remediation routine a pattern may reference.
///
/// The `script` names a local routine on the executor's allow-list; it is
/// never an arbitrary command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomatedAction {
    /// Unique action id within the pattern
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// What the routine does
    pub description: String,
    /// Allow-listed script name
    pub script: String,
    /// Whether an operator must approve before execution
    pub requires_approval: bool,
}

/// A named, declarative bottleneck signature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleneckPattern {
    /// Unique pattern id
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// What the pattern indicates
    pub description: String,
    /// Severity classification
    pub severity: PatternSeverity,
    /// Category classification
    pub category: PatternCategory,
    /// Ordered weighted conditions
    pub conditions: Vec<BottleneckCondition>,
    /// Metric paths driving the pattern
    pub primary_indicators: Vec<String>,
    /// Metric paths expected to co-move with the primary indicators
    pub correlated_indicators: Vec<String>,
    /// Advisory anomaly detection tuning
    pub anomaly_detector: AnomalyDetectorConfig,
    /// Minimum confidence (0-100) required to materialize a detection
    pub minimum_confidence: f64,
    /// Impact score above which the pattern is considered impactful
    pub impact_threshold: f64,
    /// Ordered remediation advice
    pub recommendations: Vec<PatternRecommendation>,
    /// Pre-approved remediation routines
    pub automated_actions: Vec<AutomatedAction>,
}

impl BottleneckPattern {
    /// All indicator paths, primary first, correlated after, deduplicated.
    pub fn indicator_paths(&self) -> Vec<String> {
        let mut paths = self.primary_indicators.clone();
        for path in &self.correlated_indicators {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        paths
    }
}
