//! Bottleneck detection and correlation engine for dashboard performance metrics
//!
//! This crate provides continuous bottleneck detection capabilities for:
//! - Declarative pattern matching over live metrics snapshots
//! - Weighted confidence scoring and impact banding
//! - Metric correlation and trend analysis over a bounded history
//! - Active bottleneck lifecycle tracking with a rolling archive
//! - Safety-gated automated remediation actions
//! - Derived insights: timelines, predictions, optimizations, risks

#![warn(missing_docs)]

pub mod actions;
pub mod alerting;
pub mod analyzer;
pub mod detector;
pub mod error;
pub mod history;
pub mod insights;
pub mod metrics;
pub mod patterns;

pub use actions::{ActionExecutor, ActionOutcome};
pub use alerting::{AlertSeverity, AlertSink, PerformanceAlert};
pub use analyzer::{
    calculate_impact, estimate_resolution_minutes, is_breached, BottleneckAnalysis, Correlation,
    CorrelationDirection, CorrelationStrength, ImpactLevel, MetricBreakdown, PatternAnalyzer,
    TrendClassification,
};
pub use detector::{
    AnalysisStats, BottleneckDetector, BottleneckEvent, BottleneckResolution, DetectedBottleneck,
    DetectorConfig, PatternOccurrence, ResolvedBy,
};
pub use error::{BottleneckDetectionError, BottleneckDetectionResult};
pub use history::{HistoryRecord, HistoryStore, MetricSample};
pub use insights::{
    ActiveBottleneckInsight, EngineInsights, InsightsEngine, OptimizationSuggestion,
    PredictedBottleneck, RiskAssessment, RiskLevel, TimelinePoint,
};
pub use metrics::{extract_metric_value, MetricsProvider, MetricsSnapshot};
pub use patterns::{
    builtin_patterns, AnomalyDetectorConfig, AutomatedAction, BottleneckCondition,
    BottleneckPattern, ComparisonOperator, PatternCategory, PatternRecommendation, PatternRegistry,
    PatternSeverity, Recommendation, RecommendationPriority, RolloutStrategy,
};
