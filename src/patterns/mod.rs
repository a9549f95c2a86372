//! Declarative bottleneck patterns: data model, registry, built-in catalog

mod catalog;
mod registry;
mod types;

pub use catalog::builtin_patterns;
pub use registry::PatternRegistry;
pub use types::{
    AnomalyDetectorConfig, AutomatedAction, BottleneckCondition, BottleneckPattern,
    ComparisonOperator, PatternCategory, PatternRecommendation, PatternSeverity,
    Recommendation, RecommendationPriority, RolloutStrategy,
};
