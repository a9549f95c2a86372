//! Built-in bottleneck pattern catalog

use super::types::{
    AnomalyDetectorConfig, AutomatedAction, BottleneckCondition, BottleneckPattern,
    ComparisonOperator, PatternCategory, PatternRecommendation, PatternSeverity,
    RecommendationPriority,
};

fn condition(
    metric: &str,
    operator: ComparisonOperator,
    threshold: f64,
    duration_secs: u64,
    weight: f64,
) -> BottleneckCondition {
    BottleneckCondition {
        metric: metric.to_string(),
        operator,
        threshold,
        duration_secs,
        weight,
    }
}

fn recommend(summary: &str, priority: RecommendationPriority) -> PatternRecommendation {
    PatternRecommendation {
        summary: summary.to_string(),
        priority,
    }
}

fn action(id: &str, name: &str, description: &str, script: &str, requires_approval: bool) -> AutomatedAction {
    AutomatedAction {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        script: script.to_string(),
        requires_approval,
    }
}

/// The built-in pattern catalog registered at detector construction.
///
/// Patterns may be added or removed at runtime through the registry; this
/// set covers the recurring degradation signatures of the dashboard
/// metrics feed.
pub fn builtin_patterns() -> Vec<BottleneckPattern> {
    vec![
        memory_leak(),
        high_response_time(),
        error_burst(),
        cache_thrash(),
        batch_overload(),
        compression_overhead(),
    ]
}

fn memory_leak() -> BottleneckPattern {
    BottleneckPattern {
        id: "memory-leak".to_string(),
        name: "Memory Leak".to_string(),
        description: "Rising response times with heavy cache eviction and slowing batches, \
                      consistent with memory pressure from leaked allocations"
            .to_string(),
        severity: PatternSeverity::Critical,
        category: PatternCategory::Capacity,
        conditions: vec![
            condition(
                "overall.averageResponseTime",
                ComparisonOperator::GreaterThan,
                200.0,
                300,
                30.0,
            ),
            condition(
                "caching.evictionRate",
                ComparisonOperator::GreaterThan,
                50.0,
                300,
                45.0,
            ),
            condition(
                "batching.averageBatchDuration",
                ComparisonOperator::GreaterThan,
                3000.0,
                300,
                25.0,
            ),
        ],
        primary_indicators: vec![
            "caching.evictionRate".to_string(),
            "overall.averageResponseTime".to_string(),
        ],
        correlated_indicators: vec!["batching.averageBatchDuration".to_string()],
        anomaly_detector: AnomalyDetectorConfig::default(),
        minimum_confidence: 85.0,
        impact_threshold: 70.0,
        recommendations: vec![
            recommend(
                "Restart affected workers to reclaim leaked memory",
                RecommendationPriority::High,
            ),
            recommend(
                "Raise the cache memory ceiling and re-check eviction pressure",
                RecommendationPriority::Medium,
            ),
            recommend(
                "Profile retained allocations along the request path",
                RecommendationPriority::Medium,
            ),
        ],
        automated_actions: vec![
            action(
                "grow-cache",
                "Increase cache memory",
                "Raises the cache memory ceiling to relieve eviction pressure",
                "increase-cache-memory",
                false,
            ),
            action(
                "flush-evictions",
                "Clear cache evictions",
                "Drops eviction backlog and resets eviction counters",
                "clear-cache-evictions",
                false,
            ),
        ],
    }
}

fn high_response_time() -> BottleneckPattern {
    BottleneckPattern {
        id: "high-response-time".to_string(),
        name: "Sustained High Response Time".to_string(),
        description: "Average and tail latency elevated across the aggregation window"
            .to_string(),
        severity: PatternSeverity::Warning,
        category: PatternCategory::Performance,
        conditions: vec![
            condition(
                "overall.averageResponseTime",
                ComparisonOperator::GreaterThan,
                500.0,
                120,
                50.0,
            ),
            condition(
                "overall.p95ResponseTime",
                ComparisonOperator::GreaterThan,
                1200.0,
                120,
                30.0,
            ),
            condition(
                "overall.errorRate",
                ComparisonOperator::GreaterThan,
                1.0,
                120,
                20.0,
            ),
        ],
        primary_indicators: vec![
            "overall.averageResponseTime".to_string(),
            "overall.p95ResponseTime".to_string(),
        ],
        correlated_indicators: vec![
            "overall.errorRate".to_string(),
            "caching.hitRate".to_string(),
        ],
        anomaly_detector: AnomalyDetectorConfig::default(),
        minimum_confidence: 70.0,
        impact_threshold: 60.0,
        recommendations: vec![
            recommend(
                "Shed load by lowering the upstream request rate",
                RecommendationPriority::High,
            ),
            recommend(
                "Review the slowest tool API calls in the aggregation window",
                RecommendationPriority::Medium,
            ),
            recommend(
                "Add caching in front of the hottest endpoints",
                RecommendationPriority::Low,
            ),
        ],
        automated_actions: vec![
            action(
                "throttle",
                "Reduce request rate",
                "Lowers the upstream polling rate until latency recovers",
                "reduce-request-rate",
                false,
            ),
            action(
                "breaker",
                "Enable circuit breaker",
                "Opens the circuit breaker toward the slowest upstream",
                "enable-circuit-breaker",
                true,
            ),
        ],
    }
}

fn error_burst() -> BottleneckPattern {
    BottleneckPattern {
        id: "error-burst".to_string(),
        name: "Error Burst".to_string(),
        description: "Sharp rise in error rate with failed requests accumulating".to_string(),
        severity: PatternSeverity::Critical,
        category: PatternCategory::Reliability,
        // Weights sum past 100; the first two conditions alone clear
        // the minimum confidence.
        conditions: vec![
            condition("overall.errorRate", ComparisonOperator::GreaterThan, 5.0, 60, 60.0),
            condition(
                "overall.failedRequests",
                ComparisonOperator::GreaterThan,
                100.0,
                60,
                35.0,
            ),
            condition(
                "overall.averageResponseTime",
                ComparisonOperator::GreaterThan,
                400.0,
                60,
                25.0,
            ),
        ],
        primary_indicators: vec![
            "overall.errorRate".to_string(),
            "overall.failedRequests".to_string(),
        ],
        correlated_indicators: vec!["overall.averageResponseTime".to_string()],
        anomaly_detector: AnomalyDetectorConfig::default(),
        minimum_confidence: 75.0,
        impact_threshold: 70.0,
        recommendations: vec![
            recommend(
                "Open the circuit breaker toward the failing upstream",
                RecommendationPriority::High,
            ),
            recommend(
                "Inspect recent deploys and upstream status pages",
                RecommendationPriority::High,
            ),
        ],
        automated_actions: vec![action(
            "breaker",
            "Enable circuit breaker",
            "Opens the circuit breaker toward the failing upstream",
            "enable-circuit-breaker",
            true,
        )],
    }
}

fn cache_thrash() -> BottleneckPattern {
    BottleneckPattern {
        id: "cache-thrash".to_string(),
        name: "Cache Thrashing".to_string(),
        description: "Low hit rate with churn-level evictions; the cache is cycling entries \
                      faster than they are reused"
            .to_string(),
        severity: PatternSeverity::Warning,
        category: PatternCategory::Efficiency,
        conditions: vec![
            condition("caching.hitRate", ComparisonOperator::LessThan, 60.0, 300, 45.0),
            condition(
                "caching.evictionRate",
                ComparisonOperator::GreaterThan,
                40.0,
                300,
                35.0,
            ),
            condition(
                "overall.averageResponseTime",
                ComparisonOperator::GreaterThan,
                250.0,
                300,
                20.0,
            ),
        ],
        primary_indicators: vec![
            "caching.hitRate".to_string(),
            "caching.evictionRate".to_string(),
        ],
        correlated_indicators: vec!["overall.averageResponseTime".to_string()],
        anomaly_detector: AnomalyDetectorConfig::default(),
        minimum_confidence: 65.0,
        impact_threshold: 50.0,
        recommendations: vec![
            recommend(
                "Grow the cache or shrink entry TTL spread",
                RecommendationPriority::Medium,
            ),
            recommend(
                "Check key cardinality for accidental per-request keys",
                RecommendationPriority::Medium,
            ),
        ],
        automated_actions: vec![
            action(
                "grow-cache",
                "Increase cache memory",
                "Raises the cache memory ceiling to relieve eviction pressure",
                "increase-cache-memory",
                false,
            ),
            action(
                "flush-evictions",
                "Clear cache evictions",
                "Drops eviction backlog and resets eviction counters",
                "clear-cache-evictions",
                false,
            ),
        ],
    }
}

fn batch_overload() -> BottleneckPattern {
    BottleneckPattern {
        id: "batch-overload".to_string(),
        name: "Batch Pipeline Overload".to_string(),
        description: "Batches taking too long while the queue deepens and throughput drops"
            .to_string(),
        severity: PatternSeverity::Warning,
        category: PatternCategory::Capacity,
        conditions: vec![
            condition(
                "batching.averageBatchDuration",
                ComparisonOperator::GreaterThan,
                2500.0,
                180,
                40.0,
            ),
            condition(
                "batching.queueDepth",
                ComparisonOperator::GreaterThan,
                50.0,
                180,
                35.0,
            ),
            condition("overall.throughput", ComparisonOperator::LessThan, 10.0, 180, 25.0),
        ],
        primary_indicators: vec![
            "batching.averageBatchDuration".to_string(),
            "batching.queueDepth".to_string(),
        ],
        correlated_indicators: vec!["overall.throughput".to_string()],
        anomaly_detector: AnomalyDetectorConfig::default(),
        minimum_confidence: 70.0,
        impact_threshold: 55.0,
        recommendations: vec![
            recommend(
                "Reduce the batch size to shorten per-batch latency",
                RecommendationPriority::High,
            ),
            recommend(
                "Scale batch workers before the queue saturates",
                RecommendationPriority::Medium,
            ),
        ],
        automated_actions: vec![action(
            "shrink-batches",
            "Reduce batch size",
            "Halves the batch size until queue depth recovers",
            "reduce-batch-size",
            false,
        )],
    }
}

fn compression_overhead() -> BottleneckPattern {
    BottleneckPattern {
        id: "compression-overhead".to_string(),
        name: "Compression Overhead".to_string(),
        description: "Compression spending time without meaningful size reduction".to_string(),
        severity: PatternSeverity::Info,
        category: PatternCategory::Efficiency,
        conditions: vec![
            condition(
                "compression.averageCompressionRatio",
                ComparisonOperator::LessThan,
                40.0,
                600,
                50.0,
            ),
            condition(
                "compression.averageCompressionTime",
                ComparisonOperator::GreaterThan,
                100.0,
                600,
                50.0,
            ),
        ],
        primary_indicators: vec![
            "compression.averageCompressionRatio".to_string(),
            "compression.averageCompressionTime".to_string(),
        ],
        correlated_indicators: vec!["overall.averageResponseTime".to_string()],
        anomaly_detector: AnomalyDetectorConfig::default(),
        minimum_confidence: 80.0,
        impact_threshold: 40.0,
        recommendations: vec![recommend(
            "Skip compression for small or already-compressed payloads",
            RecommendationPriority::Low,
        )],
        automated_actions: vec![],
    }
}
