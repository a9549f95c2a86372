//! Higher-level read-only views derived from detector state and metric
//! history: timelines, predictions, optimizations, risk assessments

use crate::detector::DetectedBottleneck;
use crate::history::MetricSample;
use crate::metrics::extract_metric_value;
use crate::patterns::PatternSeverity;
use chrono::{DateTime, Duration, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Mitigation progress reported for a bottleneck still being worked.
const MITIGATION_IN_PROGRESS: f64 = 35.0;

/// Minimum samples required before predictions are attempted.
const PREDICTION_MIN_SAMPLES: usize = 5;

/// Relative increase between window halves that counts as rising.
const PREDICTION_RISE_THRESHOLD: f64 = 0.10;

const CACHE_HIT_RATE_FLOOR: f64 = 75.0;
const COMPRESSION_RATIO_FLOOR: f64 = 50.0;
const RISK_RESPONSE_TIME_CEILING: f64 = 300.0;
const RISK_ERROR_RATE_CEILING: f64 = 2.0;

/// One point on a bottleneck timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinePoint {
    /// When the point applies
    pub timestamp: DateTime<Utc>,
    /// What the point marks
    pub label: String,
    /// Confidence at that point
    pub confidence: OrderedFloat<f64>,
}

/// Timeline and mitigation view for one active bottleneck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveBottleneckInsight {
    /// Bottleneck id
    pub bottleneck_id: String,
    /// Pattern that fired
    pub pattern_id: String,
    /// Baseline and detection points
    pub timeline: Vec<TimelinePoint>,
    /// Mitigation progress percentage
    pub mitigation_progress: OrderedFloat<f64>,
}

/// A trend-based prediction of an upcoming bottleneck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictedBottleneck {
    /// What is expected to happen
    pub description: String,
    /// Estimated probability (0-1)
    pub probability: OrderedFloat<f64>,
    /// Expected severity
    pub severity: PatternSeverity,
    /// Expected time to onset in minutes
    pub time_horizon_minutes: u32,
}

/// An optimization opportunity derived from current metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    /// Subsystem the suggestion targets
    pub area: String,
    /// What to change
    pub description: String,
    /// Expected effect
    pub expected_improvement: String,
}

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Low risk
    Low,
    /// Medium risk
    Medium,
    /// High risk
    High,
}

/// A risk assessment derived from current metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Assessed risk level
    pub risk_level: RiskLevel,
    /// What the risk is
    pub description: String,
    /// Metric observations backing the assessment
    pub factors: Vec<String>,
}

/// Combined insight views over current detector state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInsights {
    /// Per-active-bottleneck timelines and mitigation progress
    pub active: Vec<ActiveBottleneckInsight>,
    /// Trend-based predictions
    pub predicted: Vec<PredictedBottleneck>,
    /// Optimization opportunities
    pub optimizations: Vec<OptimizationSuggestion>,
    /// Risk assessments
    pub risks: Vec<RiskAssessment>,
}

/// Derives read-only insight views; never mutates detector state
#[derive(Debug, Default)]
pub struct InsightsEngine;

impl InsightsEngine {
    /// Create an insights engine.
    pub fn new() -> Self {
        Self
    }

    /// All insight views in one pass.
    pub fn derive_insights(
        &self,
        active: &[DetectedBottleneck],
        samples: &[MetricSample],
    ) -> EngineInsights {
        EngineInsights {
            active: self.active_insights(active),
            predicted: self.predicted_bottlenecks(samples),
            optimizations: self.optimization_suggestions(samples),
            risks: self.risk_assessments(samples),
        }
    }

    /// Per-bottleneck timeline and mitigation progress.
    pub fn active_insights(&self, active: &[DetectedBottleneck]) -> Vec<ActiveBottleneckInsight> {
        active
            .iter()
            .map(|bottleneck| ActiveBottleneckInsight {
                bottleneck_id: bottleneck.id.clone(),
                pattern_id: bottleneck.pattern_id.clone(),
                timeline: vec![
                    TimelinePoint {
                        timestamp: bottleneck.timestamp - Duration::minutes(5),
                        label: "baseline".to_string(),
                        confidence: OrderedFloat(0.0),
                    },
                    TimelinePoint {
                        timestamp: bottleneck.timestamp,
                        label: "detection".to_string(),
                        confidence: bottleneck.confidence,
                    },
                ],
                mitigation_progress: OrderedFloat(if bottleneck.resolved {
                    100.0
                } else {
                    MITIGATION_IN_PROGRESS
                }),
            })
            .collect()
    }

    /// Predict an upcoming bottleneck when response times and error rates
    /// are rising together across the retained history.
    pub fn predicted_bottlenecks(&self, samples: &[MetricSample]) -> Vec<PredictedBottleneck> {
        if samples.len() < PREDICTION_MIN_SAMPLES {
            return Vec::new();
        }

        let response_rising = Self::is_rising(samples, "overall.averageResponseTime");
        let errors_rising = Self::is_rising(samples, "overall.errorRate");
        if !(response_rising && errors_rising) {
            return Vec::new();
        }

        vec![PredictedBottleneck {
            description: "Response times and error rates are rising together; a response-time \
                          bottleneck is likely if the trend continues"
                .to_string(),
            probability: OrderedFloat(0.7),
            severity: PatternSeverity::Warning,
            time_horizon_minutes: 30,
        }]
    }

    /// Optimization opportunities from the latest snapshot.
    pub fn optimization_suggestions(&self, samples: &[MetricSample]) -> Vec<OptimizationSuggestion> {
        let Some(latest) = samples.last() else {
            return Vec::new();
        };
        let mut suggestions = Vec::new();

        let hit_rate = extract_metric_value(&latest.snapshot, "caching.hitRate");
        if hit_rate < CACHE_HIT_RATE_FLOOR {
            suggestions.push(OptimizationSuggestion {
                area: "caching".to_string(),
                description: format!(
                    "Cache hit rate is {hit_rate:.1}%; widen caching of frequently requested \
                     tool data"
                ),
                expected_improvement: "Higher hit rate and lower upstream request volume"
                    .to_string(),
            });
        }

        let compression_ratio =
            extract_metric_value(&latest.snapshot, "compression.averageCompressionRatio");
        if compression_ratio < COMPRESSION_RATIO_FLOOR {
            suggestions.push(OptimizationSuggestion {
                area: "compression".to_string(),
                description: format!(
                    "Compression ratio is {compression_ratio:.1}%; review compressible content \
                     types and compression level"
                ),
                expected_improvement: "Smaller payloads and faster transfers".to_string(),
            });
        }

        suggestions
    }

    /// Risk assessments from the latest snapshot.
    pub fn risk_assessments(&self, samples: &[MetricSample]) -> Vec<RiskAssessment> {
        let Some(latest) = samples.last() else {
            return Vec::new();
        };

        let response_time = extract_metric_value(&latest.snapshot, "overall.averageResponseTime");
        let error_rate = extract_metric_value(&latest.snapshot, "overall.errorRate");

        if response_time > RISK_RESPONSE_TIME_CEILING && error_rate > RISK_ERROR_RATE_CEILING {
            vec![RiskAssessment {
                risk_level: RiskLevel::High,
                description: "Degraded responses combined with elevated errors put dashboard \
                              availability at risk"
                    .to_string(),
                factors: vec![
                    format!("average response time {response_time:.0}ms"),
                    format!("error rate {error_rate:.1}%"),
                ],
            }]
        } else {
            Vec::new()
        }
    }

    /// Whether a metric rose by more than the prediction threshold
    /// between the first and second half of the retained samples.
    fn is_rising(samples: &[MetricSample], path: &str) -> bool {
        let values: Vec<f64> = samples
            .iter()
            .map(|sample| extract_metric_value(&sample.snapshot, path))
            .collect();

        let mid = values.len() / 2;
        let first_half = &values[..mid];
        let second_half = &values[mid..];

        let mean = |half: &[f64]| half.iter().sum::<f64>() / half.len().max(1) as f64;
        let first_mean = mean(first_half);
        let second_mean = mean(second_half);

        if first_mean <= 0.0 {
            return second_mean > 0.0;
        }
        second_mean > first_mean * (1.0 + PREDICTION_RISE_THRESHOLD)
    }
}
