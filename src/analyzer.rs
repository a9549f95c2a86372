//! Per-pattern analysis: condition evaluation, confidence scoring,
//! impact banding, metric correlation, and trend classification

use crate::error::BottleneckDetectionResult;
use crate::history::MetricSample;
use crate::metrics::{extract_metric_value, MetricsSnapshot};
use crate::patterns::{BottleneckPattern, ComparisonOperator, PatternCategory, PatternSeverity};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coarse impact banding derived from pattern severity and breach ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImpactLevel {
    /// Barely noticeable impact
    Minor,
    /// Noticeable impact
    Moderate,
    /// Significant impact
    Severe,
    /// Service-threatening impact
    Critical,
}

/// Trend classification over the recent metric-history window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendClassification {
    /// Indicators moving up
    Rising,
    /// Indicators moving down
    Falling,
    /// Indicators holding steady
    Stable,
    /// Indicators moving without a consistent direction
    Erratic,
}

/// Qualitative correlation strength by absolute-value banding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationStrength {
    /// |r| below 0.4
    Weak,
    /// |r| in [0.4, 0.6)
    Moderate,
    /// |r| in [0.6, 0.8)
    Strong,
    /// |r| at or above 0.8
    VeryStrong,
}

/// Correlation direction by sign, with a dead-zone around zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationDirection {
    /// Metrics move together
    Positive,
    /// Metrics move oppositely
    Negative,
    /// No meaningful direction
    Neutral,
}

/// Co-movement between two named metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correlation {
    /// First metric path
    pub metric1: String,
    /// Second metric path
    pub metric2: String,
    /// Pearson correlation coefficient (-1..1)
    pub coefficient: OrderedFloat<f64>,
    /// Qualitative strength
    pub strength: CorrelationStrength,
    /// Qualitative direction
    pub direction: CorrelationDirection,
}

/// Per-metric detail captured at analysis time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricBreakdown {
    /// Extracted value
    pub value: OrderedFloat<f64>,
    /// Condition threshold
    pub threshold: OrderedFloat<f64>,
    /// Whether the condition breached
    pub breached: bool,
}

/// Result of analyzing one pattern against one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleneckAnalysis {
    /// Pattern that was analyzed
    pub pattern_id: String,
    /// Confidence score (0-100) from summed breached-condition weights
    pub confidence: OrderedFloat<f64>,
    /// Impact banding
    pub impact: ImpactLevel,
    /// Number of breached conditions
    pub breached_conditions: usize,
    /// Total number of conditions
    pub total_conditions: usize,
    /// Per-metric breach detail, recorded regardless of breach outcome
    pub metrics: HashMap<String, MetricBreakdown>,
    /// Retained correlations between indicator metrics
    pub correlations: Vec<Correlation>,
    /// Primary-indicator trend over the recent history window
    pub trend: TrendClassification,
    /// Estimated resolution time in minutes
    pub estimated_resolution_minutes: u32,
}

/// Apply a comparison operator between an extracted value and a threshold.
///
/// The operator set is closed, so there is no fail-open path for an
/// unrecognized operator.
pub fn is_breached(value: f64, operator: ComparisonOperator, threshold: f64) -> bool {
    match operator {
        ComparisonOperator::GreaterThan => value > threshold,
        ComparisonOperator::LessThan => value < threshold,
        ComparisonOperator::GreaterThanOrEqual => value >= threshold,
        ComparisonOperator::LessThanOrEqual => value <= threshold,
        ComparisonOperator::Equal => (value - threshold).abs() < f64::EPSILON,
    }
}

/// Band pattern severity and breach ratio into an impact level.
pub fn calculate_impact(severity: PatternSeverity, breach_ratio: f64) -> ImpactLevel {
    let multiplier = match severity {
        PatternSeverity::Critical => 1.5,
        PatternSeverity::Warning => 1.0,
        PatternSeverity::Info => 0.5,
    };
    let score = breach_ratio * multiplier * 100.0;

    match score {
        s if s >= 90.0 => ImpactLevel::Critical,
        s if s >= 70.0 => ImpactLevel::Severe,
        s if s >= 40.0 => ImpactLevel::Moderate,
        _ => ImpactLevel::Minor,
    }
}

/// Estimated minutes to resolution for a (category, impact) pairing.
pub fn estimate_resolution_minutes(category: PatternCategory, impact: ImpactLevel) -> u32 {
    match (category, impact) {
        (PatternCategory::Performance, ImpactLevel::Critical) => 90,
        (PatternCategory::Performance, ImpactLevel::Severe) => 60,
        (PatternCategory::Performance, ImpactLevel::Moderate) => 30,
        (PatternCategory::Performance, ImpactLevel::Minor) => 15,
        (PatternCategory::Capacity, ImpactLevel::Critical) => 120,
        (PatternCategory::Capacity, ImpactLevel::Severe) => 60,
        (PatternCategory::Capacity, ImpactLevel::Moderate) => 30,
        (PatternCategory::Capacity, ImpactLevel::Minor) => 15,
        (PatternCategory::Reliability, ImpactLevel::Critical) => 60,
        (PatternCategory::Reliability, ImpactLevel::Severe) => 30,
        (PatternCategory::Reliability, ImpactLevel::Moderate) => 20,
        (PatternCategory::Reliability, ImpactLevel::Minor) => 10,
        (PatternCategory::Efficiency, ImpactLevel::Critical) => 90,
        (PatternCategory::Efficiency, ImpactLevel::Severe) => 60,
        (PatternCategory::Efficiency, ImpactLevel::Moderate) => 40,
        (PatternCategory::Efficiency, ImpactLevel::Minor) => 20,
    }
}

/// Extract one metric's series across retained samples, oldest first.
fn metric_series(samples: &[MetricSample], path: &str) -> Vec<f64> {
    samples
        .iter()
        .map(|sample| extract_metric_value(&sample.snapshot, path))
        .collect()
}

/// Pearson correlation between two equal-length series.
///
/// Returns `None` for series shorter than two samples or with zero
/// variance in either input.
fn pearson_correlation(series1: &[f64], series2: &[f64]) -> Option<f64> {
    let n = series1.len().min(series2.len());
    if n < 2 {
        return None;
    }

    let s1 = &series1[..n];
    let s2 = &series2[..n];
    let n = n as f64;

    let sum1: f64 = s1.iter().sum();
    let sum2: f64 = s2.iter().sum();
    let sum1_sq: f64 = s1.iter().map(|x| x * x).sum();
    let sum2_sq: f64 = s2.iter().map(|x| x * x).sum();
    let sum_prod: f64 = s1.iter().zip(s2.iter()).map(|(x, y)| x * y).sum();

    let num = n * sum_prod - sum1 * sum2;
    let den = ((n * sum1_sq - sum1 * sum1) * (n * sum2_sq - sum2 * sum2)).sqrt();

    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

fn classify_strength(coefficient: f64) -> CorrelationStrength {
    match coefficient.abs() {
        r if r >= 0.8 => CorrelationStrength::VeryStrong,
        r if r >= 0.6 => CorrelationStrength::Strong,
        r if r >= 0.4 => CorrelationStrength::Moderate,
        _ => CorrelationStrength::Weak,
    }
}

fn classify_direction(coefficient: f64) -> CorrelationDirection {
    if coefficient > 0.1 {
        CorrelationDirection::Positive
    } else if coefficient < -0.1 {
        CorrelationDirection::Negative
    } else {
        CorrelationDirection::Neutral
    }
}

/// Analyzes registered patterns against metrics snapshots
pub struct PatternAnalyzer {
    trend_window: usize,
    correlation_threshold: f64,
    rising_threshold: f64,
    stable_threshold: f64,
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self {
            trend_window: 5,
            correlation_threshold: 0.5,
            rising_threshold: 0.10,
            stable_threshold: 0.05,
        }
    }
}

impl PatternAnalyzer {
    /// Create an analyzer with the default window and thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with a custom trend window.
    pub fn with_trend_window(trend_window: usize) -> Self {
        Self {
            trend_window,
            ..Self::default()
        }
    }

    /// Analyze one pattern against the current snapshot and retained
    /// metric history.
    pub fn analyze(
        &self,
        pattern: &BottleneckPattern,
        snapshot: &MetricsSnapshot,
        samples: &[MetricSample],
    ) -> BottleneckDetectionResult<BottleneckAnalysis> {
        let mut confidence = 0.0;
        let mut breached_conditions = 0;
        let mut metrics = HashMap::new();

        for cond in &pattern.conditions {
            let value = extract_metric_value(snapshot, &cond.metric);
            let breached = is_breached(value, cond.operator, cond.threshold);
            if breached {
                confidence += cond.weight;
                breached_conditions += 1;
            }
            metrics.insert(
                cond.metric.clone(),
                MetricBreakdown {
                    value: OrderedFloat(value),
                    threshold: OrderedFloat(cond.threshold),
                    breached,
                },
            );
        }

        // Weights may over-provision past 100; cap rather than normalize.
        let confidence = confidence.min(100.0);

        let total_conditions = pattern.conditions.len();
        let breach_ratio = if total_conditions == 0 {
            0.0
        } else {
            breached_conditions as f64 / total_conditions as f64
        };
        let impact = calculate_impact(pattern.severity, breach_ratio);

        Ok(BottleneckAnalysis {
            pattern_id: pattern.id.clone(),
            confidence: OrderedFloat(confidence),
            impact,
            breached_conditions,
            total_conditions,
            metrics,
            correlations: self.analyze_correlations(pattern, samples),
            trend: self.classify_trend(pattern, samples),
            estimated_resolution_minutes: estimate_resolution_minutes(pattern.category, impact),
        })
    }

    /// Pairwise correlations across the pattern's indicator metrics,
    /// computed over the retained history window. Only pairs with
    /// |coefficient| above the retention threshold are kept.
    fn analyze_correlations(
        &self,
        pattern: &BottleneckPattern,
        samples: &[MetricSample],
    ) -> Vec<Correlation> {
        let paths = pattern.indicator_paths();
        let series: Vec<Vec<f64>> = paths
            .iter()
            .map(|path| metric_series(samples, path))
            .collect();

        let mut correlations = Vec::new();
        for i in 0..paths.len() {
            for j in (i + 1)..paths.len() {
                if let Some(r) = pearson_correlation(&series[i], &series[j]) {
                    if r.abs() > self.correlation_threshold {
                        correlations.push(Correlation {
                            metric1: paths[i].clone(),
                            metric2: paths[j].clone(),
                            coefficient: OrderedFloat(r),
                            strength: classify_strength(r),
                            direction: classify_direction(r),
                        });
                    }
                }
            }
        }
        correlations
    }

    /// Classify the primary indicators' movement over the most recent
    /// history window by majority vote; a rising/falling tie that beats
    /// stable counts as erratic.
    fn classify_trend(
        &self,
        pattern: &BottleneckPattern,
        samples: &[MetricSample],
    ) -> TrendClassification {
        let window_start = samples.len().saturating_sub(self.trend_window);
        let window = &samples[window_start..];
        if window.len() < 3 {
            return TrendClassification::Stable;
        }

        let mut rising = 0usize;
        let mut falling = 0usize;
        let mut stable = 0usize;
        let mut erratic = 0usize;

        for path in &pattern.primary_indicators {
            let series = metric_series(window, path);
            match self.classify_movement(&series) {
                TrendClassification::Rising => rising += 1,
                TrendClassification::Falling => falling += 1,
                TrendClassification::Stable => stable += 1,
                TrendClassification::Erratic => erratic += 1,
            }
        }

        if rising > 0 && rising == falling && rising >= stable && rising >= erratic {
            return TrendClassification::Erratic;
        }

        let max = rising.max(falling).max(stable).max(erratic);
        if max == 0 || max == stable {
            TrendClassification::Stable
        } else if max == rising {
            TrendClassification::Rising
        } else if max == falling {
            TrendClassification::Falling
        } else {
            TrendClassification::Erratic
        }
    }

    fn classify_movement(&self, series: &[f64]) -> TrendClassification {
        let first = series[0];
        let middle = series[series.len() / 2];
        let last = series[series.len() - 1];

        if first == 0.0 {
            return if last > 0.0 {
                TrendClassification::Rising
            } else {
                TrendClassification::Stable
            };
        }

        if last >= first * (1.0 + self.rising_threshold) {
            return TrendClassification::Rising;
        }
        if last <= first * (1.0 - self.rising_threshold) {
            return TrendClassification::Falling;
        }

        let deviates = |a: f64, b: f64| {
            if a == 0.0 {
                b != 0.0
            } else {
                ((b - a) / a).abs() > self.stable_threshold
            }
        };
        if deviates(first, middle) && deviates(last, middle) {
            TrendClassification::Erratic
        } else {
            TrendClassification::Stable
        }
    }
}
