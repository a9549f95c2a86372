//! Dashboard metrics snapshots and metric value extraction

use crate::error::BottleneckDetectionResult;
use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;

/// Opaque dashboard metrics snapshot.
///
/// Snapshots are nested objects keyed by category (`overall`, `caching`,
/// `batching`, `compression`, ...) each holding named numeric fields. The
/// shape is provider-defined and may evolve; patterns reference values by
/// dotted path and tolerate paths absent from any given snapshot.
pub type MetricsSnapshot = Value;

/// Source of dashboard metrics snapshots.
///
/// Implemented by the external metrics aggregation layer. The detection
/// loop calls this once per tick with its configured lookback window.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Fetch a metrics snapshot covering the given lookback window.
    async fn dashboard_metrics(&self, window: Duration) -> BottleneckDetectionResult<MetricsSnapshot>;
}

/// Resolve a dotted metric path against a snapshot.
///
/// Missing intermediate keys, non-object intermediates, and non-numeric
/// terminal values all yield `0.0`. A failed lookup must never abort the
/// analysis of an otherwise-valid pattern, so this function has no error
/// path.
pub fn extract_metric_value(snapshot: &MetricsSnapshot, path: &str) -> f64 {
    let mut current = snapshot;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return 0.0,
        }
    }
    current.as_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_nested_value() {
        let snapshot = json!({ "overall": { "averageResponseTime": 150 } });
        assert_eq!(
            extract_metric_value(&snapshot, "overall.averageResponseTime"),
            150.0
        );
    }

    #[test]
    fn test_extract_missing_path_returns_zero() {
        let snapshot = json!({});
        assert_eq!(extract_metric_value(&snapshot, "nonexistent.path"), 0.0);
    }

    #[test]
    fn test_extract_missing_leaf_returns_zero() {
        let snapshot = json!({ "overall": { "errorRate": 1.5 } });
        assert_eq!(extract_metric_value(&snapshot, "overall.throughput"), 0.0);
    }

    #[test]
    fn test_extract_non_object_intermediate_returns_zero() {
        let snapshot = json!({ "overall": 42 });
        assert_eq!(
            extract_metric_value(&snapshot, "overall.averageResponseTime"),
            0.0
        );
    }

    #[test]
    fn test_extract_non_numeric_terminal_returns_zero() {
        let snapshot = json!({ "overall": { "status": "healthy" } });
        assert_eq!(extract_metric_value(&snapshot, "overall.status"), 0.0);
    }

    #[test]
    fn test_extract_fractional_value() {
        let snapshot = json!({ "caching": { "hitRate": 87.5 } });
        assert_eq!(extract_metric_value(&snapshot, "caching.hitRate"), 87.5);
    }

    #[test]
    fn test_extract_deeply_nested_path() {
        let snapshot = json!({ "overall": { "percentiles": { "p99": 820.0 } } });
        assert_eq!(
            extract_metric_value(&snapshot, "overall.percentiles.p99"),
            820.0
        );
    }
}
