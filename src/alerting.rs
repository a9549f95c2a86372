//! Alert payloads and the external alert sink seam

use crate::error::BottleneckDetectionResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertSeverity {
    /// Informational alert
    Info,
    /// Warning alert
    Warning,
    /// Critical alert requiring immediate attention
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Alert raised for a high-severity detected bottleneck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceAlert {
    /// Unique alert id
    pub id: String,
    /// Alert category, `"bottleneck"` for alerts raised by this engine
    pub alert_type: String,
    /// Alert severity
    pub severity: AlertSeverity,
    /// Human-readable summary
    pub message: String,
    /// When the alert was raised
    pub timestamp: DateTime<Utc>,
    /// Observed value that triggered the alert (detection confidence)
    pub value: OrderedFloat<f64>,
    /// Threshold the value cleared (pattern minimum confidence)
    pub threshold: OrderedFloat<f64>,
    /// Detail endpoint for the underlying bottleneck
    pub endpoint: String,
}

/// Delivery target for alerts.
///
/// Implemented by the external notification layer. Dispatch is
/// fire-and-forget from the detection loop; delivery guarantees are the
/// sink's concern.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Accept an alert for delivery.
    async fn process_alert(&self, alert: PerformanceAlert) -> BottleneckDetectionResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Critical > AlertSeverity::Warning);
        assert!(AlertSeverity::Warning > AlertSeverity::Info);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(AlertSeverity::Critical.to_string(), "critical");
        assert_eq!(AlertSeverity::Warning.to_string(), "warning");
        assert_eq!(AlertSeverity::Info.to_string(), "info");
    }

    #[test]
    fn test_alert_serialization_round_trip() {
        let alert = PerformanceAlert {
            id: "a-1".to_string(),
            alert_type: "bottleneck".to_string(),
            severity: AlertSeverity::Critical,
            message: "Memory Leak Pattern detected with 100% confidence".to_string(),
            timestamp: Utc::now(),
            value: OrderedFloat(100.0),
            threshold: OrderedFloat(85.0),
            endpoint: "bottlenecks/memory-leak-0".to_string(),
        };

        let json = serde_json::to_string(&alert).unwrap();
        let back: PerformanceAlert = serde_json::from_str(&json).unwrap();
        assert_eq!(back.severity, AlertSeverity::Critical);
        assert_eq!(back.value.0, 100.0);
    }
}
