//! Bottleneck detection error types

use thiserror::Error;

/// Bottleneck detection error types
#[derive(Debug, Error)]
pub enum BottleneckDetectionError {
    /// Pattern failed validation at registration time
    #[error("Configuration error: {parameter} - {message}")]
    ConfigurationError { parameter: String, message: String },

    /// Metrics snapshot could not be fetched from the provider
    #[error("Metrics fetch failed: {source_name} - {details}")]
    MetricsFetchFailed {
        source_name: String,
        details: String,
    },

    /// Alert could not be handed to the alert sink
    #[error("Alert delivery failed: {channel} - {details}")]
    AlertDeliveryFailed { channel: String, details: String },

    /// Analysis of a single pattern failed
    #[error("Pattern analysis failed: {pattern_id} - {reason}")]
    AnalysisFailed { pattern_id: String, reason: String },

    /// Bottleneck not found
    #[error("Bottleneck not found: {bottleneck_id}")]
    BottleneckNotFound { bottleneck_id: String },

    /// Pattern not found
    #[error("Pattern not found: {pattern_id}")]
    PatternNotFound { pattern_id: String },

    /// Automated action not found
    #[error("Automated action not found: {action_id}")]
    ActionNotFound { action_id: String },

    /// Automated action routine failed
    #[error("Action execution failed: {script} - {reason}")]
    ActionExecutionFailed { script: String, reason: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

/// Bottleneck detection result type
pub type BottleneckDetectionResult<T> = Result<T, BottleneckDetectionError>;
