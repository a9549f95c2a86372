//! Continuous bottleneck detection, active-bottleneck lifecycle, and
//! detection events

use crate::actions::{ActionExecutor, ActionOutcome};
use crate::alerting::{AlertSeverity, AlertSink, PerformanceAlert};
use crate::analyzer::{BottleneckAnalysis, Correlation, ImpactLevel, MetricBreakdown, PatternAnalyzer};
use crate::error::{BottleneckDetectionError, BottleneckDetectionResult};
use crate::history::{HistoryRecord, HistoryStore, MetricSample};
use crate::insights::{EngineInsights, InsightsEngine};
use crate::metrics::MetricsProvider;
use crate::patterns::{
    builtin_patterns, AutomatedAction, BottleneckPattern, PatternRegistry, PatternSeverity,
    Recommendation,
};
use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Bottleneck detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Detection loop period in seconds
    pub detection_interval_secs: u64,
    /// Lookback window passed to the metrics provider per tick (seconds)
    pub metrics_window_secs: u64,
    /// Maximum metric samples retained for trend and correlation lookups
    pub max_metric_samples: usize,
    /// Rolling retention window for archival bottleneck records (days)
    pub history_retention_days: i64,
    /// Timeout for the per-tick metrics fetch (seconds)
    pub fetch_timeout_secs: u64,
    /// Timeout for alert delivery (seconds)
    pub alert_timeout_secs: u64,
    /// Capacity of the detection event channel
    pub event_channel_capacity: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            detection_interval_secs: 30,
            metrics_window_secs: 300,
            max_metric_samples: 100,
            history_retention_days: 7,
            fetch_timeout_secs: 10,
            alert_timeout_secs: 5,
            event_channel_capacity: 64,
        }
    }
}

/// Who resolved a bottleneck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedBy {
    /// Resolved by an automated action
    Automatic,
    /// Resolved by an operator
    Manual,
}

/// Resolution record attached to a bottleneck exactly once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckResolution {
    /// Who resolved it
    pub resolved_by: ResolvedBy,
    /// What was done
    pub action_taken: String,
    /// When it was resolved; stamped with the current time when absent
    pub resolution_time: Option<DateTime<Utc>>,
    /// Follow-up work identified during resolution
    pub follow_up_actions: Vec<String>,
}

/// A detected, tracked bottleneck instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedBottleneck {
    /// Unique id, pattern id plus detection timestamp
    pub id: String,
    /// Pattern that fired
    pub pattern_id: String,
    /// Detection time
    pub timestamp: DateTime<Utc>,
    /// Confidence at detection time; never recomputed
    pub confidence: OrderedFloat<f64>,
    /// Impact banding at detection time
    pub impact: ImpactLevel,
    /// Per-metric breach detail captured at detection time
    pub metrics: HashMap<String, MetricBreakdown>,
    /// Indicator correlations at detection time
    pub correlations: Vec<Correlation>,
    /// Recommendations copied from the pattern with execution defaults
    pub recommendations: Vec<Recommendation>,
    /// Whether the bottleneck has been resolved
    pub resolved: bool,
    /// Resolution record, present once resolved
    pub resolution: Option<BottleneckResolution>,
    /// When the bottleneck was resolved
    pub resolution_time: Option<DateTime<Utc>>,
}

/// Events published by the detector
#[derive(Debug, Clone)]
pub enum BottleneckEvent {
    /// A bottleneck was detected and registered as active
    Detected(DetectedBottleneck),
    /// An active bottleneck was resolved and archived
    Resolved(DetectedBottleneck),
}

/// Occurrence count for one pattern across active and archived bottlenecks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternOccurrence {
    /// Pattern id
    pub pattern_id: String,
    /// Combined active plus historical occurrences
    pub count: usize,
}

/// Aggregate view over active and archived bottlenecks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Currently active bottlenecks
    pub active_count: usize,
    /// Archived bottlenecks that were resolved
    pub resolved_count: usize,
    /// Archived bottlenecks removed without resolution
    pub unresolved_count: usize,
    /// Mean minutes from detection to resolution over resolved history
    pub average_resolution_minutes: f64,
    /// Top patterns by combined occurrence count, at most five
    pub top_patterns: Vec<PatternOccurrence>,
    /// Resolved share of archived bottlenecks as a percentage
    pub resolution_rate: f64,
}

struct DetectorShared {
    config: DetectorConfig,
    registry: PatternRegistry,
    analyzer: PatternAnalyzer,
    actions: ActionExecutor,
    history: HistoryStore,
    active: RwLock<HashMap<String, DetectedBottleneck>>,
    events: broadcast::Sender<BottleneckEvent>,
    metrics_provider: Arc<dyn MetricsProvider>,
    alert_sink: Arc<dyn AlertSink>,
}

/// Continuous bottleneck detection engine.
///
/// Owns the active-bottleneck map and the metric history exclusively.
/// One instance is constructed, started, and eventually destroyed by its
/// owner; there is no process-global detector.
pub struct BottleneckDetector {
    shared: Arc<DetectorShared>,
    loop_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl BottleneckDetector {
    /// Create a detector with the built-in pattern catalog registered.
    pub fn new(
        config: DetectorConfig,
        metrics_provider: Arc<dyn MetricsProvider>,
        alert_sink: Arc<dyn AlertSink>,
    ) -> BottleneckDetectionResult<Self> {
        Self::with_patterns(config, builtin_patterns(), metrics_provider, alert_sink)
    }

    /// Create a detector with a custom starting pattern set.
    pub fn with_patterns(
        config: DetectorConfig,
        patterns: Vec<BottleneckPattern>,
        metrics_provider: Arc<dyn MetricsProvider>,
        alert_sink: Arc<dyn AlertSink>,
    ) -> BottleneckDetectionResult<Self> {
        let registry = PatternRegistry::with_patterns(patterns)?;
        let (events, _) = broadcast::channel(config.event_channel_capacity);
        let history = HistoryStore::new(config.max_metric_samples, config.history_retention_days);

        Ok(Self {
            shared: Arc::new(DetectorShared {
                config,
                registry,
                analyzer: PatternAnalyzer::new(),
                actions: ActionExecutor::new(),
                history,
                active: RwLock::new(HashMap::new()),
                events,
                metrics_provider,
                alert_sink,
            }),
            loop_handle: Mutex::new(None),
        })
    }

    /// The pattern registry, for runtime pattern management.
    pub fn registry(&self) -> &PatternRegistry {
        &self.shared.registry
    }

    /// Subscribe to detection and resolution events.
    pub fn subscribe(&self) -> broadcast::Receiver<BottleneckEvent> {
        self.shared.events.subscribe()
    }

    /// Start the periodic detection loop.
    ///
    /// Ticks run sequentially on a single task, so two detection cycles
    /// can never overlap; ticks missed while a cycle is still running are
    /// skipped. Calling `start` while the loop is running is a no-op.
    pub fn start(&self) {
        let mut handle = self.loop_handle.lock();
        if handle.is_some() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let period = Duration::from_secs(shared.config.detection_interval_secs);
        info!(
            period_secs = shared.config.detection_interval_secs,
            patterns = shared.registry.len(),
            "starting bottleneck detection loop"
        );

        *handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if let Err(e) = shared.run_detection_cycle().await {
                    warn!(error = %e, "detection cycle skipped");
                }
            }
        }));
    }

    /// Run one detection cycle on demand, returning the newly detected
    /// bottlenecks.
    pub async fn detect_once(&self) -> BottleneckDetectionResult<Vec<DetectedBottleneck>> {
        self.shared.run_detection_cycle().await
    }

    /// Active bottlenecks, newest first.
    pub fn active_bottlenecks(&self) -> Vec<DetectedBottleneck> {
        let mut bottlenecks: Vec<DetectedBottleneck> =
            self.shared.active.read().values().cloned().collect();
        bottlenecks.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        bottlenecks
    }

    /// Look up one active bottleneck by id.
    pub fn get_bottleneck(&self, bottleneck_id: &str) -> Option<DetectedBottleneck> {
        self.shared.active.read().get(bottleneck_id).cloned()
    }

    /// Correlation data captured for one active bottleneck.
    pub fn correlations_for(&self, bottleneck_id: &str) -> Option<Vec<Correlation>> {
        self.shared
            .active
            .read()
            .get(bottleneck_id)
            .map(|b| b.correlations.clone())
    }

    /// Resolve an active bottleneck.
    ///
    /// Attaches the resolution verbatim, stamps the resolution time,
    /// archives the bottleneck, removes it from the active map, and emits
    /// a resolved event. Returns `None` for an unknown id.
    pub fn resolve(
        &self,
        bottleneck_id: &str,
        resolution: BottleneckResolution,
    ) -> Option<DetectedBottleneck> {
        let mut bottleneck = self.shared.active.write().remove(bottleneck_id)?;

        let resolved_at = resolution.resolution_time.unwrap_or_else(Utc::now);
        let mut actions_taken = vec![resolution.action_taken.clone()];
        actions_taken.extend(resolution.follow_up_actions.iter().cloned());

        bottleneck.resolved = true;
        bottleneck.resolution_time = Some(resolved_at);
        bottleneck.resolution = Some(resolution);

        self.shared.history.archive_record(HistoryRecord {
            bottleneck_id: bottleneck.id.clone(),
            pattern_id: bottleneck.pattern_id.clone(),
            detected_at: bottleneck.timestamp,
            resolved_at: Some(resolved_at),
            confidence: bottleneck.confidence,
            actions_taken,
        });

        let _ = self
            .shared
            .events
            .send(BottleneckEvent::Resolved(bottleneck.clone()));
        info!(bottleneck_id = %bottleneck.id, "bottleneck resolved");

        Some(bottleneck)
    }

    /// Remove an active bottleneck without resolving it.
    ///
    /// The bottleneck is archived without a resolution timestamp, which
    /// is what feeds the unresolved count in the analysis stats. Returns
    /// whether anything was removed.
    pub fn remove(&self, bottleneck_id: &str) -> bool {
        let removed = self.shared.active.write().remove(bottleneck_id);
        match removed {
            Some(bottleneck) => {
                self.shared.history.archive_record(HistoryRecord {
                    bottleneck_id: bottleneck.id.clone(),
                    pattern_id: bottleneck.pattern_id,
                    detected_at: bottleneck.timestamp,
                    resolved_at: None,
                    confidence: bottleneck.confidence,
                    actions_taken: Vec::new(),
                });
                true
            }
            None => false,
        }
    }

    /// Archived bottleneck records, newest first.
    pub fn historical_bottlenecks(&self) -> Vec<HistoryRecord> {
        self.shared.history.historical()
    }

    /// A page of archived bottleneck records, newest first.
    pub fn historical_page(&self, limit: usize, offset: usize) -> Vec<HistoryRecord> {
        self.shared.history.historical_page(limit, offset)
    }

    /// Retained metric samples, oldest first.
    pub fn metric_samples(&self) -> Vec<MetricSample> {
        self.shared.history.samples()
    }

    /// Aggregate stats across active and archived bottlenecks.
    pub fn analysis_stats(&self) -> AnalysisStats {
        let active = self.shared.active.read();
        let history = self.shared.history.historical();

        let resolution_minutes: Vec<f64> = history
            .iter()
            .filter_map(|r| r.resolved_at.map(|t| (t - r.detected_at).num_seconds() as f64 / 60.0))
            .collect();
        let resolved_count = resolution_minutes.len();
        let unresolved_count = history.len() - resolved_count;

        let average_resolution_minutes = if resolution_minutes.is_empty() {
            0.0
        } else {
            resolution_minutes.iter().sum::<f64>() / resolved_count as f64
        };

        let mut occurrences: HashMap<String, usize> = HashMap::new();
        for bottleneck in active.values() {
            *occurrences.entry(bottleneck.pattern_id.clone()).or_insert(0) += 1;
        }
        for record in &history {
            *occurrences.entry(record.pattern_id.clone()).or_insert(0) += 1;
        }
        let mut top_patterns: Vec<PatternOccurrence> = occurrences
            .into_iter()
            .map(|(pattern_id, count)| PatternOccurrence { pattern_id, count })
            .collect();
        top_patterns.sort_by(|a, b| b.count.cmp(&a.count).then(a.pattern_id.cmp(&b.pattern_id)));
        top_patterns.truncate(5);

        let archived = resolved_count + unresolved_count;
        let resolution_rate = if archived == 0 {
            0.0
        } else {
            resolved_count as f64 / archived as f64 * 100.0
        };

        AnalysisStats {
            active_count: active.len(),
            resolved_count,
            unresolved_count,
            average_resolution_minutes,
            top_patterns,
            resolution_rate,
        }
    }

    /// Insight views over the current active set and metric history.
    pub fn insights(&self) -> EngineInsights {
        InsightsEngine::new()
            .derive_insights(&self.active_bottlenecks(), &self.shared.history.samples())
    }

    /// Execute a declared automated action against an active bottleneck.
    ///
    /// Lookup misses surface as failed outcomes so callers can map them
    /// to not-found responses; nothing here is a fatal error.
    pub fn execute_action(&self, bottleneck_id: &str, action_id: &str) -> ActionOutcome {
        let Some(bottleneck) = self.get_bottleneck(bottleneck_id) else {
            return ActionOutcome {
                success: false,
                message: format!("Bottleneck not found: {bottleneck_id}"),
                result: None,
            };
        };
        let Some(pattern) = self.shared.registry.get(&bottleneck.pattern_id) else {
            return ActionOutcome {
                success: false,
                message: format!("Pattern not found: {}", bottleneck.pattern_id),
                result: None,
            };
        };
        self.shared.actions.execute(&pattern, &bottleneck, action_id)
    }

    /// Describe a declared automated action for an active bottleneck.
    pub fn describe_action(
        &self,
        bottleneck_id: &str,
        action_id: &str,
    ) -> Option<AutomatedAction> {
        let bottleneck = self.get_bottleneck(bottleneck_id)?;
        let pattern = self.shared.registry.get(&bottleneck.pattern_id)?;
        ActionExecutor::describe(&pattern, action_id)
    }

    /// Stop the detection loop and drop all in-memory state.
    ///
    /// Idempotent; safe to call on a detector that was never started.
    pub fn destroy(&self) {
        if let Some(handle) = self.loop_handle.lock().take() {
            handle.abort();
            info!("bottleneck detection loop stopped");
        }
        self.shared.active.write().clear();
        self.shared.history.clear();
    }
}

impl Drop for BottleneckDetector {
    fn drop(&mut self) {
        if let Some(handle) = self.loop_handle.lock().take() {
            handle.abort();
        }
    }
}

impl DetectorShared {
    /// One detection cycle: fetch a snapshot, record it, analyze every
    /// registered pattern, and materialize detections that clear their
    /// pattern's minimum confidence.
    async fn run_detection_cycle(&self) -> BottleneckDetectionResult<Vec<DetectedBottleneck>> {
        let window = chrono::Duration::seconds(self.config.metrics_window_secs as i64);
        let fetch = self.metrics_provider.dashboard_metrics(window);
        let snapshot = match tokio::time::timeout(
            Duration::from_secs(self.config.fetch_timeout_secs),
            fetch,
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(BottleneckDetectionError::MetricsFetchFailed {
                    source_name: "metrics-provider".to_string(),
                    details: format!(
                        "fetch exceeded {}s timeout",
                        self.config.fetch_timeout_secs
                    ),
                })
            }
        };

        self.history.record_sample(MetricSample {
            timestamp: Utc::now(),
            snapshot: snapshot.clone(),
        });
        let samples = self.history.samples();

        let mut detected = Vec::new();
        for pattern in self.registry.all() {
            match self.analyzer.analyze(&pattern, &snapshot, &samples) {
                Ok(analysis) if analysis.confidence.0 >= pattern.minimum_confidence => {
                    let bottleneck = self.materialize(&pattern, analysis);
                    info!(
                        bottleneck_id = %bottleneck.id,
                        confidence = bottleneck.confidence.0,
                        "bottleneck detected"
                    );

                    // Same-millisecond refires of one pattern collapse to
                    // the latest detection.
                    self.active
                        .write()
                        .insert(bottleneck.id.clone(), bottleneck.clone());
                    let _ = self
                        .events
                        .send(BottleneckEvent::Detected(bottleneck.clone()));

                    if pattern.severity == PatternSeverity::Critical
                        || bottleneck.impact == ImpactLevel::Critical
                    {
                        self.dispatch_alert(&pattern, &bottleneck);
                    }
                    detected.push(bottleneck);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(pattern_id = %pattern.id, error = %e, "pattern analysis failed");
                }
            }
        }

        Ok(detected)
    }

    fn materialize(
        &self,
        pattern: &BottleneckPattern,
        analysis: BottleneckAnalysis,
    ) -> DetectedBottleneck {
        let timestamp = Utc::now();
        DetectedBottleneck {
            id: format!("{}-{}", pattern.id, timestamp.timestamp_millis()),
            pattern_id: pattern.id.clone(),
            timestamp,
            confidence: analysis.confidence,
            impact: analysis.impact,
            metrics: analysis.metrics,
            correlations: analysis.correlations,
            recommendations: pattern
                .recommendations
                .iter()
                .map(Recommendation::from)
                .collect(),
            resolved: false,
            resolution: None,
            resolution_time: None,
        }
    }

    /// Hand a high-severity detection to the alert sink without blocking
    /// the tick; delivery failures are logged and dropped.
    fn dispatch_alert(&self, pattern: &BottleneckPattern, bottleneck: &DetectedBottleneck) {
        let message = match pattern.recommendations.first() {
            Some(rec) => format!(
                "{} detected with {:.0}% confidence. Recommended: {}",
                pattern.name, bottleneck.confidence.0, rec.summary
            ),
            None => format!(
                "{} detected with {:.0}% confidence. See bottlenecks/{} for details",
                pattern.name, bottleneck.confidence.0, bottleneck.id
            ),
        };

        let alert = PerformanceAlert {
            id: uuid::Uuid::new_v4().to_string(),
            alert_type: "bottleneck".to_string(),
            severity: match pattern.severity {
                PatternSeverity::Critical => AlertSeverity::Critical,
                PatternSeverity::Warning => AlertSeverity::Warning,
                PatternSeverity::Info => AlertSeverity::Info,
            },
            message,
            timestamp: Utc::now(),
            value: bottleneck.confidence,
            threshold: OrderedFloat(pattern.minimum_confidence),
            endpoint: format!("bottlenecks/{}", bottleneck.id),
        };

        let sink = Arc::clone(&self.alert_sink);
        let timeout = Duration::from_secs(self.config.alert_timeout_secs);
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, sink.process_alert(alert)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "alert delivery failed"),
                Err(_) => warn!("alert delivery timed out"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BottleneckDetectionError;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct StaticMetrics {
        snapshot: Value,
    }

    #[async_trait]
    impl MetricsProvider for StaticMetrics {
        async fn dashboard_metrics(
            &self,
            _window: chrono::Duration,
        ) -> BottleneckDetectionResult<Value> {
            Ok(self.snapshot.clone())
        }
    }

    struct FailingMetrics;

    #[async_trait]
    impl MetricsProvider for FailingMetrics {
        async fn dashboard_metrics(
            &self,
            _window: chrono::Duration,
        ) -> BottleneckDetectionResult<Value> {
            Err(BottleneckDetectionError::MetricsFetchFailed {
                source_name: "dashboard".to_string(),
                details: "upstream unavailable".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        alerts: Mutex<Vec<PerformanceAlert>>,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn process_alert(&self, alert: PerformanceAlert) -> BottleneckDetectionResult<()> {
            self.alerts.lock().push(alert);
            Ok(())
        }
    }

    fn leak_snapshot() -> Value {
        json!({
            "overall": {
                "averageResponseTime": 300.0,
                "errorRate": 0.5,
                "failedRequests": 10.0,
                "throughput": 25.0,
            },
            "caching": { "hitRate": 90.0, "evictionRate": 60.0 },
            "batching": { "averageBatchDuration": 4000.0, "queueDepth": 5.0 },
            "compression": { "averageCompressionRatio": 65.0, "averageCompressionTime": 20.0 },
        })
    }

    fn healthy_snapshot() -> Value {
        json!({
            "overall": {
                "averageResponseTime": 120.0,
                "errorRate": 0.2,
                "failedRequests": 2.0,
                "throughput": 40.0,
            },
            "caching": { "hitRate": 92.0, "evictionRate": 5.0 },
            "batching": { "averageBatchDuration": 800.0, "queueDepth": 3.0 },
            "compression": { "averageCompressionRatio": 70.0, "averageCompressionTime": 15.0 },
        })
    }

    fn detector_with(snapshot: Value) -> (BottleneckDetector, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let detector = BottleneckDetector::new(
            DetectorConfig::default(),
            Arc::new(StaticMetrics { snapshot }),
            sink.clone(),
        )
        .unwrap();
        (detector, sink)
    }

    fn manual_resolution() -> BottleneckResolution {
        BottleneckResolution {
            resolved_by: ResolvedBy::Manual,
            action_taken: "Restarted leaking workers".to_string(),
            resolution_time: None,
            follow_up_actions: vec!["Schedule heap profiling".to_string()],
        }
    }

    #[tokio::test]
    async fn test_detects_memory_leak_scenario() {
        let (detector, _) = detector_with(leak_snapshot());

        let detected = detector.detect_once().await.unwrap();
        assert_eq!(detected.len(), 1);

        let bottleneck = &detected[0];
        assert_eq!(bottleneck.pattern_id, "memory-leak");
        assert!(bottleneck.id.starts_with("memory-leak-"));
        assert!(bottleneck.confidence.0 >= 85.0);
        assert!(bottleneck.impact >= ImpactLevel::Severe);
        assert!(!bottleneck.resolved);

        let active = detector.active_bottlenecks();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, bottleneck.id);
    }

    #[tokio::test]
    async fn test_healthy_snapshot_detects_nothing() {
        let (detector, sink) = detector_with(healthy_snapshot());

        let detected = detector.detect_once().await.unwrap();
        assert!(detected.is_empty());
        assert!(detector.active_bottlenecks().is_empty());
        assert!(sink.alerts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_detection_records_metric_sample() {
        let (detector, _) = detector_with(healthy_snapshot());

        detector.detect_once().await.unwrap();
        detector.detect_once().await.unwrap();
        assert_eq!(detector.metric_samples().len(), 2);
    }

    #[tokio::test]
    async fn test_detection_emits_event() {
        let (detector, _) = detector_with(leak_snapshot());
        let mut events = detector.subscribe();

        detector.detect_once().await.unwrap();

        match events.try_recv().unwrap() {
            BottleneckEvent::Detected(bottleneck) => {
                assert_eq!(bottleneck.pattern_id, "memory-leak");
            }
            other => panic!("expected detection event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_critical_detection_alerts_sink() {
        let (detector, sink) = detector_with(leak_snapshot());

        detector.detect_once().await.unwrap();
        // Alert dispatch is fire-and-forget; give the spawned task a beat
        tokio::time::sleep(Duration::from_millis(50)).await;

        let alerts = sink.alerts.lock();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].threshold.0, 85.0);
        assert!(alerts[0].message.contains("Memory Leak"));
    }

    #[tokio::test]
    async fn test_recommendations_carry_execution_defaults() {
        let (detector, _) = detector_with(leak_snapshot());

        let detected = detector.detect_once().await.unwrap();
        let recommendations = &detected[0].recommendations;
        assert!(!recommendations.is_empty());
        assert!(recommendations.iter().all(|r| !r.automated));
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces_as_error() {
        let sink = Arc::new(RecordingSink::default());
        let detector = BottleneckDetector::new(
            DetectorConfig::default(),
            Arc::new(FailingMetrics),
            sink,
        )
        .unwrap();

        let result = detector.detect_once().await;
        assert!(matches!(
            result,
            Err(BottleneckDetectionError::MetricsFetchFailed { .. })
        ));
        assert!(detector.active_bottlenecks().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_moves_bottleneck_to_history() {
        let (detector, _) = detector_with(leak_snapshot());
        let detected = detector.detect_once().await.unwrap();
        let id = detected[0].id.clone();

        let resolution = manual_resolution();
        let resolved = detector.resolve(&id, resolution.clone()).unwrap();

        assert!(resolved.resolved);
        assert_eq!(resolved.resolution, Some(resolution));
        assert!(resolved.resolution_time.is_some());
        assert!(detector.get_bottleneck(&id).is_none());
        assert!(detector.active_bottlenecks().is_empty());

        let history = detector.historical_bottlenecks();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].bottleneck_id, id);
        assert!(history[0].resolved_at.is_some());
        assert_eq!(
            history[0].actions_taken,
            vec![
                "Restarted leaking workers".to_string(),
                "Schedule heap profiling".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_emits_event() {
        let (detector, _) = detector_with(leak_snapshot());
        let detected = detector.detect_once().await.unwrap();
        let mut events = detector.subscribe();

        detector.resolve(&detected[0].id, manual_resolution()).unwrap();

        match events.try_recv().unwrap() {
            BottleneckEvent::Resolved(bottleneck) => assert!(bottleneck.resolved),
            other => panic!("expected resolution event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_unknown_id_returns_none() {
        let (detector, _) = detector_with(healthy_snapshot());
        assert!(detector.resolve("no-such-id", manual_resolution()).is_none());
    }

    #[tokio::test]
    async fn test_resolve_honors_provided_resolution_time() {
        let (detector, _) = detector_with(leak_snapshot());
        let detected = detector.detect_once().await.unwrap();

        let stamped = Utc::now() - chrono::Duration::minutes(10);
        let resolution = BottleneckResolution {
            resolved_by: ResolvedBy::Automatic,
            action_taken: "Raised cache ceiling".to_string(),
            resolution_time: Some(stamped),
            follow_up_actions: vec![],
        };
        let resolved = detector.resolve(&detected[0].id, resolution).unwrap();
        assert_eq!(resolved.resolution_time, Some(stamped));
    }

    #[tokio::test]
    async fn test_remove_archives_unresolved() {
        let (detector, _) = detector_with(leak_snapshot());
        let detected = detector.detect_once().await.unwrap();
        let id = detected[0].id.clone();

        assert!(detector.remove(&id));
        assert!(!detector.remove(&id));

        let history = detector.historical_bottlenecks();
        assert_eq!(history.len(), 1);
        assert!(history[0].resolved_at.is_none());
    }

    #[tokio::test]
    async fn test_analysis_stats_aggregation() {
        let (detector, _) = detector_with(leak_snapshot());
        let detected = detector.detect_once().await.unwrap();
        detector.resolve(&detected[0].id, manual_resolution()).unwrap();

        // A second detection left active
        detector.detect_once().await.unwrap();

        let stats = detector.analysis_stats();
        assert_eq!(stats.active_count, 1);
        assert_eq!(stats.resolved_count, 1);
        assert_eq!(stats.unresolved_count, 0);
        assert_eq!(stats.resolution_rate, 100.0);
        assert_eq!(stats.top_patterns[0].pattern_id, "memory-leak");
        assert_eq!(stats.top_patterns[0].count, 2);
    }

    #[tokio::test]
    async fn test_analysis_stats_empty() {
        let (detector, _) = detector_with(healthy_snapshot());

        let stats = detector.analysis_stats();
        assert_eq!(stats.active_count, 0);
        assert_eq!(stats.resolved_count, 0);
        assert_eq!(stats.unresolved_count, 0);
        assert_eq!(stats.average_resolution_minutes, 0.0);
        assert_eq!(stats.resolution_rate, 0.0);
        assert!(stats.top_patterns.is_empty());
    }

    #[tokio::test]
    async fn test_resolution_rate_counts_unresolved() {
        let (detector, _) = detector_with(leak_snapshot());
        let first = detector.detect_once().await.unwrap();
        detector.resolve(&first[0].id, manual_resolution()).unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = detector.detect_once().await.unwrap();
        detector.remove(&second[0].id);

        let stats = detector.analysis_stats();
        assert_eq!(stats.resolved_count, 1);
        assert_eq!(stats.unresolved_count, 1);
        assert_eq!(stats.resolution_rate, 50.0);
    }

    #[tokio::test]
    async fn test_correlations_for_unknown_id() {
        let (detector, _) = detector_with(healthy_snapshot());
        assert!(detector.correlations_for("no-such-id").is_none());
    }

    #[tokio::test]
    async fn test_destroy_clears_state_and_is_idempotent() {
        let (detector, _) = detector_with(leak_snapshot());
        detector.start();
        detector.detect_once().await.unwrap();

        detector.destroy();
        assert!(detector.active_bottlenecks().is_empty());
        assert_eq!(detector.metric_samples().len(), 0);
        assert!(detector.historical_bottlenecks().is_empty());

        detector.destroy();
        assert!(detector.active_bottlenecks().is_empty());
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let (detector, _) = detector_with(healthy_snapshot());
        detector.start();
        detector.start();
        detector.destroy();
    }

    #[tokio::test]
    async fn test_insights_reflect_active_bottlenecks() {
        let (detector, _) = detector_with(leak_snapshot());
        detector.detect_once().await.unwrap();

        let insights = detector.insights();
        assert_eq!(insights.active.len(), 1);
        assert_eq!(insights.active[0].pattern_id, "memory-leak");
    }

    #[tokio::test]
    async fn test_execute_action_unknown_bottleneck() {
        let (detector, _) = detector_with(healthy_snapshot());

        let outcome = detector.execute_action("no-such-id", "grow-cache");
        assert!(!outcome.success);
        assert!(outcome.message.contains("Bottleneck not found"));
    }

    #[tokio::test]
    async fn test_execute_action_against_detected_bottleneck() {
        let (detector, _) = detector_with(leak_snapshot());
        let detected = detector.detect_once().await.unwrap();

        // memory-leak declares grow-cache without approval
        let outcome = detector.execute_action(&detected[0].id, "grow-cache");
        assert!(outcome.success);
        assert_eq!(outcome.result.unwrap()["applied"], "cache-resize");
    }

    #[tokio::test]
    async fn test_describe_action() {
        let (detector, _) = detector_with(leak_snapshot());
        let detected = detector.detect_once().await.unwrap();

        let action = detector.describe_action(&detected[0].id, "grow-cache").unwrap();
        assert_eq!(action.script, "increase-cache-memory");
        assert!(detector.describe_action(&detected[0].id, "missing").is_none());
        assert!(detector.describe_action("no-such-id", "grow-cache").is_none());
    }

    #[tokio::test]
    async fn test_pattern_unregistered_at_runtime_stops_firing() {
        let (detector, _) = detector_with(leak_snapshot());
        assert!(detector.registry().unregister("memory-leak"));

        let detected = detector.detect_once().await.unwrap();
        assert!(detected.iter().all(|b| b.pattern_id != "memory-leak"));
    }
}
