//! Bounded metric-sample history and bottleneck archive

use crate::metrics::MetricsSnapshot;
use chrono::{DateTime, Duration, Utc};
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One periodic metrics snapshot retained for trend and correlation lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
    /// The snapshot contents
    pub snapshot: MetricsSnapshot,
}

/// Archival summary of a bottleneck after it left the active map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Bottleneck id
    pub bottleneck_id: String,
    /// Pattern that produced the bottleneck
    pub pattern_id: String,
    /// Detection time
    pub detected_at: DateTime<Utc>,
    /// Resolution time, absent when the bottleneck was removed unresolved
    pub resolved_at: Option<DateTime<Utc>>,
    /// Confidence at detection time
    pub confidence: OrderedFloat<f64>,
    /// Actions taken against the bottleneck
    pub actions_taken: Vec<String>,
}

/// In-memory store for metric samples and archival bottleneck records.
///
/// The sample ring is appended to by the detection loop only; readers get
/// cloned snapshots so an append-plus-trim never races a concurrent read.
/// The archive is pruned to the retention window on every insertion, so
/// neither structure grows unbounded under a perpetual detection loop.
pub struct HistoryStore {
    samples: RwLock<VecDeque<MetricSample>>,
    archive: RwLock<VecDeque<HistoryRecord>>,
    max_samples: usize,
    retention: Duration,
}

impl HistoryStore {
    /// Create a store retaining at most `max_samples` metric samples and
    /// archival records no older than `retention_days`.
    pub fn new(max_samples: usize, retention_days: i64) -> Self {
        Self {
            samples: RwLock::new(VecDeque::with_capacity(max_samples)),
            archive: RwLock::new(VecDeque::new()),
            max_samples,
            retention: Duration::days(retention_days),
        }
    }

    /// Append a metric sample, evicting the oldest past the cap.
    pub fn record_sample(&self, sample: MetricSample) {
        let mut samples = self.samples.write();
        samples.push_back(sample);
        while samples.len() > self.max_samples {
            samples.pop_front();
        }
    }

    /// All retained samples, oldest first.
    pub fn samples(&self) -> Vec<MetricSample> {
        self.samples.read().iter().cloned().collect()
    }

    /// The most recent `count` samples, oldest first.
    pub fn recent_samples(&self, count: usize) -> Vec<MetricSample> {
        let samples = self.samples.read();
        let skip = samples.len().saturating_sub(count);
        samples.iter().skip(skip).cloned().collect()
    }

    /// Number of retained samples.
    pub fn sample_count(&self) -> usize {
        self.samples.read().len()
    }

    /// Archive a bottleneck record, pruning entries older than the
    /// retention window.
    pub fn archive_record(&self, record: HistoryRecord) {
        let cutoff = Utc::now() - self.retention;
        let mut archive = self.archive.write();
        archive.push_back(record);
        archive.retain(|r| r.detected_at > cutoff);
    }

    /// All archival records, newest first.
    pub fn historical(&self) -> Vec<HistoryRecord> {
        let mut records: Vec<HistoryRecord> = self.archive.read().iter().cloned().collect();
        records.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));
        records
    }

    /// A page of archival records, newest first.
    pub fn historical_page(&self, limit: usize, offset: usize) -> Vec<HistoryRecord> {
        self.historical().into_iter().skip(offset).take(limit).collect()
    }

    /// Drop all samples and archival records.
    pub fn clear(&self) {
        self.samples.write().clear();
        self.archive.write().clear();
    }
}
