//! Runtime catalog of registered bottleneck patterns

use super::types::{BottleneckPattern, PatternCategory, PatternSeverity};
use crate::error::{BottleneckDetectionError, BottleneckDetectionResult};
use dashmap::DashMap;

/// Minimum confidence a pattern must require to qualify for quick detection.
const QUICK_DETECTION_CONFIDENCE: f64 = 80.0;

/// Catalog of registered bottleneck patterns.
///
/// Owns pattern objects exclusively; callers get value copies. Patterns
/// are never mutated in place, re-registering the same id replaces the
/// previous definition.
#[derive(Default)]
pub struct PatternRegistry {
    patterns: DashMap<String, BottleneckPattern>,
}

impl PatternRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the given patterns.
    pub fn with_patterns(
        patterns: Vec<BottleneckPattern>,
    ) -> BottleneckDetectionResult<Self> {
        let registry = Self::new();
        for pattern in patterns {
            registry.register(pattern)?;
        }
        Ok(registry)
    }

    /// Insert or replace a pattern by id.
    ///
    /// Rejects patterns with no conditions or a minimum confidence outside
    /// 0-100 as configuration errors.
    pub fn register(&self, pattern: BottleneckPattern) -> BottleneckDetectionResult<()> {
        if pattern.conditions.is_empty() {
            return Err(BottleneckDetectionError::ConfigurationError {
                parameter: format!("patterns.{}.conditions", pattern.id),
                message: "pattern must declare at least one condition".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&pattern.minimum_confidence) {
            return Err(BottleneckDetectionError::ConfigurationError {
                parameter: format!("patterns.{}.minimum_confidence", pattern.id),
                message: format!(
                    "minimum confidence must be within 0-100, got {}",
                    pattern.minimum_confidence
                ),
            });
        }

        self.patterns.insert(pattern.id.clone(), pattern);
        Ok(())
    }

    /// Remove a pattern by id, reporting whether anything was removed.
    pub fn unregister(&self, pattern_id: &str) -> bool {
        self.patterns.remove(pattern_id).is_some()
    }

    /// Look up a pattern by id.
    pub fn get(&self, pattern_id: &str) -> Option<BottleneckPattern> {
        self.patterns.get(pattern_id).map(|entry| entry.value().clone())
    }

    /// All registered patterns.
    pub fn all(&self) -> Vec<BottleneckPattern> {
        self.patterns.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Patterns in the given category.
    pub fn by_category(&self, category: PatternCategory) -> Vec<BottleneckPattern> {
        self.patterns
            .iter()
            .filter(|entry| entry.value().category == category)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Patterns with the given severity.
    pub fn by_severity(&self, severity: PatternSeverity) -> Vec<BottleneckPattern> {
        self.patterns
            .iter()
            .filter(|entry| entry.value().severity == severity)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// High-signal patterns suitable for quick detection sweeps: minimum
    /// confidence of at least 80 and any category except efficiency.
    pub fn quick_detection_patterns(&self) -> Vec<BottleneckPattern> {
        self.patterns
            .iter()
            .filter(|entry| {
                let pattern = entry.value();
                pattern.minimum_confidence >= QUICK_DETECTION_CONFIDENCE
                    && pattern.category != PatternCategory::Efficiency
            })
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
