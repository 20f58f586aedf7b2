//! Latency classification
//!
//! Classifies the round-trip time of successful checks. The classification
//! is informational: a slow but successful check still counts as a success.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Latency bucket of a successful check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyClass {
    /// At or under the fast threshold
    Fast,
    /// Above fast, at or under the elevated threshold
    Elevated,
    /// Above the elevated threshold
    Slow,
}

impl LatencyClass {
    /// Classify a round-trip time.
    ///
    /// # Example
    ///
    /// ```
    /// use lifeline_probe::{LatencyClass, LatencyThresholds};
    /// use std::time::Duration;
    ///
    /// let thresholds = LatencyThresholds::default();
    /// assert_eq!(LatencyClass::classify(Duration::from_millis(50), &thresholds), LatencyClass::Fast);
    /// assert_eq!(LatencyClass::classify(Duration::from_millis(200), &thresholds), LatencyClass::Elevated);
    /// assert_eq!(LatencyClass::classify(Duration::from_secs(1), &thresholds), LatencyClass::Slow);
    /// ```
    pub fn classify(latency: Duration, thresholds: &LatencyThresholds) -> Self {
        if latency <= thresholds.fast() {
            LatencyClass::Fast
        } else if latency <= thresholds.elevated() {
            LatencyClass::Elevated
        } else {
            LatencyClass::Slow
        }
    }

    /// Check if the latency is within the elevated threshold.
    pub fn is_acceptable(&self) -> bool {
        matches!(self, LatencyClass::Fast | LatencyClass::Elevated)
    }
}

/// Thresholds for latency classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyThresholds {
    /// Maximum latency in milliseconds considered fast
    fast_ms: u64,
    /// Maximum latency in milliseconds considered elevated (above this is slow)
    elevated_ms: u64,
}

impl LatencyThresholds {
    /// Create new thresholds. `elevated_ms` is raised to `fast_ms` if lower.
    pub fn new(fast_ms: u64, elevated_ms: u64) -> Self {
        Self {
            fast_ms,
            elevated_ms: elevated_ms.max(fast_ms),
        }
    }

    pub fn fast(&self) -> Duration {
        Duration::from_millis(self.fast_ms)
    }

    pub fn elevated(&self) -> Duration {
        Duration::from_millis(self.elevated_ms)
    }
}

impl Default for LatencyThresholds {
    /// Default thresholds: fast <= 100ms, elevated <= 500ms
    fn default() -> Self {
        Self::new(100, 500)
    }
}
