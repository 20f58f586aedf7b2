//! Pool occupancy classification

use lifeline_core::PoolStats;
use serde::Serialize;

/// How hard the pool is being pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolPressure {
    /// Nothing checked out
    Idle,
    /// Some connections in use, some still idle
    Normal,
    /// Every connection is checked out
    Saturated,
    /// Callers are queued waiting for a connection
    Starved,
}

/// Pool statistics together with their classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolHealthReport {
    pub stats: PoolStats,
    /// Fraction of connections in use
    pub utilization: f64,
    pub pressure: PoolPressure,
}

impl PoolHealthReport {
    pub fn from_stats(stats: PoolStats) -> Self {
        let pressure = if stats.has_waiters() {
            PoolPressure::Starved
        } else if stats.is_saturated() {
            PoolPressure::Saturated
        } else if stats.active() == 0 {
            PoolPressure::Idle
        } else {
            PoolPressure::Normal
        };

        Self {
            stats,
            utilization: stats.utilization(),
            pressure,
        }
    }
}
