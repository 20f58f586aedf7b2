//! Health checking for connection pools
//!
//! This module provides the bounded liveness check, the hysteresis state
//! machine that turns check results into health transitions, and latency
//! classification for successful checks.
//!
//! # Example
//!
//! ```ignore
//! use lifeline_probe::health::{HealthProber, ProbeStateMachine};
//!
//! let prober = HealthProber::new(pool, Duration::from_secs(2), CheckMode::Ping);
//! let mut machine = ProbeStateMachine::new(3, 2);
//!
//! let result = prober.check().await;
//! let transition = machine.record_check(&result, Instant::now());
//! ```

mod latency;
mod prober;
mod state;


pub use latency::{LatencyClass, LatencyThresholds};
pub use prober::{CheckFailure, CheckResult, HealthProber};
pub use state::{HealthState, ProbeMetrics, ProbeRuntimeState, ProbeStateMachine, Transition};
