//! Lifeline Probe - Health probing and bounded reconnection
//!
//! This crate watches a connection pool from the client side. A background
//! loop runs timeout-bounded liveness checks, applies hysteresis before
//! declaring the target healthy or unhealthy, and drives a bounded
//! exponential-backoff reconnect episode when the target goes down.
//! Observers are notified of every transition through [`ProbeEvent`]s.

mod config;
mod error;
pub mod events;
pub mod health;
pub mod monitor;
mod pool_health;
pub mod reconnect;

#[cfg(test)]
mod test_support;

pub use config::{CheckMode, ProbeConfig, ReconnectPolicy, validate_probe_config};
pub use error::{ProbeError, ProbeResult};
pub use events::{HandlerId, ProbeEvent, ProbeEventHandler, ProbeEventKind};
pub use health::{
    CheckFailure, CheckResult, HealthState, LatencyClass, LatencyThresholds, ProbeMetrics,
    ProbeRuntimeState,
};
pub use monitor::HealthProbe;
pub use pool_health::{PoolHealthReport, PoolPressure};
pub use reconnect::backoff_delay;
