//! Probe and reconnect configuration
//!
//! Configuration is plain data: every default comes from a `Default` impl
//! that builds a fresh value, and nothing here is validated until
//! [`validate_probe_config`] runs.
//!
//! # Example
//!
//! ```
//! use lifeline_probe::{ProbeConfig, ReconnectPolicy, validate_probe_config};
//!
//! let config = ProbeConfig::new(10_000, 2_000)
//!     .with_failure_threshold(3)
//!     .with_reconnect_policy(ReconnectPolicy::new(5, 100, 10_000));
//!
//! assert!(validate_probe_config(&config).is_ok());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, ProbeResult};
use crate::health::LatencyThresholds;


/// How a single liveness check talks to the collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    /// Ping the pool as a whole
    #[default]
    Ping,
    /// Acquire a connection from the pool and ping that connection
    Deep,
}

/// Policy for one reconnect episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Maximum reconnect attempts per episode
    max_attempts: u32,
    /// Delay in milliseconds before the first attempt
    initial_backoff_ms: u64,
    /// Upper bound in milliseconds for any single delay
    max_backoff_ms: u64,
    /// Growth factor applied per attempt
    backoff_multiplier: f64,
    /// Whether delays are randomized
    jitter: bool,
    /// Ceiling in milliseconds on the whole episode (0 = unbounded)
    max_elapsed_ms: u64,
}

impl ReconnectPolicy {
    /// Create a policy with the given attempt budget and delay bounds.
    ///
    /// The multiplier defaults to 2.0, jitter is off and the episode has no
    /// elapsed-time ceiling.
    pub fn new(max_attempts: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms,
            max_backoff_ms,
            backoff_multiplier: 2.0,
            jitter: false,
            max_elapsed_ms: 0,
        }
    }

    /// Set the growth factor applied per attempt
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enable or disable randomized delays
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set the ceiling on total episode duration (0 = unbounded)
    pub fn with_max_elapsed_ms(mut self, max_elapsed_ms: u64) -> Self {
        self.max_elapsed_ms = max_elapsed_ms;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    pub fn has_jitter(&self) -> bool {
        self.jitter
    }

    /// Ceiling on total episode duration, `None` when unbounded
    pub fn max_elapsed(&self) -> Option<Duration> {
        (self.max_elapsed_ms > 0).then(|| Duration::from_millis(self.max_elapsed_ms))
    }

    /// Check the policy on its own.
    pub fn validate(&self) -> ProbeResult<()> {
        if self.max_attempts < 1 {
            return Err(invalid("reconnect max_attempts must be at least 1"));
        }
        if self.initial_backoff_ms == 0 {
            return Err(invalid("reconnect initial_backoff must be greater than zero"));
        }
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(invalid(format!(
                "reconnect max_backoff ({}ms) cannot be less than initial_backoff ({}ms)",
                self.max_backoff_ms, self.initial_backoff_ms
            )));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(invalid(format!(
                "reconnect backoff_multiplier must be a finite value >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }
}

impl Default for ReconnectPolicy {
    /// 5 attempts, 100ms initial delay, 30s cap, 2x growth, jittered, unbounded episode
    fn default() -> Self {
        Self::new(5, 100, 30_000).with_jitter(true)
    }
}

/// Configuration for one health probe instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Time between periodic checks in milliseconds
    interval_ms: u64,
    /// Budget for a single check in milliseconds
    timeout_ms: u64,
    /// Consecutive failures before the probe declares the target unhealthy
    failure_threshold: u32,
    /// Consecutive successes before an unhealthy target is declared healthy
    success_threshold: u32,
    /// Whether a transition to unhealthy starts a reconnect episode
    enable_auto_reconnect: bool,
    check_mode: CheckMode,
    reconnect_policy: ReconnectPolicy,
    latency_thresholds: LatencyThresholds,
}

impl ProbeConfig {
    /// Create a configuration with the given check interval and timeout.
    ///
    /// Thresholds, reconnect policy and check mode take their defaults.
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval_ms,
            timeout_ms,
            failure_threshold: 3,
            success_threshold: 2,
            enable_auto_reconnect: true,
            check_mode: CheckMode::Ping,
            reconnect_policy: ReconnectPolicy::default(),
            latency_thresholds: LatencyThresholds::default(),
        }
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    ///
    /// Parsing does not validate; call [`validate_probe_config`] on the result.
    pub fn from_toml_str(source: &str) -> ProbeResult<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.enable_auto_reconnect = enabled;
        self
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect_policy = policy;
        self
    }

    pub fn with_check_mode(mut self, mode: CheckMode) -> Self {
        self.check_mode = mode;
        self
    }

    pub fn with_latency_thresholds(mut self, thresholds: LatencyThresholds) -> Self {
        self.latency_thresholds = thresholds;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn success_threshold(&self) -> u32 {
        self.success_threshold
    }

    pub fn auto_reconnect(&self) -> bool {
        self.enable_auto_reconnect
    }

    pub fn check_mode(&self) -> CheckMode {
        self.check_mode
    }

    pub fn reconnect_policy(&self) -> &ReconnectPolicy {
        &self.reconnect_policy
    }

    pub fn latency_thresholds(&self) -> &LatencyThresholds {
        &self.latency_thresholds
    }

    /// Equivalent to [`validate_probe_config`]
    pub fn validate(&self) -> ProbeResult<()> {
        validate_probe_config(self)
    }
}

impl Default for ProbeConfig {
    /// Defaults: 30s interval, 5s timeout, 3 failures / 2 successes, auto-reconnect on
    fn default() -> Self {
        Self::new(30_000, 5_000)
    }
}

/// Reject configurations the probe cannot run with.
///
/// The reconnect policy is only checked when auto-reconnect is enabled.
pub fn validate_probe_config(config: &ProbeConfig) -> ProbeResult<()> {
    if config.interval_ms == 0 {
        return Err(invalid("interval must be greater than zero"));
    }
    if config.timeout_ms == 0 {
        return Err(invalid("timeout must be greater than zero"));
    }
    if config.timeout_ms > config.interval_ms {
        return Err(invalid(format!(
            "timeout ({}ms) cannot exceed interval ({}ms)",
            config.timeout_ms, config.interval_ms
        )));
    }
    if config.failure_threshold < 1 {
        return Err(invalid("failure_threshold must be at least 1"));
    }
    if config.success_threshold < 1 {
        return Err(invalid("success_threshold must be at least 1"));
    }
    if config.enable_auto_reconnect {
        config.reconnect_policy.validate()?;
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> ProbeError {
    ProbeError::InvalidConfig(message.into())
}
