//! Probe state machine
//!
//! Turns a stream of check results into health transitions using
//! hysteresis thresholds, and keeps the running metrics that go with them.
//! The machine is plain data driven by explicit `now` instants, so the
//! control loop owns all timing and the machine can be exercised directly.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::prober::CheckResult;

/// Committed health of the probed target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// No check has completed yet
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl HealthState {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthState::Healthy)
    }
}

/// Snapshot of the probe's runtime state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProbeRuntimeState {
    pub current_health: HealthState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    /// Set while a reconnect episode is in progress; implies `Unhealthy`
    pub is_reconnecting: bool,
    /// Attempts made in the current episode
    pub reconnect_attempt: u32,
    pub episode_started_at: Option<DateTime<Utc>>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_state_change_at: Option<DateTime<Utc>>,
    /// Cause of the most recent failed check
    pub last_error: Option<String>,
    /// Round-trip time of the most recent successful check
    pub last_latency: Option<Duration>,
}

/// Running totals, only cleared by an explicit reset
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProbeMetrics {
    pub total_probes: u64,
    pub total_successes: u64,
    pub total_failures: u64,
    /// Time spent `Healthy`, measured between checks
    pub uptime: Duration,
    /// Time spent `Unhealthy`, measured between checks
    pub downtime: Duration,
    pub reconnect_episodes: u64,
    pub reconnect_successes: u64,
    pub reconnect_abandoned: u64,
    #[serde(skip)]
    latency_total: Duration,
}

impl ProbeMetrics {
    /// Fraction of checks that succeeded, 0.0 before the first check
    pub fn success_rate(&self) -> f64 {
        if self.total_probes == 0 {
            0.0
        } else {
            1.0 - self.total_failures as f64 / self.total_probes as f64
        }
    }

    /// Mean round-trip time over successful checks
    pub fn average_latency(&self) -> Option<Duration> {
        if self.total_successes == 0 {
            return None;
        }
        let mean = self.latency_total.as_nanos() / u128::from(self.total_successes);
        Some(Duration::from_nanos(mean as u64))
    }
}

/// Health transition produced by a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    BecameHealthy,
    BecameUnhealthy,
}

/// Hysteresis state machine plus metrics accounting
#[derive(Debug)]
pub struct ProbeStateMachine {
    failure_threshold: u32,
    success_threshold: u32,
    state: ProbeRuntimeState,
    metrics: ProbeMetrics,
    /// Point up to which uptime/downtime has been accrued
    accounted_at: Option<Instant>,
    episode_started: Option<Instant>,
}

impl ProbeStateMachine {
    pub fn new(failure_threshold: u32, success_threshold: u32) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            success_threshold: success_threshold.max(1),
            state: ProbeRuntimeState::default(),
            metrics: ProbeMetrics::default(),
            accounted_at: None,
            episode_started: None,
        }
    }

    pub fn state(&self) -> &ProbeRuntimeState {
        &self.state
    }

    pub fn metrics(&self) -> &ProbeMetrics {
        &self.metrics
    }

    pub fn health(&self) -> HealthState {
        self.state.current_health
    }

    /// Apply the result of a periodic check.
    pub fn record_check(&mut self, result: &CheckResult, now: Instant) -> Transition {
        self.observe(result, now);

        let health = self.state.current_health;
        match result {
            Ok(_) => {
                let commit = health != HealthState::Healthy
                    && (health == HealthState::Unknown
                        || self.state.consecutive_successes >= self.success_threshold);
                if commit {
                    self.become_healthy();
                    return Transition::BecameHealthy;
                }
            }
            Err(_) => {
                let commit = health != HealthState::Unhealthy
                    && (health == HealthState::Unknown
                        || self.state.consecutive_failures >= self.failure_threshold);
                if commit {
                    self.become_unhealthy();
                    return Transition::BecameUnhealthy;
                }
            }
        }
        Transition::Unchanged
    }

    /// Enter the reconnecting sub-state of `Unhealthy`.
    pub fn begin_episode(&mut self, now: Instant) {
        debug_assert_eq!(self.state.current_health, HealthState::Unhealthy);
        self.state.is_reconnecting = true;
        self.state.reconnect_attempt = 0;
        self.state.episode_started_at = Some(Utc::now());
        self.episode_started = Some(now);
        self.metrics.reconnect_episodes += 1;
    }

    /// Time since the current episode began, zero outside an episode
    pub fn episode_elapsed(&self, now: Instant) -> Duration {
        self.episode_started
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default()
    }

    /// Apply the result of a reconnect attempt.
    ///
    /// A successful attempt commits `Healthy` immediately; the success
    /// threshold only gates recovery observed by periodic checks.
    pub fn record_reconnect_attempt(&mut self, result: &CheckResult, now: Instant) -> Transition {
        self.observe(result, now);
        self.state.reconnect_attempt += 1;

        match result {
            Ok(_) => {
                self.metrics.reconnect_successes += 1;
                self.become_healthy();
                Transition::BecameHealthy
            }
            Err(_) => Transition::Unchanged,
        }
    }

    /// Leave the episode without recovering. Health stays `Unhealthy`.
    pub fn abandon_episode(&mut self) {
        self.state.is_reconnecting = false;
        self.episode_started = None;
        self.metrics.reconnect_abandoned += 1;
    }

    /// Drop out of an episode because the probe is stopping.
    ///
    /// Returns whether an episode was in progress.
    pub fn interrupt_episode(&mut self) -> bool {
        let was_reconnecting = self.state.is_reconnecting;
        self.state.is_reconnecting = false;
        self.episode_started = None;
        was_reconnecting
    }

    /// Clear all metrics. Runtime state is untouched.
    pub fn reset_metrics(&mut self, now: Instant) {
        self.metrics = ProbeMetrics::default();
        if self.accounted_at.is_some() {
            self.accounted_at = Some(now);
        }
    }

    fn observe(&mut self, result: &CheckResult, now: Instant) {
        self.accrue(now);
        self.metrics.total_probes += 1;
        self.state.last_checked_at = Some(Utc::now());

        match result {
            Ok(latency) => {
                self.metrics.total_successes += 1;
                self.metrics.latency_total += *latency;
                self.state.consecutive_successes = self.state.consecutive_successes.saturating_add(1);
                self.state.consecutive_failures = 0;
                self.state.last_latency = Some(*latency);
            }
            Err(failure) => {
                self.metrics.total_failures += 1;
                self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
                self.state.consecutive_successes = 0;
                self.state.last_error = Some(failure.to_string());
            }
        }
    }

    // Credits the time since the last accounting point to whichever state
    // was in force during it.
    fn accrue(&mut self, now: Instant) {
        if let Some(since) = self.accounted_at {
            let elapsed = now.saturating_duration_since(since);
            match self.state.current_health {
                HealthState::Healthy => self.metrics.uptime += elapsed,
                HealthState::Unhealthy => self.metrics.downtime += elapsed,
                HealthState::Unknown => {}
            }
        }
        self.accounted_at = Some(now);
    }

    fn become_healthy(&mut self) {
        self.state.current_health = HealthState::Healthy;
        self.state.is_reconnecting = false;
        self.state.reconnect_attempt = 0;
        self.state.last_state_change_at = Some(Utc::now());
        self.episode_started = None;
    }

    fn become_unhealthy(&mut self) {
        self.state.current_health = HealthState::Unhealthy;
        self.state.last_state_change_at = Some(Utc::now());
    }
}
