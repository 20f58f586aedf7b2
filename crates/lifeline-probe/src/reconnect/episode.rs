//! One reconnect episode

use parking_lot::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::backoff::backoff_delay;
use crate::config::ReconnectPolicy;
use crate::events::{EventHub, ProbeEvent, ProbeEventKind};
use crate::health::{CheckFailure, HealthProber, ProbeStateMachine};

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeOutcome {
    /// An attempt succeeded; the target is healthy again
    Recovered { attempts: u32 },
    /// The attempt budget or time ceiling ran out; the target stays unhealthy
    Abandoned { attempts: u32 },
    /// The probe was stopped mid-episode
    Cancelled,
}

/// Drives a bounded sequence of reconnect attempts.
///
/// The state machine lock is held only while a result is applied and is
/// released before any event is emitted, so handlers always see state that
/// already reflects the event.
pub struct ReconnectEpisode<'a> {
    policy: &'a ReconnectPolicy,
    prober: &'a HealthProber,
    machine: &'a RwLock<ProbeStateMachine>,
    hub: &'a EventHub,
}

impl<'a> ReconnectEpisode<'a> {
    pub fn new(
        policy: &'a ReconnectPolicy,
        prober: &'a HealthProber,
        machine: &'a RwLock<ProbeStateMachine>,
        hub: &'a EventHub,
    ) -> Self {
        Self {
            policy,
            prober,
            machine,
            hub,
        }
    }

    /// Run the episode to completion or cancellation.
    ///
    /// The target must already be `Unhealthy`.
    pub async fn run(&self, cancel: &CancellationToken) -> EpisodeOutcome {
        let driver = self.prober.driver_name();

        self.machine.write().begin_episode(Instant::now());
        tracing::info!(
            driver = %driver,
            max_attempts = self.policy.max_attempts(),
            "starting reconnect episode"
        );
        self.hub.emit(&ProbeEvent::new(
            ProbeEventKind::ReconnectStarted,
            format!("Reconnecting to {driver}"),
        ));

        let mut attempts = 0u32;
        while attempts < self.policy.max_attempts() && self.within_time_budget() {
            let delay = backoff_delay(self.policy, attempts);
            tracing::debug!(
                driver = %driver,
                attempt = attempts + 1,
                delay_ms = delay.as_millis() as u64,
                "waiting before reconnect attempt"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.interrupted(),
                _ = tokio::time::sleep(delay) => {}
            }

            let result = self.prober.check_cancellable(cancel).await;
            if matches!(result, Err(CheckFailure::Cancelled)) {
                return self.interrupted();
            }

            attempts += 1;
            self.machine
                .write()
                .record_reconnect_attempt(&result, Instant::now());

            match result {
                Ok(latency) => {
                    tracing::info!(
                        driver = %driver,
                        attempt = attempts,
                        latency_ms = latency.as_millis() as u64,
                        "reconnected"
                    );
                    self.hub.emit(
                        &ProbeEvent::new(
                            ProbeEventKind::ReconnectSuccess,
                            format!("Reconnected to {driver} on attempt {attempts}"),
                        )
                        .with_attempt(attempts),
                    );
                    self.hub.emit(&ProbeEvent::new(
                        ProbeEventKind::Healthy,
                        format!("{driver} is healthy"),
                    ));
                    return EpisodeOutcome::Recovered { attempts };
                }
                Err(failure) => {
                    tracing::warn!(
                        driver = %driver,
                        attempt = attempts,
                        error = %failure,
                        "reconnect attempt failed"
                    );
                    self.hub.emit(
                        &ProbeEvent::new(
                            ProbeEventKind::ReconnectFailed,
                            format!("Reconnect attempt {attempts} failed: {failure}"),
                        )
                        .with_attempt(attempts)
                        .with_cause(failure),
                    );
                }
            }
        }

        self.machine.write().abandon_episode();
        tracing::warn!(driver = %driver, attempts, "reconnect episode abandoned");
        self.hub.emit(&ProbeEvent::new(
            ProbeEventKind::ReconnectAbandoned,
            format!("Gave up reconnecting to {driver} after {attempts} attempts"),
        ));
        EpisodeOutcome::Abandoned { attempts }
    }

    fn within_time_budget(&self) -> bool {
        match self.policy.max_elapsed() {
            Some(limit) => self.machine.read().episode_elapsed(Instant::now()) < limit,
            None => true,
        }
    }

    fn interrupted(&self) -> EpisodeOutcome {
        if self.machine.write().interrupt_episode() {
            tracing::debug!(driver = %self.prober.driver_name(), "reconnect episode interrupted");
        }
        EpisodeOutcome::Cancelled
    }
}
