use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lifeline_core::ConnectionPool;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::{ProbeConfig, validate_probe_config};
use crate::error::{ProbeError, ProbeResult};
use crate::events::{EventHub, HandlerId, ProbeEvent, ProbeEventHandler, ProbeEventKind};
use crate::health::{
    CheckFailure, HealthProber, LatencyClass, ProbeMetrics, ProbeRuntimeState, ProbeStateMachine,
    Transition,
};
use crate::pool_health::PoolHealthReport;
use crate::reconnect::{EpisodeOutcome, ReconnectEpisode};

/// State shared between the controller and its control loop
struct Shared {
    config: ProbeConfig,
    prober: HealthProber,
    machine: RwLock<ProbeStateMachine>,
    hub: EventHub,
    running: AtomicBool,
}

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Health probe for one connection pool.
///
/// At most one control loop runs per probe. Runtime state and metrics are
/// created with the probe and live until it is dropped; stopping and
/// restarting keeps them.
pub struct HealthProbe {
    shared: Arc<Shared>,
    running: Mutex<Option<RunningLoop>>,
}

impl HealthProbe {
    /// Create a probe for the given pool.
    ///
    /// The configuration is validated here, so a probe that exists can
    /// always be started.
    pub fn new<P>(config: ProbeConfig, pool: P) -> ProbeResult<Self>
    where
        P: ConnectionPool + 'static,
    {
        Self::from_shared(config, Arc::new(pool))
    }

    /// Create a probe for a pool that is already shared
    pub fn from_shared(config: ProbeConfig, pool: Arc<dyn ConnectionPool>) -> ProbeResult<Self> {
        validate_probe_config(&config)?;

        let prober = HealthProber::new(pool, config.timeout(), config.check_mode());
        let machine = ProbeStateMachine::new(config.failure_threshold(), config.success_threshold());

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                prober,
                machine: RwLock::new(machine),
                hub: EventHub::new(),
                running: AtomicBool::new(false),
            }),
            running: Mutex::new(None),
        })
    }

    /// Spawn the control loop. The first check runs immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(&self) -> ProbeResult<()> {
        let mut slot = self.running.lock().await;
        if slot.as_ref().is_some_and(|running| !running.handle.is_finished()) {
            return Err(ProbeError::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        self.shared.running.store(true, Ordering::SeqCst);
        let handle = tokio::spawn(run_loop(self.shared.clone(), cancel.clone()));
        *slot = Some(RunningLoop { cancel, handle });

        tracing::info!(
            driver = %self.driver_name(),
            interval_ms = self.shared.config.interval().as_millis() as u64,
            "health monitoring started"
        );
        Ok(())
    }

    /// Cancel the control loop and wait for it to exit.
    ///
    /// An in-flight check or backoff sleep is interrupted. A reconnect
    /// episode cut short this way is not reported as abandoned.
    pub async fn stop(&self) -> ProbeResult<()> {
        let mut slot = self.running.lock().await;
        let running = slot.take().ok_or(ProbeError::NotRunning)?;

        running.cancel.cancel();
        if let Err(e) = running.handle.await
            && e.is_panic()
        {
            tracing::error!(driver = %self.driver_name(), "health loop panicked");
        }
        self.shared.running.store(false, Ordering::SeqCst);

        tracing::info!(driver = %self.driver_name(), "health monitoring stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Copy of the current runtime state
    pub fn health_status(&self) -> ProbeRuntimeState {
        self.shared.machine.read().state().clone()
    }

    /// Copy of the accumulated metrics
    pub fn metrics(&self) -> ProbeMetrics {
        self.shared.machine.read().metrics().clone()
    }

    pub fn is_reconnecting(&self) -> bool {
        self.shared.machine.read().state().is_reconnecting
    }

    /// Clear all metrics. Health state is kept.
    pub fn reset_metrics(&self) {
        self.shared.machine.write().reset_metrics(Instant::now());
    }

    /// Latency class of the most recent successful check
    pub fn latency_class(&self) -> Option<LatencyClass> {
        let latency = self.shared.machine.read().state().last_latency?;
        Some(LatencyClass::classify(
            latency,
            self.shared.config.latency_thresholds(),
        ))
    }

    /// Occupancy report, if the pool tracks its statistics
    pub fn pool_health(&self) -> Option<PoolHealthReport> {
        self.shared
            .prober
            .pool()
            .stats()
            .map(PoolHealthReport::from_stats)
    }

    /// Register an event handler. Closures taking `&ProbeEvent` work too.
    pub fn add_event_handler<H>(&self, handler: H) -> HandlerId
    where
        H: ProbeEventHandler + 'static,
    {
        self.shared.hub.add_handler(Arc::new(handler))
    }

    /// Register a handler that is shared with other owners
    pub fn add_shared_event_handler(&self, handler: Arc<dyn ProbeEventHandler>) -> HandlerId {
        self.shared.hub.add_handler(handler)
    }

    /// Unregister a handler. Returns false if the id is unknown.
    pub fn remove_event_handler(&self, id: HandlerId) -> bool {
        self.shared.hub.remove_handler(id)
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.shared.config
    }

    pub fn driver_name(&self) -> &str {
        self.shared.prober.driver_name()
    }
}

impl Drop for HealthProbe {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for HealthProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthProbe")
            .field("driver", &self.driver_name())
            .field("config", &self.shared.config)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Clears the running flag however the loop exits
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

async fn run_loop(shared: Arc<Shared>, cancel: CancellationToken) {
    let _guard = RunningGuard(&shared.running);
    let driver = shared.prober.driver_name();

    let mut ticker = tokio::time::interval(shared.config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!(driver = %driver, "health loop starting");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = shared.prober.check_cancellable(&cancel).await;
        if matches!(result, Err(CheckFailure::Cancelled)) {
            break;
        }

        let transition = shared.machine.write().record_check(&result, Instant::now());
        match &result {
            Ok(latency) => {
                tracing::debug!(driver = %driver, latency_ms = latency.as_millis() as u64, "check succeeded")
            }
            Err(failure) => tracing::debug!(driver = %driver, error = %failure, "check failed"),
        }

        match transition {
            Transition::Unchanged => {}
            Transition::BecameHealthy => {
                tracing::info!(driver = %driver, "target is healthy");
                shared.hub.emit(&ProbeEvent::new(
                    ProbeEventKind::Healthy,
                    format!("{driver} is healthy"),
                ));
            }
            Transition::BecameUnhealthy => {
                let mut event =
                    ProbeEvent::new(ProbeEventKind::Unhealthy, format!("{driver} is unhealthy"));
                if let Err(failure) = result {
                    tracing::info!(driver = %driver, error = %failure, "target is unhealthy");
                    event = event.with_cause(failure);
                }
                shared.hub.emit(&event);

                if shared.config.auto_reconnect() {
                    let episode = ReconnectEpisode::new(
                        shared.config.reconnect_policy(),
                        &shared.prober,
                        &shared.machine,
                        &shared.hub,
                    );
                    if episode.run(&cancel).await == EpisodeOutcome::Cancelled {
                        break;
                    }
                    ticker.reset();
                }
            }
        }
    }

    shared.machine.write().interrupt_episode();
    tracing::debug!(driver = %driver, "health loop stopped");
}
