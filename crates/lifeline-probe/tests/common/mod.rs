//! Common test utilities and mocks

#![allow(dead_code)]

use async_trait::async_trait;
use lifeline_core::{Connection, ConnectionPool, LifelineError, PoolStats, Result};
use lifeline_probe::ProbeEvent;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Mock pool whose health can be flipped while a probe is watching it.
///
/// Clones share the same switches and counters, so a test can keep one
/// clone and hand the other to the probe.
#[derive(Clone)]
pub struct MockPool {
    pub driver: String,
    pub healthy: Arc<AtomicBool>,
    pub pings: Arc<AtomicUsize>,
    /// Round-trip added to every ping
    pub latency: Duration,
    pub stats: Option<PoolStats>,
}

impl MockPool {
    pub fn new() -> Self {
        Self {
            driver: "mock".to_string(),
            healthy: Arc::new(AtomicBool::new(true)),
            pings: Arc::new(AtomicUsize::new(0)),
            latency: Duration::ZERO,
            stats: None,
        }
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    pub fn with_failure(self) -> Self {
        self.set_healthy(false);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_stats(mut self, stats: PoolStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    async fn answer(&self) -> Result<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LifelineError::Connection("Connection refused".into()))
        }
    }
}

#[async_trait]
impl ConnectionPool for MockPool {
    fn driver_name(&self) -> &str {
        &self.driver
    }

    async fn ping(&self, _timeout: Duration) -> Result<()> {
        self.answer().await
    }

    async fn acquire(&self) -> Result<Arc<dyn Connection>> {
        Ok(Arc::new(MockConnection { pool: self.clone() }))
    }

    fn stats(&self) -> Option<PoolStats> {
        self.stats
    }
}

pub struct MockConnection {
    pool: MockPool,
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        &self.pool.driver
    }

    async fn ping(&self, _timeout: Duration) -> Result<()> {
        self.pool.answer().await
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

/// Collects every event a probe publishes
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ProbeEvent>>>,
}

impl EventLog {
    pub fn handler(&self) -> impl Fn(&ProbeEvent) + Send + Sync + 'static {
        let events = self.events.clone();
        move |event: &ProbeEvent| events.lock().push(event.clone())
    }

    pub fn events(&self) -> Vec<ProbeEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<lifeline_probe::ProbeEventKind> {
        self.events.lock().iter().map(|event| event.kind).collect()
    }
}

/// Install a test-writer subscriber once per test binary
pub fn initialize_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lifeline_probe=debug")),
            )
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
