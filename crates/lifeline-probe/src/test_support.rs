//! Scriptable pool used by unit tests

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lifeline_core::{Connection, ConnectionPool, LifelineError, PoolStats, Result};
use parking_lot::Mutex;

/// What the next ping does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Succeed,
    Fail,
    /// Never completes
    Hang,
    /// Succeeds after the given delay
    Delay(Duration),
}

struct Script {
    steps: Mutex<VecDeque<Step>>,
    fallback: Mutex<Step>,
    pings: AtomicU32,
}

impl Script {
    async fn ping(&self) -> Result<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .pop_front()
            .unwrap_or_else(|| *self.fallback.lock());
        match step {
            Step::Succeed => Ok(()),
            Step::Fail => Err(LifelineError::Connection("Connection refused".into())),
            Step::Hang => std::future::pending::<Result<()>>().await,
            Step::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

/// Pool whose pings follow a script, then a fallback step
pub(crate) struct MockPool {
    script: Arc<Script>,
    acquires: AtomicU32,
    closed_connections: AtomicBool,
    stats: Mutex<Option<PoolStats>>,
}

impl MockPool {
    pub(crate) fn scripted(steps: impl IntoIterator<Item = Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Arc::new(Script {
                steps: Mutex::new(steps.into_iter().collect()),
                fallback: Mutex::new(fallback),
                pings: AtomicU32::new(0),
            }),
            acquires: AtomicU32::new(0),
            closed_connections: AtomicBool::new(false),
            stats: Mutex::new(None),
        })
    }

    pub(crate) fn healthy() -> Arc<Self> {
        Self::scripted([], Step::Succeed)
    }

    pub(crate) fn failing() -> Arc<Self> {
        Self::scripted([], Step::Fail)
    }

    pub(crate) fn set_fallback(&self, step: Step) {
        *self.script.fallback.lock() = step;
    }

    pub(crate) fn set_stats(&self, stats: PoolStats) {
        *self.stats.lock() = Some(stats);
    }

    /// Hand out connections that report themselves closed
    pub(crate) fn close_connections(&self) {
        self.closed_connections.store(true, Ordering::SeqCst);
    }

    pub(crate) fn ping_count(&self) -> u32 {
        self.script.pings.load(Ordering::SeqCst)
    }

    pub(crate) fn acquire_count(&self) -> u32 {
        self.acquires.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionPool for MockPool {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn ping(&self, _timeout: Duration) -> Result<()> {
        self.script.ping().await
    }

    async fn acquire(&self) -> Result<Arc<dyn Connection>> {
        self.acquires.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockConnection {
            script: self.script.clone(),
            closed: self.closed_connections.load(Ordering::SeqCst),
        }))
    }

    fn stats(&self) -> Option<PoolStats> {
        *self.stats.lock()
    }
}

struct MockConnection {
    script: Arc<Script>,
    closed: bool,
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn ping(&self, _timeout: Duration) -> Result<()> {
        self.script.ping().await
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
