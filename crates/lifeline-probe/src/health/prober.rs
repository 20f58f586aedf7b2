//! Single bounded liveness check against the connection pool

use std::sync::Arc;
use std::time::Duration;

use lifeline_core::{ConnectionPool, LifelineError};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::CheckMode;

/// Outcome of one liveness check: round-trip time on success
pub type CheckResult = Result<Duration, CheckFailure>;

/// Why a liveness check failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckFailure {
    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Liveness check timed out after {0:?}")]
    Timeout(Duration),

    #[error("Liveness check failed: {0}")]
    Collaborator(String),

    #[error("Liveness check cancelled")]
    Cancelled,
}

/// Runs timeout-bounded liveness checks against a pool.
///
/// The prober is stateless: it reports each outcome to its caller and never
/// touches probe state itself.
pub struct HealthProber {
    pool: Arc<dyn ConnectionPool>,
    timeout: Duration,
    mode: CheckMode,
}

impl HealthProber {
    pub fn new(pool: Arc<dyn ConnectionPool>, timeout: Duration, mode: CheckMode) -> Self {
        Self {
            pool,
            timeout,
            mode,
        }
    }

    /// Driver name of the probed pool, used to label logs
    pub fn driver_name(&self) -> &str {
        self.pool.driver_name()
    }

    pub fn pool(&self) -> &Arc<dyn ConnectionPool> {
        &self.pool
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform one liveness check bounded by the configured timeout.
    ///
    /// When the budget runs out the in-flight request is dropped, so a late
    /// reply has nowhere to land.
    pub async fn check(&self) -> CheckResult {
        let start = Instant::now();
        match tokio::time::timeout(self.timeout, self.run_check()).await {
            Ok(Ok(())) => Ok(start.elapsed()),
            Ok(Err(failure)) => Err(failure),
            Err(_) => Err(CheckFailure::Timeout(self.timeout)),
        }
    }

    /// Like [`check`](Self::check), but returns `Cancelled` as soon as the
    /// token fires.
    pub async fn check_cancellable(&self, cancel: &CancellationToken) -> CheckResult {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CheckFailure::Cancelled),
            result = self.check() => result,
        }
    }

    async fn run_check(&self) -> Result<(), CheckFailure> {
        match self.mode {
            CheckMode::Ping => self
                .pool
                .ping(self.timeout)
                .await
                .map_err(|e| self.classify(e)),
            CheckMode::Deep => {
                let conn = self.pool.acquire().await.map_err(|e| self.classify(e))?;
                if conn.is_closed() {
                    return Err(CheckFailure::ConnectionClosed);
                }
                conn.ping(self.timeout).await.map_err(|e| self.classify(e))
            }
        }
    }

    // `Cancelled` is reserved for the probe's own token; a collaborator that
    // reports cancellation has simply failed the check.
    fn classify(&self, error: LifelineError) -> CheckFailure {
        match error {
            LifelineError::Timeout(_) => CheckFailure::Timeout(self.timeout),
            other => CheckFailure::Collaborator(other.to_string()),
        }
    }
}
