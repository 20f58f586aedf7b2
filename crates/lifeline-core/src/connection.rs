//! Connection and pool traits consumed by the health probe

use crate::{LifelineError, PoolStats, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A single established connection to a data store
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite", "postgresql", "mysql")
    fn driver_name(&self) -> &str;

    /// Perform the cheapest round trip the driver supports (`SELECT 1`,
    /// a protocol-level ping, ...).
    ///
    /// `timeout` is the budget the caller will enforce. Drivers may use it
    /// to configure socket deadlines, but the caller abandons the future
    /// once the budget is spent regardless.
    async fn ping(&self, timeout: Duration) -> Result<()>;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}

/// A pool of connections to a single data store
///
/// The probe only needs a liveness check over the whole pool and, for deep
/// checks, the ability to borrow one connection. Dropping the returned
/// `Arc` hands the connection back.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    /// Get the driver name of the pooled connections
    fn driver_name(&self) -> &str;

    /// Lightweight liveness check for the pool as a whole
    async fn ping(&self, timeout: Duration) -> Result<()>;

    /// Borrow a connection from the pool
    async fn acquire(&self) -> Result<Arc<dyn Connection>>;

    /// Current occupancy, if the pool tracks it
    fn stats(&self) -> Option<PoolStats> {
        None
    }
}

#[async_trait]
impl<T: ConnectionPool + ?Sized> ConnectionPool for Arc<T> {
    fn driver_name(&self) -> &str {
        (**self).driver_name()
    }

    async fn ping(&self, timeout: Duration) -> Result<()> {
        (**self).ping(timeout).await
    }

    async fn acquire(&self) -> Result<Arc<dyn Connection>> {
        (**self).acquire().await
    }

    fn stats(&self) -> Option<PoolStats> {
        (**self).stats()
    }
}

/// Exposes a single connection through the [`ConnectionPool`] interface.
///
/// `acquire` hands out the same connection every time, so a deep check
/// against a `DirectConnection` pings the one underlying connection.
#[derive(Clone)]
pub struct DirectConnection {
    connection: Arc<dyn Connection>,
}

impl DirectConnection {
    /// Wrap an established connection
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self { connection }
    }

    /// Get the wrapped connection
    pub fn inner(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    fn ensure_open(&self) -> Result<()> {
        if self.connection.is_closed() {
            return Err(LifelineError::Connection("Connection is closed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectionPool for DirectConnection {
    fn driver_name(&self) -> &str {
        self.connection.driver_name()
    }

    async fn ping(&self, timeout: Duration) -> Result<()> {
        self.ensure_open()?;
        self.connection.ping(timeout).await
    }

    async fn acquire(&self) -> Result<Arc<dyn Connection>> {
        self.ensure_open()?;
        Ok(self.connection.clone())
    }
}
