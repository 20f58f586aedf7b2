//! Lifeline Core - Collaborator abstractions for connection health probing
//!
//! This crate defines what the probe needs from a data-store client and
//! nothing more:
//!
//! - `Connection` - a single established connection with a cheap liveness round trip
//! - `ConnectionPool` - a pool of connections that can be pinged and acquired from
//! - `DirectConnection` - adapter that exposes one connection as a one-slot pool
//! - `PoolStats` - point-in-time pool occupancy
//! - `LifelineError` - error type returned by collaborators

mod connection;
mod error;
mod pool;

pub use connection::*;
pub use error::*;
pub use pool::*;
