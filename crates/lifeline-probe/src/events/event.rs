use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::health::CheckFailure;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeEventKind {
    /// The target was declared healthy
    Healthy,
    /// The target was declared unhealthy
    Unhealthy,
    /// A reconnect episode began
    ReconnectStarted,
    /// A reconnect attempt succeeded and the episode ended
    ReconnectSuccess,
    /// A single reconnect attempt failed
    ReconnectFailed,
    /// The episode ran out of attempts or time
    ReconnectAbandoned,
}

impl ProbeEventKind {
    /// Whether this event belongs to a reconnect episode
    pub fn is_reconnect(&self) -> bool {
        !matches!(self, ProbeEventKind::Healthy | ProbeEventKind::Unhealthy)
    }
}

/// A notification delivered to every registered handler
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeEvent {
    pub kind: ProbeEventKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// 1-based attempt number, set on `ReconnectSuccess` and `ReconnectFailed`
    pub attempt: Option<u32>,
    /// Failure that triggered the event, if any
    pub cause: Option<CheckFailure>,
}

impl ProbeEvent {
    /// Create an event stamped with the current time
    pub fn new(kind: ProbeEventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: Utc::now(),
            attempt: None,
            cause: None,
        }
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    pub fn with_cause(mut self, cause: CheckFailure) -> Self {
        self.cause = Some(cause);
        self
    }
}
