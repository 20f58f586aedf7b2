//! Automatic reconnection with exponential backoff
//!
//! A reconnect episode starts when the probe declares its target unhealthy.
//! It re-runs the liveness check after growing delays until the target
//! answers, the attempt budget is spent, or the episode's time ceiling is
//! reached.
//!
//! # Example
//!
//! ```
//! use lifeline_probe::ReconnectPolicy;
//! use lifeline_probe::reconnect::backoff_delay;
//! use std::time::Duration;
//!
//! let policy = ReconnectPolicy::new(5, 100, 10_000);
//! assert_eq!(backoff_delay(&policy, 0), Duration::from_millis(100));
//! assert_eq!(backoff_delay(&policy, 3), Duration::from_millis(800));
//! ```

mod backoff;
mod episode;


pub use backoff::{backoff_delay, backoff_delay_with_rng, base_delay};
pub use episode::{EpisodeOutcome, ReconnectEpisode};
