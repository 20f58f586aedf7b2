//! Background health monitoring
//!
//! [`HealthProbe`] owns the control loop for one pool: it ticks on the
//! configured interval, runs a bounded check, feeds the result to the state
//! machine, publishes transitions and starts a reconnect episode when the
//! target goes down.
//!
//! # Example
//!
//! ```ignore
//! use lifeline_probe::{HealthProbe, ProbeConfig, ProbeEvent};
//!
//! let probe = HealthProbe::new(ProbeConfig::new(10_000, 2_000), pool)?;
//! probe.add_event_handler(|event: &ProbeEvent| println!("{}", event.message));
//! probe.start().await?;
//!
//! // ...
//!
//! probe.stop().await?;
//! ```

mod controller;


pub use controller::HealthProbe;
