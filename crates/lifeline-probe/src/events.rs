//! Probe events and their observers
//!
//! Every health transition and reconnect step is published as a
//! [`ProbeEvent`]. Observers register with an [`EventHub`] and are called
//! synchronously, in registration order, from the probe's control loop.

mod event;
mod hub;


pub use event::{ProbeEvent, ProbeEventKind};
pub use hub::{EventHub, HandlerId, ProbeEventHandler};
