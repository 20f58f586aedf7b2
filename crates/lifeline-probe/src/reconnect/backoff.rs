//! Exponential backoff calculator for reconnect attempts
//!
//! Delays grow by the policy's multiplier on every attempt and are capped at
//! the policy's maximum. With jitter enabled each delay is drawn uniformly
//! from half to one and a half times the base delay, which spreads out
//! clients that lost the same server at the same moment.

use std::time::Duration;

use rand::Rng;

use crate::config::ReconnectPolicy;

/// Delay before the given zero-based attempt, without jitter.
///
/// `min(initial_backoff * multiplier^attempt, max_backoff)`
pub fn base_delay(policy: &ReconnectPolicy, attempt: u32) -> Duration {
    let initial_ms = policy.initial_backoff().as_millis() as f64;
    let max_ms = policy.max_backoff().as_millis() as f64;
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);

    // f64::min discards NaN, so an overflowing product still lands on the cap
    let delay_ms = (initial_ms * policy.multiplier().powi(exponent)).min(max_ms);
    Duration::from_millis(delay_ms as u64)
}

/// Delay before the given zero-based attempt, jittered when the policy asks
/// for it.
pub fn backoff_delay(policy: &ReconnectPolicy, attempt: u32) -> Duration {
    backoff_delay_with_rng(policy, attempt, &mut rand::thread_rng())
}

/// Like [`backoff_delay`], drawing jitter from the supplied generator.
pub fn backoff_delay_with_rng<R: Rng + ?Sized>(
    policy: &ReconnectPolicy,
    attempt: u32,
    rng: &mut R,
) -> Duration {
    let base = base_delay(policy, attempt);
    if !policy.has_jitter() {
        return base;
    }

    let base_ns = base.as_nanos();
    if base_ns == 0 {
        return base;
    }

    let jittered_ns = base_ns / 2 + rng.gen_range(0..base_ns);
    let capped_ns = jittered_ns.min(policy.max_backoff().as_nanos());
    Duration::from_nanos(u64::try_from(capped_ns).unwrap_or(u64::MAX))
}
