//! End-to-end tests for the health probe lifecycle

mod common;

use common::{EventLog, MockPool, initialize_logging};
use lifeline_core::PoolStats;
use lifeline_probe::{
    CheckMode, HealthProbe, HealthState, PoolPressure, ProbeConfig, ProbeError, ProbeEvent,
    ProbeEventKind, ReconnectPolicy,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn fast_config() -> ProbeConfig {
    ProbeConfig::new(1_000, 200)
        .with_failure_threshold(3)
        .with_success_threshold(2)
        .with_reconnect_policy(ReconnectPolicy::new(3, 100, 1_000))
}

async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[tokio::test(start_paused = true)]
async fn test_start_stop_cycle() -> anyhow::Result<()> {
    initialize_logging();
    let probe = HealthProbe::new(fast_config(), MockPool::new())?;

    for _ in 0..3 {
        probe.start().await?;
        assert!(probe.is_running());
        advance(Duration::from_millis(10)).await;
        probe.stop().await?;
        assert!(!probe.is_running());
    }

    assert_eq!(probe.metrics().total_probes, 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_misuse_is_reported() -> anyhow::Result<()> {
    initialize_logging();
    let probe = HealthProbe::new(fast_config(), MockPool::new())?;

    assert!(matches!(probe.stop().await, Err(ProbeError::NotRunning)));
    probe.start().await?;
    assert!(matches!(probe.start().await, Err(ProbeError::AlreadyRunning)));
    assert!(probe.is_running());
    probe.stop().await?;
    assert!(matches!(probe.stop().await, Err(ProbeError::NotRunning)));
    Ok(())
}

#[test]
fn test_invalid_config_never_builds_a_probe() {
    let result = HealthProbe::new(ProbeConfig::new(0, 5_000), MockPool::new());
    match result {
        Err(ProbeError::InvalidConfig(message)) => assert!(message.contains("interval")),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_episode_event_sequence() -> anyhow::Result<()> {
    initialize_logging();
    let pool = MockPool::new().with_failure();
    let probe = HealthProbe::new(fast_config(), pool)?;
    let log = EventLog::default();
    probe.add_event_handler(log.handler());

    probe.start().await?;
    // First failure commits Unhealthy at once, then 100 + 200 + 400ms of backoff.
    advance(Duration::from_millis(900)).await;

    assert_eq!(
        log.kinds(),
        vec![
            ProbeEventKind::Unhealthy,
            ProbeEventKind::ReconnectStarted,
            ProbeEventKind::ReconnectFailed,
            ProbeEventKind::ReconnectFailed,
            ProbeEventKind::ReconnectFailed,
            ProbeEventKind::ReconnectAbandoned,
        ]
    );

    let events = log.events();
    assert!(events[0].timestamp <= events[1].timestamp);
    let attempts: Vec<_> = events[2..5].iter().map(|event| event.attempt).collect();
    assert_eq!(attempts, vec![Some(1), Some(2), Some(3)]);

    let status = probe.health_status();
    assert_eq!(status.current_health, HealthState::Unhealthy);
    assert!(!status.is_reconnecting);
    assert!(status.last_error.is_some());

    probe.stop().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_outage_then_recovery() -> anyhow::Result<()> {
    initialize_logging();
    let pool = MockPool::new();
    let probe = HealthProbe::new(fast_config(), pool.clone())?;
    let log = EventLog::default();
    probe.add_event_handler(log.handler());

    probe.start().await?;
    advance(Duration::from_millis(10)).await;
    assert_eq!(log.kinds(), vec![ProbeEventKind::Healthy]);

    // Three failing ticks at 1s, 2s and 3s cross the threshold.
    pool.set_healthy(false);
    advance(Duration::from_millis(3_050)).await;
    assert!(probe.is_reconnecting());

    // The first backoff sleep ends at 3.1s.
    pool.set_healthy(true);
    advance(Duration::from_millis(100)).await;

    assert_eq!(
        log.kinds(),
        vec![
            ProbeEventKind::Healthy,
            ProbeEventKind::Unhealthy,
            ProbeEventKind::ReconnectStarted,
            ProbeEventKind::ReconnectSuccess,
            ProbeEventKind::Healthy,
        ]
    );
    assert!(!probe.is_reconnecting());
    assert_eq!(probe.health_status().reconnect_attempt, 0);

    probe.stop().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_brief_blip_is_absorbed() -> anyhow::Result<()> {
    initialize_logging();
    let pool = MockPool::new();
    let probe = HealthProbe::new(fast_config(), pool.clone())?;
    let log = EventLog::default();
    probe.add_event_handler(log.handler());

    probe.start().await?;
    advance(Duration::from_millis(10)).await;

    pool.set_healthy(false);
    advance(Duration::from_millis(2_000)).await;
    pool.set_healthy(true);
    advance(Duration::from_millis(3_000)).await;
    probe.stop().await?;

    assert_eq!(log.kinds(), vec![ProbeEventKind::Healthy]);
    let metrics = probe.metrics();
    assert_eq!(metrics.total_failures, 2);
    assert_eq!(metrics.total_probes, metrics.total_successes + metrics.total_failures);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_backoff_exits_within_timeout() -> anyhow::Result<()> {
    initialize_logging();
    let config = fast_config()
        .with_failure_threshold(1)
        .with_reconnect_policy(ReconnectPolicy::new(5, 30_000, 60_000));
    let probe = HealthProbe::new(config, MockPool::new().with_failure())?;

    probe.start().await?;
    advance(Duration::from_millis(50)).await;
    assert!(probe.is_reconnecting());

    let started = tokio::time::Instant::now();
    probe.stop().await?;
    assert!(started.elapsed() <= probe.config().timeout());
    assert!(!probe.is_running());
    assert!(!probe.is_reconnecting());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_panicking_handler_is_isolated() -> anyhow::Result<()> {
    initialize_logging();
    let probe = HealthProbe::new(fast_config(), MockPool::new().with_failure())?;
    let calls = Arc::new(AtomicUsize::new(0));

    let counted = calls.clone();
    probe.add_event_handler(move |_: &ProbeEvent| {
        counted.fetch_add(1, Ordering::SeqCst);
    });
    probe.add_event_handler(panicking_handler);
    let log = EventLog::default();
    probe.add_event_handler(log.handler());

    probe.start().await?;
    advance(Duration::from_millis(900)).await;

    assert!(probe.is_running());
    assert_eq!(calls.load(Ordering::SeqCst), 6);
    assert_eq!(log.kinds().len(), 6);
    probe.stop().await?;
    Ok(())
}

fn panicking_handler(event: &ProbeEvent) {
    panic!("handler failed on {:?}", event.kind);
}

#[tokio::test(start_paused = true)]
async fn test_deep_checks_and_pool_health() -> anyhow::Result<()> {
    initialize_logging();
    let pool = MockPool::new()
        .with_driver("postgresql")
        .with_latency(Duration::from_millis(150))
        .with_stats(PoolStats::new(8, 0, 8, 0));
    let probe = HealthProbe::new(fast_config().with_check_mode(CheckMode::Deep), pool.clone())?;

    probe.start().await?;
    advance(Duration::from_millis(200)).await;
    probe.stop().await?;

    assert_eq!(probe.driver_name(), "postgresql");
    assert_eq!(pool.ping_count(), 1);
    assert_eq!(probe.health_status().current_health, HealthState::Healthy);
    assert_eq!(
        probe.latency_class(),
        Some(lifeline_probe::LatencyClass::Elevated)
    );

    let report = probe.pool_health().expect("pool reports stats");
    assert_eq!(report.pressure, PoolPressure::Saturated);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_config_from_toml() -> anyhow::Result<()> {
    initialize_logging();
    let config = ProbeConfig::from_toml_str(
        r#"
        interval_ms = 2000
        timeout_ms = 500
        failure_threshold = 1
        enable_auto_reconnect = false
        "#,
    )?;
    config.validate()?;

    let probe = HealthProbe::new(config, MockPool::new().with_failure())?;
    let log = EventLog::default();
    probe.add_event_handler(log.handler());

    probe.start().await?;
    advance(Duration::from_millis(4_500)).await;
    probe.stop().await?;

    assert_eq!(log.kinds(), vec![ProbeEventKind::Unhealthy]);
    assert_eq!(probe.metrics().total_probes, 3);
    Ok(())
}
