mod common;

use auth_bridge_types::{ConfigError, NavigationEvent};
use chrono::{TimeZone, Utc};
use common::{config, engine, loaded, step, wait_for_dispose, DONE, ENTRY, ERROR_PAGE, IDP};
use expiry_parser::StandardExpiryParser;
use flow_engine::{AuthError, AuthFlowEngine, FlowState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use web_surface::{
    event_channel, EventSink, NavigationEvents, SurfaceError, SurfaceFactory, SurfaceResult,
    WebSurfaceController,
};

/// A success page without the expiry field fails when expiry is required.
#[tokio::test]
async fn missing_expiry_fails_when_required() {
    let (engine, factory) = engine(vec![step(loaded(DONE, &[("session", "abc123")]))]);

    let result = engine.start(config(5_000)).unwrap().wait().await;
    assert!(matches!(result, Err(AuthError::MissingArtifact(_))));

    let probe = factory.last_probe().unwrap();
    assert!(wait_for_dispose(&probe).await);
}

/// The same page resolves without an expiry when expiry is optional.
#[tokio::test]
async fn missing_expiry_resolves_when_optional() {
    let (engine, _factory) = engine(vec![step(loaded(DONE, &[("session", "abc123")]))]);

    let result = engine
        .start(config(5_000).with_expiry_required(false))
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(result.artifact_value, "abc123");
    assert!(result.expires_at.is_none());
}

/// Started, redirected, then the success page with artifact and expiry.
#[tokio::test]
async fn full_flow_resolves_with_normalized_expiry() {
    let (engine, factory) = engine(vec![
        step(NavigationEvent::started(ENTRY)),
        step(NavigationEvent::redirected(IDP)),
        step(loaded(
            DONE,
            &[("session", "abc"), ("exp", "2025-01-01T00:00:00Z")],
        )),
    ]);

    let pending = engine.start(config(5_000)).unwrap();
    let handle = pending.handle();
    let result = pending.wait().await.unwrap();

    assert_eq!(result.artifact_value, "abc");
    assert_eq!(
        result.expires_at,
        Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(result.expires_at_iso().as_deref(), Some("2025-01-01T00:00:00Z"));
    assert_eq!(result.source_url, DONE);
    assert_eq!(handle.state(), FlowState::Resolved);

    let probe = factory.last_probe().unwrap();
    assert!(wait_for_dispose(&probe).await);
    assert_eq!(probe.loads(), vec![ENTRY.to_string()]);
    assert_eq!(probe.cookie_clears(), 1);
    assert_eq!(probe.dispose_calls(), 1);
    assert_eq!(probe.cancel_calls(), 0);
}

/// A load failure anywhere in the flow is terminal.
#[tokio::test]
async fn load_failure_is_terminal_and_disposes() {
    let (engine, factory) = engine(vec![
        step(NavigationEvent::started(ENTRY)),
        step(NavigationEvent::load_failed(IDP, "network-timeout")),
        step(loaded(DONE, &[("session", "abc"), ("exp", "1735689600")])),
    ]);

    let result = engine.start(config(5_000)).unwrap().wait().await;
    assert_eq!(result, Err(AuthError::load_failed("network-timeout")));

    let probe = factory.last_probe().unwrap();
    assert!(wait_for_dispose(&probe).await);
}

/// A second start while the first is in flight is rejected synchronously and
/// does not disturb the first flow.
#[tokio::test(start_paused = true)]
async fn second_start_is_busy() {
    let (engine, factory) = engine(vec![
        step(NavigationEvent::started(ENTRY)),
        step(loaded(DONE, &[("session", "abc"), ("exp", "1735689600")])).after_ms(1_000),
    ]);

    let first = engine.start(config(60_000)).unwrap();
    assert!(engine.is_busy());

    let second = engine.start(config(60_000));
    assert!(matches!(second, Err(AuthError::Busy)));
    assert_eq!(factory.created_count(), 1);

    let result = first.wait().await.unwrap();
    assert_eq!(result.artifact_value, "abc");

    // The slot is free as soon as the result is observable.
    assert!(!engine.is_busy());
    let third = engine.start(config(60_000)).unwrap();
    assert!(third.wait().await.is_ok());
    assert_eq!(factory.created_count(), 2);
}

/// No terminal page before the deadline resolves `TimedOut`.
#[tokio::test(start_paused = true)]
async fn timeout_resolves_timed_out_and_disposes() {
    let (engine, factory) = engine(vec![
        step(NavigationEvent::started(ENTRY)),
        step(loaded(DONE, &[("session", "abc"), ("exp", "1735689600")])).after_ms(10_000),
    ]);

    let started = tokio::time::Instant::now();
    let pending = engine.start(config(500)).unwrap();
    let handle = pending.handle();
    let result = pending.wait().await;

    assert_eq!(result, Err(AuthError::TimedOut));
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert!(started.elapsed() < Duration::from_millis(10_000));
    assert_eq!(handle.state(), FlowState::Cancelled);

    let probe = factory.last_probe().unwrap();
    assert!(wait_for_dispose(&probe).await);
    assert_eq!(probe.cancel_calls(), 1);
    assert_eq!(probe.events_emitted(), 1);
}

/// A surface that stops emitting leaves the flow waiting for the timeout.
#[tokio::test(start_paused = true)]
async fn closed_event_stream_waits_for_timeout() {
    let (engine, _factory) = engine(vec![step(NavigationEvent::started(ENTRY))]);

    let result = engine.start(config(2_000)).unwrap().wait().await;
    assert_eq!(result, Err(AuthError::TimedOut));
}

/// Cancel delivers `Cancelled` once, however often it is called.
#[tokio::test(start_paused = true)]
async fn cancel_is_idempotent() {
    let (engine, factory) = engine(vec![
        step(NavigationEvent::started(ENTRY)),
        step(loaded(DONE, &[("session", "abc"), ("exp", "1735689600")])).after_ms(1_000),
    ]);

    let pending = engine.start(config(60_000)).unwrap();
    let handle = pending.handle();

    handle.cancel();
    handle.cancel();
    assert_eq!(handle.state(), FlowState::Cancelled);
    assert!(handle.is_finished());
    assert!(!engine.is_busy());

    assert_eq!(pending.wait().await, Err(AuthError::Cancelled));
    handle.cancel();

    let probe = factory.last_probe().unwrap();
    assert!(wait_for_dispose(&probe).await);
    assert_eq!(probe.dispose_calls(), 1);
}

/// Cancelling after resolution changes nothing.
#[tokio::test]
async fn cancel_after_resolution_is_noop() {
    let (engine, _factory) = engine(vec![step(loaded(
        DONE,
        &[("session", "abc"), ("exp", "1735689600")],
    ))]);

    let pending = engine.start(config(5_000)).unwrap();
    let handle = pending.handle();
    let result = pending.wait().await;
    handle.cancel();

    assert!(result.is_ok());
    assert_eq!(handle.state(), FlowState::Resolved);
}

/// Events after the terminal one are ignored.
#[tokio::test]
async fn late_events_do_not_change_the_outcome() {
    let (engine, factory) = engine(vec![
        step(loaded(DONE, &[("session", "first"), ("exp", "1735689600")])),
        step(NavigationEvent::load_failed(DONE, "connection-reset")),
        step(loaded(DONE, &[("session", "second"), ("exp", "1735689600")])),
    ]);

    let result = engine.start(config(5_000)).unwrap().wait().await.unwrap();
    assert_eq!(result.artifact_value, "first");

    let probe = factory.last_probe().unwrap();
    assert!(wait_for_dispose(&probe).await);
}

/// A URL matching both a success and a failure pattern fails.
#[tokio::test]
async fn failure_pattern_wins_over_success_pattern() {
    let (engine, _factory) = engine(vec![step(loaded(
        DONE,
        &[("session", "abc"), ("exp", "1735689600")],
    ))]);

    let result = engine
        .start(config(5_000).with_failure_pattern(DONE))
        .unwrap()
        .wait()
        .await;
    assert!(matches!(result, Err(AuthError::LoadFailed { .. })));
}

/// Redirecting to a failure page ends the flow before it loads.
#[tokio::test]
async fn redirect_to_failure_page_fails() {
    let (engine, _factory) = engine(vec![
        step(NavigationEvent::started(ENTRY)),
        step(NavigationEvent::redirected(format!("{ERROR_PAGE}?code=denied"))),
    ]);

    let result = engine.start(config(5_000)).unwrap().wait().await;
    match result {
        Err(AuthError::LoadFailed { reason }) => assert!(reason.contains(ERROR_PAGE)),
        other => panic!("unexpected result {other:?}"),
    }
}

/// An unparseable expiry fails with the raw value.
#[tokio::test]
async fn unparseable_expiry_reports_raw_value() {
    let (engine, _factory) = engine(vec![step(loaded(
        DONE,
        &[("session", "abc"), ("exp", "next tuesday")],
    ))]);

    let result = engine.start(config(5_000)).unwrap().wait().await;
    assert_eq!(result, Err(AuthError::UnparseableExpiry("next tuesday".into())));
}

/// A controller that refuses to load is reported through the pending result.
#[tokio::test]
async fn surface_load_error_is_delivered_asynchronously() {
    let factory = std::sync::Arc::new(
        web_surface::ScriptedSurfaceFactory::new(Vec::new())
            .failing_with(SurfaceError::Platform("renderer unavailable".into())),
    );
    let engine = flow_engine::AuthFlowEngine::new(
        factory.clone(),
        std::sync::Arc::new(expiry_parser::StandardExpiryParser),
    );

    let pending = engine.start(config(5_000)).unwrap();
    let result = pending.wait().await;
    assert!(matches!(result, Err(AuthError::LoadFailed { .. })));

    let probe = factory.last_probe().unwrap();
    assert!(wait_for_dispose(&probe).await);
}

/// Invalid configs never reach the surface.
#[tokio::test]
async fn invalid_config_is_rejected_synchronously() {
    let (engine, factory) = engine(Vec::new());

    let result = engine.start(config(0));
    assert!(matches!(
        result,
        Err(AuthError::InvalidConfig(ConfigError::NonPositiveTimeout(0)))
    ));

    let mut bad_url = config(5_000);
    bad_url.entry_url = "not a url".into();
    assert!(matches!(
        engine.start(bad_url),
        Err(AuthError::InvalidConfig(ConfigError::InvalidEntryUrl(_)))
    ));

    assert_eq!(factory.created_count(), 0);
    assert!(!engine.is_busy());
}

/// Whatever the race between events, timer and cancel, exactly one outcome
/// is delivered.
#[tokio::test(start_paused = true)]
async fn exactly_one_outcome_under_races() {
    for cancel_after in [0u64, 99, 100, 101, 200] {
        let (engine, _factory) = engine(vec![
            step(NavigationEvent::started(ENTRY)),
            step(loaded(DONE, &[("session", "abc"), ("exp", "1735689600")])).after_ms(100),
        ]);

        let pending = engine.start(config(100)).unwrap();
        let handle = pending.handle();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(cancel_after)).await;
            handle.cancel();
            handle.state()
        });

        let result = pending.wait().await;
        let final_state = canceller.await.unwrap();
        assert!(final_state.is_terminal());
        match result {
            Ok(r) => assert_eq!(r.artifact_value, "abc"),
            Err(AuthError::Cancelled) | Err(AuthError::TimedOut) => {}
            Err(other) => panic!("unexpected error {other:?} (cancel at {cancel_after}ms)"),
        }
    }
}

/// A `Max-Age` past the representable date range still yields the cookie.
#[tokio::test]
async fn huge_max_age_cookie_is_extracted() {
    let (engine, factory) = engine(vec![step(loaded(DONE, &[("exp", "1735689600")]))
        .with_set_cookie("session=abc; Path=/; Max-Age=9223372036854775807")]);

    let result = engine.start(config(60_000)).unwrap().wait().await.unwrap();
    assert_eq!(result.artifact_value, "abc");
    assert_eq!(
        result.expires_at,
        Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    );

    let probe = factory.last_probe().unwrap();
    assert!(wait_for_dispose(&probe).await);
}

/// Without a Tokio runtime the flow fails asynchronously and frees the slot.
#[test]
fn start_outside_runtime_fails_load() {
    let (engine, factory) = engine(vec![step(loaded(
        DONE,
        &[("session", "abc"), ("exp", "1735689600")],
    ))]);

    let pending = engine.start(config(5_000)).unwrap();
    let handle = pending.handle();
    assert!(!engine.is_busy());
    assert_eq!(handle.state(), FlowState::Failed);

    let probe = factory.last_probe().unwrap();
    assert!(probe.is_disposed());
    assert!(probe.loads().is_empty());

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let result = runtime.block_on(pending.wait());
    assert!(matches!(result, Err(AuthError::LoadFailed { .. })));
}

#[derive(Default)]
struct Calls {
    cancels: AtomicUsize,
    disposes: AtomicUsize,
}

/// Emits one success page, then fails every cancel and dispose.
struct StubbornSurface {
    calls: Arc<Calls>,
    hold_events: bool,
    _sink: Option<EventSink>,
}

impl WebSurfaceController for StubbornSurface {
    fn load(&mut self, _url: &Url) -> SurfaceResult<NavigationEvents> {
        let (sink, events) = event_channel();
        if self.hold_events {
            // Keep the stream open and silent until the flow is cancelled.
            self._sink = Some(sink);
        } else {
            sink.emit(loaded(DONE, &[("session", "abc"), ("exp", "1735689600")]));
        }
        Ok(events)
    }

    fn clear_cookies(&mut self) -> SurfaceResult<()> {
        Ok(())
    }

    fn cancel(&mut self) -> SurfaceResult<()> {
        self.calls.cancels.fetch_add(1, Ordering::SeqCst);
        Err(SurfaceError::Platform("cancel refused".into()))
    }

    fn dispose(&mut self) -> SurfaceResult<()> {
        self.calls.disposes.fetch_add(1, Ordering::SeqCst);
        Err(SurfaceError::AlreadyDisposed)
    }
}

struct StubbornFactory {
    calls: Arc<Calls>,
    hold_events: bool,
}

impl SurfaceFactory for StubbornFactory {
    fn create(&self) -> Box<dyn WebSurfaceController> {
        Box::new(StubbornSurface {
            calls: self.calls.clone(),
            hold_events: self.hold_events,
            _sink: None,
        })
    }
}

fn stubborn_engine(hold_events: bool) -> (AuthFlowEngine, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let factory = Arc::new(StubbornFactory {
        calls: calls.clone(),
        hold_events,
    });
    (
        AuthFlowEngine::new(factory, Arc::new(StandardExpiryParser)),
        calls,
    )
}

async fn wait_for_calls(counter: &AtomicUsize) -> bool {
    for _ in 0..100 {
        if counter.load(Ordering::SeqCst) > 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// A dispose error after resolution leaves the delivered result untouched.
#[tokio::test]
async fn dispose_error_does_not_change_resolution() {
    let (engine, calls) = stubborn_engine(false);

    let pending = engine.start(config(5_000)).unwrap();
    let handle = pending.handle();
    let result = pending.wait().await.unwrap();
    assert_eq!(result.artifact_value, "abc");

    assert!(wait_for_calls(&calls.disposes).await);
    assert_eq!(handle.state(), FlowState::Resolved);
    assert_eq!(calls.cancels.load(Ordering::SeqCst), 0);
    assert!(!engine.is_busy());
}

/// Cancel and dispose errors after a cancellation are only logged.
#[tokio::test]
async fn surface_errors_after_cancel_are_swallowed() {
    let (engine, calls) = stubborn_engine(true);

    let pending = engine.start(config(5_000)).unwrap();
    let handle = pending.handle();
    handle.cancel();
    assert_eq!(pending.wait().await, Err(AuthError::Cancelled));

    assert!(wait_for_calls(&calls.disposes).await);
    assert_eq!(handle.state(), FlowState::Cancelled);
    assert!(!engine.is_busy());
}
