//! Scripted web surface.
//!
//! [`ScriptedSurface`] replays a recorded sequence of navigation events with
//! their original delays. It backs the replay CLI and the flow tests, and is
//! the reference for how a platform controller should behave: one load per
//! instance, events stop on cancel, and dispose is terminal.

use crate::{event_channel, CookieJar, EventSink, NavigationEvents, SurfaceError, SurfaceFactory};
use crate::{SurfaceResult, WebSurfaceController};
use auth_bridge_types::NavigationEvent;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

/// One recorded navigation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStep {
    /// Wait before emitting, relative to the previous step.
    #[serde(default)]
    pub delay_ms: u64,
    pub event: NavigationEvent,
    /// Set-Cookie values the page sets before the event is observed.
    #[serde(default)]
    pub set_cookies: Vec<String>,
}

impl ScriptStep {
    pub fn new(event: NavigationEvent) -> Self {
        Self {
            delay_ms: 0,
            event,
            set_cookies: Vec::new(),
        }
    }

    pub fn after_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_set_cookie(mut self, set_cookie: impl Into<String>) -> Self {
        self.set_cookies.push(set_cookie.into());
        self
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    loads: Vec<String>,
    cookie_clears: usize,
    cancel_calls: usize,
    dispose_calls: usize,
    disposed: bool,
    events_emitted: usize,
}

/// Read-only view of what happened to a [`ScriptedSurface`].
#[derive(Debug, Clone, Default)]
pub struct SurfaceProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl SurfaceProbe {
    /// URLs passed to `load`, in call order.
    pub fn loads(&self) -> Vec<String> {
        self.state.lock().loads.clone()
    }

    pub fn cookie_clears(&self) -> usize {
        self.state.lock().cookie_clears
    }

    pub fn cancel_calls(&self) -> usize {
        self.state.lock().cancel_calls
    }

    pub fn dispose_calls(&self) -> usize {
        self.state.lock().dispose_calls
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    pub fn events_emitted(&self) -> usize {
        self.state.lock().events_emitted
    }
}

/// A controller that replays a script.
pub struct ScriptedSurface {
    script: Arc<Vec<ScriptStep>>,
    jar: Arc<Mutex<CookieJar>>,
    probe: SurfaceProbe,
    load_error: Option<SurfaceError>,
    task: Option<JoinHandle<()>>,
    loaded: bool,
    disposed: bool,
}

impl ScriptedSurface {
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self::with_shared_script(Arc::new(script))
    }

    fn with_shared_script(script: Arc<Vec<ScriptStep>>) -> Self {
        Self {
            script,
            jar: Arc::new(Mutex::new(CookieJar::new())),
            probe: SurfaceProbe::default(),
            load_error: None,
            task: None,
            loaded: false,
            disposed: false,
        }
    }

    /// Make `load` fail with `error` instead of replaying.
    pub fn failing_with(mut self, error: SurfaceError) -> Self {
        self.load_error = Some(error);
        self
    }

    pub fn probe(&self) -> SurfaceProbe {
        self.probe.clone()
    }

    fn abort_replay(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl WebSurfaceController for ScriptedSurface {
    fn load(&mut self, url: &Url) -> SurfaceResult<NavigationEvents> {
        if self.disposed {
            return Err(SurfaceError::AlreadyDisposed);
        }
        if self.loaded {
            return Err(SurfaceError::AlreadyLoaded);
        }
        self.loaded = true;
        self.probe.state.lock().loads.push(url.to_string());

        if let Some(error) = self.load_error.clone() {
            return Err(error);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SurfaceError::Platform(format!("no async runtime: {e}")))?;

        let (sink, events) = event_channel();
        let replay = replay(
            self.script.clone(),
            self.jar.clone(),
            self.probe.clone(),
            sink,
        );
        self.task = Some(runtime.spawn(replay));

        debug!(url = %url, steps = self.script.len(), "Scripted surface loading");
        Ok(events)
    }

    fn clear_cookies(&mut self) -> SurfaceResult<()> {
        if self.disposed {
            return Err(SurfaceError::AlreadyDisposed);
        }
        self.jar.lock().clear();
        self.probe.state.lock().cookie_clears += 1;
        Ok(())
    }

    fn cancel(&mut self) -> SurfaceResult<()> {
        if self.disposed {
            return Err(SurfaceError::AlreadyDisposed);
        }
        self.probe.state.lock().cancel_calls += 1;
        self.abort_replay();
        Ok(())
    }

    fn dispose(&mut self) -> SurfaceResult<()> {
        if self.disposed {
            return Err(SurfaceError::AlreadyDisposed);
        }
        self.disposed = true;
        self.abort_replay();
        self.jar.lock().clear();

        let mut state = self.probe.state.lock();
        state.dispose_calls += 1;
        state.disposed = true;
        Ok(())
    }
}

impl Drop for ScriptedSurface {
    fn drop(&mut self) {
        self.abort_replay();
    }
}

async fn replay(
    script: Arc<Vec<ScriptStep>>,
    jar: Arc<Mutex<CookieJar>>,
    probe: SurfaceProbe,
    sink: EventSink,
) {
    for step in script.iter() {
        if step.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;
        }

        let event = apply_step(step, &jar);
        if !sink.emit(event) {
            debug!("Event stream closed, stopping replay");
            return;
        }
        probe.state.lock().events_emitted += 1;
    }
}

/// Apply the step's cookies to the jar and return the event as observed.
///
/// Loaded events carry every jar cookie visible to their URL; cookies written
/// into the script explicitly win over jar values of the same name.
fn apply_step(step: &ScriptStep, jar: &Mutex<CookieJar>) -> NavigationEvent {
    let parsed_url = Url::parse(step.event.url()).ok();
    let mut jar = jar.lock();

    if !step.set_cookies.is_empty() {
        match &parsed_url {
            Some(url) => {
                for set_cookie in &step.set_cookies {
                    if let Err(e) = jar.set(url, set_cookie) {
                        warn!(url = %url, error = %e, "Ignoring cookie");
                    }
                }
            }
            None => warn!(url = step.event.url(), "Cannot set cookies for unparseable URL"),
        }
    }

    match (&step.event, &parsed_url) {
        (
            NavigationEvent::Loaded {
                url,
                cookies,
                headers,
            },
            Some(parsed),
        ) => {
            let mut visible = jar.get(parsed);
            visible.extend(cookies.iter().map(|(k, v)| (k.clone(), v.clone())));
            NavigationEvent::Loaded {
                url: url.clone(),
                cookies: visible,
                headers: headers.clone(),
            }
        }
        (event, _) => event.clone(),
    }
}

/// Hands out a fresh [`ScriptedSurface`] per flow, all replaying the same
/// script, and keeps a probe for each.
pub struct ScriptedSurfaceFactory {
    script: Arc<Vec<ScriptStep>>,
    load_error: Option<SurfaceError>,
    probes: Mutex<Vec<SurfaceProbe>>,
}

impl ScriptedSurfaceFactory {
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            script: Arc::new(script),
            load_error: None,
            probes: Mutex::new(Vec::new()),
        }
    }

    /// Every created surface fails `load` with `error`.
    pub fn failing_with(mut self, error: SurfaceError) -> Self {
        self.load_error = Some(error);
        self
    }

    pub fn created_count(&self) -> usize {
        self.probes.lock().len()
    }

    pub fn last_probe(&self) -> Option<SurfaceProbe> {
        self.probes.lock().last().cloned()
    }

    pub fn probes(&self) -> Vec<SurfaceProbe> {
        self.probes.lock().clone()
    }
}

impl SurfaceFactory for ScriptedSurfaceFactory {
    fn create(&self) -> Box<dyn WebSurfaceController> {
        let mut surface = ScriptedSurface::with_shared_script(self.script.clone());
        if let Some(error) = self.load_error.clone() {
            surface = surface.failing_with(error);
        }
        self.probes.lock().push(surface.probe());
        Box::new(surface)
    }
}
