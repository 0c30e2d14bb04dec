//! The cancellable authentication flow engine.
//!
//! [`AuthFlowEngine::start`] validates the configuration, claims the engine's
//! surface slot, and spawns one task per flow. The task owns the web surface
//! for its whole life: it loads the entry URL, feeds events to the
//! [`FlowStateMachine`] in order, races them against the deadline and
//! cancellation, and disposes the surface once the flow is over.
//!
//! The machine and the result sender share one lock, so whichever of event,
//! timer or cancel reaches a terminal state first is the only one delivered.

use crate::error::{AuthError, FlowResult};
use crate::flow_fsm::FlowState;
use crate::machine::{FlowOutcome, FlowStateMachine};
use auth_bridge_types::{AuthConfig, AuthResult, NavigationEvent};
use expiry_parser::ExpiryParser;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;
use web_surface::{NavigationEvents, SurfaceFactory, WebSurfaceController};

/// Runs authentication flows, one at a time.
///
/// An engine corresponds to one web surface slot in the host. Flows run on
/// the current Tokio runtime; started outside one, a flow fails with
/// [`AuthError::LoadFailed`].
pub struct AuthFlowEngine {
    surfaces: Arc<dyn SurfaceFactory>,
    parser: Arc<dyn ExpiryParser>,
    busy: Arc<AtomicBool>,
}

impl AuthFlowEngine {
    pub fn new(surfaces: Arc<dyn SurfaceFactory>, parser: Arc<dyn ExpiryParser>) -> Self {
        Self {
            surfaces,
            parser,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true while a flow is in `Loading` or `AwaitingTerminal`.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start a flow. Returns immediately.
    ///
    /// Fails synchronously only with [`AuthError::InvalidConfig`] or
    /// [`AuthError::Busy`]; every other outcome arrives through
    /// [`PendingAuth::wait`].
    pub fn start(&self, config: AuthConfig) -> FlowResult<PendingAuth> {
        config.validate()?;
        let entry_url = config.entry_url()?;
        let lease = BusyLease::acquire(&self.busy).ok_or(AuthError::Busy)?;

        let flow_id = Uuid::new_v4();
        let deadline = Instant::now() + config.timeout();
        let mut machine =
            FlowStateMachine::new(flow_id.to_string(), Arc::new(config), self.parser.clone());
        if let Err(e) = machine.start() {
            return Err(AuthError::load_failed(e.to_string()));
        }

        let (tx, rx) = oneshot::channel();
        let shared = Arc::new(FlowShared {
            flow_id,
            core: Mutex::new(FlowCore {
                machine,
                resolver: Some(tx),
                lease: Some(lease),
                outcome: None,
            }),
            stop: Notify::new(),
        });

        info!(flow_id = %flow_id, entry_url = %entry_url, "Auth flow started");

        let mut surface = self.surfaces.create();
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(run_flow(shared.clone(), surface, entry_url, deadline));
            }
            Err(e) => {
                warn!(flow_id = %flow_id, error = %e, "No async runtime for auth flow");
                shared.finish_with(|machine| {
                    machine.fail(AuthError::load_failed(format!("no async runtime: {e}")))
                });
                release_surface(flow_id, surface.as_mut(), false);
            }
        }

        Ok(PendingAuth {
            handle: FlowHandle { shared },
            rx,
        })
    }
}

/// Cancellation and status handle for one flow. Cheap to clone.
#[derive(Clone)]
pub struct FlowHandle {
    shared: Arc<FlowShared>,
}

impl FlowHandle {
    pub fn flow_id(&self) -> Uuid {
        self.shared.flow_id
    }

    pub fn state(&self) -> FlowState {
        self.shared.core.lock().machine.state()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Cancel the flow.
    ///
    /// Idempotent, and a no-op once the flow has ended. The pending
    /// operation observes [`AuthError::Cancelled`] before this returns; the
    /// surface is disposed shortly after by the flow task.
    pub fn cancel(&self) {
        if self.shared.finish_with(|machine| machine.cancel().map(Err)) {
            debug!(flow_id = %self.shared.flow_id, "Auth flow cancelled by caller");
        }
    }
}

impl std::fmt::Debug for FlowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowHandle")
            .field("flow_id", &self.shared.flow_id)
            .field("state", &self.state())
            .finish()
    }
}

/// The pending result of a started flow.
pub struct PendingAuth {
    handle: FlowHandle,
    rx: oneshot::Receiver<FlowOutcome>,
}

impl PendingAuth {
    pub fn handle(&self) -> FlowHandle {
        self.handle.clone()
    }

    /// Wait for the flow's single outcome.
    pub async fn wait(self) -> FlowResult<AuthResult> {
        match self.rx.await {
            Ok(outcome) => outcome,
            // The sender is only dropped without sending if the flow task
            // died; report it the same way as an abort.
            Err(_) => Err(AuthError::Cancelled),
        }
    }
}

/// Holds the engine's busy flag for the duration of one flow.
struct BusyLease {
    flag: Arc<AtomicBool>,
}

impl BusyLease {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for BusyLease {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

struct FlowCore {
    machine: FlowStateMachine,
    resolver: Option<oneshot::Sender<FlowOutcome>>,
    lease: Option<BusyLease>,
    /// Kind of the delivered outcome, kept for the flow task's cleanup.
    outcome: Option<Result<(), AuthError>>,
}

struct FlowShared {
    flow_id: Uuid,
    core: Mutex<FlowCore>,
    stop: Notify,
}

impl FlowShared {
    /// Apply `step` to the machine and deliver its outcome, if any.
    ///
    /// Returns true if this call ended the flow.
    fn finish_with<F>(&self, step: F) -> bool
    where
        F: FnOnce(&mut FlowStateMachine) -> Option<FlowOutcome>,
    {
        let mut core = self.core.lock();
        let Some(outcome) = step(&mut core.machine) else {
            return false;
        };

        core.outcome = Some(outcome.as_ref().map(|_| ()).map_err(Clone::clone));
        // Free the slot before the caller can observe the result.
        drop(core.lease.take());
        if let Some(resolver) = core.resolver.take() {
            if resolver.send(outcome).is_err() {
                debug!(flow_id = %self.flow_id, "Caller dropped pending auth before resolution");
            }
        }
        drop(core);

        self.stop.notify_one();
        true
    }

    fn is_terminal(&self) -> bool {
        self.core.lock().machine.is_terminal()
    }

    fn was_interrupted(&self) -> bool {
        matches!(
            self.core.lock().outcome,
            Some(Err(AuthError::Cancelled | AuthError::TimedOut))
        )
    }
}

async fn run_flow(
    shared: Arc<FlowShared>,
    mut surface: Box<dyn WebSurfaceController>,
    entry_url: Url,
    deadline: Instant,
) {
    let flow_id = shared.flow_id;

    // Cancelled before the task first ran: never touch the network.
    let mut events = if shared.is_terminal() {
        None
    } else {
        // Log out of whatever session the surface still holds.
        if let Err(e) = surface.clear_cookies() {
            warn!(flow_id = %flow_id, error = %e, "Failed to clear web surface cookies");
        }
        match surface.load(&entry_url) {
            Ok(events) => Some(events),
            Err(e) => {
                shared.finish_with(|machine| machine.fail(AuthError::load_failed(e.to_string())));
                None
            }
        }
    };

    let timer = tokio::time::sleep_until(deadline);
    tokio::pin!(timer);

    while !shared.is_terminal() {
        tokio::select! {
            biased;

            _ = shared.stop.notified() => {}

            _ = &mut timer => {
                if shared.finish_with(|machine| machine.expire().map(Err)) {
                    info!(flow_id = %flow_id, "Auth flow timed out");
                }
            }

            next = next_event(&mut events) => match next {
                Some(event) => {
                    debug!(flow_id = %flow_id, event = event.kind_name(), url = event.url(), "Navigation event");
                    shared.finish_with(|machine| machine.on_event(&event));
                }
                None => {
                    debug!(flow_id = %flow_id, "Navigation event stream closed");
                    events = None;
                }
            },
        }
    }

    // Anything still queued is discarded with the stream.
    drop(events);

    release_surface(flow_id, surface.as_mut(), shared.was_interrupted());
}

/// Stop and dispose a flow's surface. Failures are logged, never delivered.
fn release_surface(flow_id: Uuid, surface: &mut dyn WebSurfaceController, interrupted: bool) {
    if interrupted {
        if let Err(e) = surface.cancel() {
            warn!(flow_id = %flow_id, error = %e, "Failed to cancel web surface");
        }
    }
    match surface.dispose() {
        Ok(()) => debug!(flow_id = %flow_id, "Web surface disposed"),
        Err(e) => warn!(flow_id = %flow_id, error = %e, "Failed to dispose web surface"),
    }
}

/// Next event, or pending forever once the stream is gone.
async fn next_event(events: &mut Option<NavigationEvents>) -> Option<NavigationEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
