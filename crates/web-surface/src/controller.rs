//! Controller contract implemented by platform web views.

use crate::SurfaceResult;
use auth_bridge_types::NavigationEvent;
use tokio::sync::mpsc;
use url::Url;

/// Ordered stream of navigation events for one `load`.
pub type NavigationEvents = mpsc::UnboundedReceiver<NavigationEvent>;

/// Sending half handed to platform navigation callbacks.
///
/// Callbacks run on the host UI loop and must never block, so sends are
/// unbounded and simply report whether anyone is still listening.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<NavigationEvent>,
}

impl EventSink {
    /// Forward an event. Returns false once the flow stopped listening.
    pub fn emit(&self, event: NavigationEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create a connected sink/stream pair.
pub fn event_channel() -> (EventSink, NavigationEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, rx)
}

/// One embedded web-rendering instance.
///
/// A controller navigates once. Loading again requires a new instance from
/// the [`SurfaceFactory`].
pub trait WebSurfaceController: Send {
    /// Begin navigation to `url` and return the event stream.
    ///
    /// Network and rendering failures are reported as
    /// [`NavigationEvent::LoadFailed`] on the stream, never as an `Err` here.
    /// `Err` only signals misuse of the controller itself.
    fn load(&mut self, url: &Url) -> SurfaceResult<NavigationEvents>;

    /// Delete every cookie the surface holds, logging out of any previous
    /// session. Called before `load`.
    fn clear_cookies(&mut self) -> SurfaceResult<()>;

    /// Abort in-flight navigation. No further events are emitted.
    fn cancel(&mut self) -> SurfaceResult<()>;

    /// Release the rendering resource. Any later call fails with
    /// [`crate::SurfaceError::AlreadyDisposed`].
    fn dispose(&mut self) -> SurfaceResult<()>;
}

/// Creates a fresh controller for every flow.
pub trait SurfaceFactory: Send + Sync {
    fn create(&self) -> Box<dyn WebSurfaceController>;
}
