//! Embedded web surface abstraction.
//!
//! This crate provides:
//! - The [`WebSurfaceController`] contract a platform web view implements
//! - [`SurfaceFactory`] for handing each flow a fresh controller
//! - A per-surface [`CookieJar`] with Set-Cookie handling
//! - [`ScriptedSurface`], a controller that replays a recorded navigation

mod controller;
mod cookies;
mod error;
mod scripted;

pub use controller::{
    event_channel, EventSink, NavigationEvents, SurfaceFactory, WebSurfaceController,
};
pub use cookies::{CookieJar, StoredCookie};
pub use error::{SurfaceError, SurfaceResult};
pub use scripted::{ScriptStep, ScriptedSurface, ScriptedSurfaceFactory, SurfaceProbe};
