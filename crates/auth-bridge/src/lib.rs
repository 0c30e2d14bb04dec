//! Entry point exposed to the host scripting layer.
//!
//! The host calls [`AuthBridge::start_auth`] (or the JSON variant), gets back
//! an [`AuthHandle`] it can cancel with and a [`BridgePending`] it awaits, and
//! receives either an `AuthResult` or a `{kind, detail}` error payload.

mod bridge;
mod response;

pub use bridge::{AuthBridge, AuthHandle, BridgeDefaults, BridgePending};
pub use response::BridgeResponse;
