//! Session artifact extraction.
//!
//! Pure functions that look at one [`NavigationEvent`] at a time and decide
//! whether the flow has reached a success or failure page, and if so pull the
//! session artifact out of the page's cookies and headers. Nothing here
//! touches the web surface or the clock.
//!
//! [`NavigationEvent`]: auth_bridge_types::NavigationEvent

mod cookie_header;
mod extract;
mod patterns;

pub use cookie_header::parse_cookie_header;
pub use extract::{is_failure, try_extract};
pub use patterns::{matches_any, matches_pattern};
