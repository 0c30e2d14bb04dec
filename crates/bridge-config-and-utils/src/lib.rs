//! Configuration, paths, and logging setup for auth bridge processes.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_LOG_LEVEL, DEFAULT_TIMEOUT_MS, LOG_LEVEL_ENV};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_for_service, LOG_STDERR_ENV};
pub use paths::Paths;
