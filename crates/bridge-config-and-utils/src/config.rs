//! Process-level configuration.
//!
//! Per-flow settings live in `AuthConfig`; this file only holds defaults the
//! bridge applies to every flow plus the log level.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Timeout applied to flows whose config omits `timeoutMs`.
pub const DEFAULT_TIMEOUT_MS: i64 = 120_000;

/// Environment variable overriding `log_level`.
pub const LOG_LEVEL_ENV: &str = "WEBAUTH_BRIDGE_LOG_LEVEL";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_timeout_ms() -> i64 {
    DEFAULT_TIMEOUT_MS
}

fn default_expiry_required() -> bool {
    true
}

/// Bridge process configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Timeout for flows whose config leaves it out.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: i64,
    /// `expiryRequired` for flows whose config leaves it out.
    #[serde(default = "default_expiry_required")]
    pub expiry_required_default: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            expiry_required_default: true,
        }
    }
}

impl Config {
    /// Load configuration from `paths`, falling back to defaults when the
    /// file does not exist. The environment may override the log level.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.default_timeout_ms <= 0 {
            return Err(CoreError::Config(format!(
                "default_timeout_ms must be greater than zero (got {})",
                self.default_timeout_ms
            )));
        }
        Ok(())
    }

    /// Only the log level can be overridden at runtime.
    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(log_level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.log_level = log_level.trim().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.default_timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.expiry_required_default);
    }

    #[test]
    fn test_config_load_from_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "log_level": "debug" }"#).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.default_timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_config_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config {
            log_level: "trace".to_string(),
            default_timeout_ms: 45_000,
            expiry_required_default: false,
        };
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.default_timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_config_rejects_non_positive_timeout() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        std::fs::write(paths.config_file(), r#"{ "default_timeout_ms": 0 }"#).unwrap();

        assert!(matches!(Config::load(&paths), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_config_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();

        assert!(matches!(
            Config::load_from_file(&path),
            Err(CoreError::Json(_))
        ));
    }

    #[test]
    fn test_env_override_log_level() {
        let mut config = Config::default();
        config.apply_env_overrides(|name| {
            (name == LOG_LEVEL_ENV).then(|| " debug ".to_string())
        });
        assert_eq!(config.log_level, "debug");

        config.apply_env_overrides(|_| Some("   ".to_string()));
        assert_eq!(config.log_level, "debug");
    }
}
