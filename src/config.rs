//! Server settings.
//!
//! Read from the TOML file named by `TIMETABLE_CONFIG` when set, then
//! overridden field by field from the environment:
//!
//! ```toml
//! bind_address = "0.0.0.0:8080"
//! node_limit = 500000
//! solve_timeout_ms = 10000
//! log_filter = "debug"
//! ```

use crate::error::ConfigError;
use crate::solver::DEFAULT_NODE_LIMIT;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_PATH_VAR: &str = "TIMETABLE_CONFIG";
pub const BIND_VAR: &str = "TIMETABLE_BIND";
pub const NODE_LIMIT_VAR: &str = "TIMETABLE_NODE_LIMIT";
pub const TIMEOUT_VAR: &str = "TIMETABLE_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub bind_address: String,
    /// Node expansions allowed per run unless a request sets its own.
    pub node_limit: u64,
    /// Wall-clock budget per run before it is cancelled.
    pub solve_timeout_ms: u64,
    /// Default `env_logger` filter; `RUST_LOG` still takes precedence.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            node_limit: DEFAULT_NODE_LIMIT,
            solve_timeout_ms: 30_000,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(contents)?;
        settings.validate()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Settings for the running process: config file, then environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };
        base.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(address) = lookup(BIND_VAR) {
            self.bind_address = address;
        }
        if let Some(limit) = lookup(NODE_LIMIT_VAR) {
            self.node_limit = parse_number(NODE_LIMIT_VAR, &limit)?;
        }
        if let Some(timeout) = lookup(TIMEOUT_VAR) {
            self.solve_timeout_ms = parse_number(TIMEOUT_VAR, &timeout)?;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.node_limit == 0 {
            return Err(ConfigError::Invalid("node_limit must be at least 1".to_string()));
        }
        if self.solve_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "solve_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn solve_timeout(&self) -> Duration {
        Duration::from_millis(self.solve_timeout_ms)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key} must be a whole number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml_str("node_limit = 5000").unwrap();
        assert_eq!(settings.node_limit, 5000);
        assert_eq!(settings.bind_address, "127.0.0.1:8080");
        assert_eq!(settings.solve_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_unknown_keys_and_zero_limits() {
        assert!(matches!(
            Settings::from_toml_str("nodes = 5"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            Settings::from_toml_str("node_limit = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let vars = HashMap::from([
            (BIND_VAR, "0.0.0.0:9000"),
            (NODE_LIMIT_VAR, " 1000 "),
        ]);
        let settings = Settings::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(settings.bind_address, "0.0.0.0:9000");
        assert_eq!(settings.node_limit, 1000);
        assert_eq!(settings.solve_timeout_ms, 30_000);

        let bad = HashMap::from([(TIMEOUT_VAR, "soon")]);
        assert!(matches!(
            Settings::default().with_overrides(|key| bad.get(key).map(|v| v.to_string())),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        assert!(matches!(
            Settings::load("/nonexistent/timetable.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
