use crate::constants::{CONFIG_ENV_VAR, DEFAULT_LOG_FILTER, DEFAULT_REVERSE_EDGE_SUFFIX};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Route controller settings, read from a JSON file
///
/// Every field is optional in the file and falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Appended to a track's name to name its backward edge
    pub reverse_edge_suffix: String,
    /// Pop a train's reservation entry when it leaves the track
    pub release_on_leave: bool,
    /// `env_logger` filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            reverse_edge_suffix: DEFAULT_REVERSE_EDGE_SUFFIX.to_string(),
            release_on_leave: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Parse a config from JSON
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, `Parse` if it is malformed
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load from the file named by `ROUTE_CONTROL_CONFIG`, or defaults when unset
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is set but the file is unreadable or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::from_file(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }
}
