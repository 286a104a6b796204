//! Client configuration.
//!
//! `DriveConfig` is read from TOML. The file is located with the same
//! resolution order everywhere:
//!
//! 1. `DRIVEKIT_CONFIG_PATH` environment variable
//! 2. `drivekit.toml` in the current directory
//! 3. `drivekit.toml` in each parent directory, walking up to the root
//! 4. `~/.config/drivekit/config.toml`
//!
//! A missing file is not an error. `DRIVEKIT_ACCESS_TOKEN`, when set, always
//! wins over the token stored in the file.
//!
//! ```toml
//! access_token = "ya29...."
//! endpoint = "https://www.googleapis.com/drive/v3"
//! timeout_secs = 30
//!
//! [retry]
//! max_times = 3
//! min_delay_ms = 200
//! max_delay_ms = 5000
//!
//! [search]
//! default_limit = 25
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::search::DEFAULT_SEARCH_LIMIT;

pub const CONFIG_PATH_ENV: &str = "DRIVEKIT_CONFIG_PATH";
pub const ACCESS_TOKEN_ENV: &str = "DRIVEKIT_ACCESS_TOKEN";
pub const PROJECT_CONFIG_FILE: &str = "drivekit.toml";
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/drive/v3";

/// Errors raised while locating or reading configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for talking to the drive service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// OAuth bearer token. Obtaining and refreshing it is the caller's job.
    pub access_token: Option<String>,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub retry: RetryConfig,
    pub search: SearchConfig,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            retry: RetryConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

/// Transport retry policy for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt. `0` disables retrying.
    pub max_times: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_times: 3,
            min_delay_ms: 200,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl DriveConfig {
    /// Loads a configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file does not exist, or a read or
    /// parse error if it cannot be loaded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded drive configuration");
        Ok(config)
    }

    /// Finds and loads the configuration using the resolution order above.
    ///
    /// # Errors
    ///
    /// Returns an error if a file was found but could not be read or parsed.
    /// Not finding any file yields `Ok(None)`.
    pub fn resolve() -> Result<Option<Self>, ConfigError> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let current = std::env::current_dir()?;
        let xdg_path = xdg_config_path();
        resolve_from(env_path.as_deref(), &current, xdg_path.as_deref())
    }

    /// Resolves the configuration, falling back to defaults, and applies the
    /// access token environment override.
    ///
    /// # Errors
    ///
    /// Same as [`DriveConfig::resolve`].
    pub fn load_resolved() -> Result<Self, ConfigError> {
        let config = Self::resolve()?.unwrap_or_default();
        Ok(config.with_token_override(std::env::var(ACCESS_TOKEN_ENV).ok()))
    }

    /// Replaces the access token when `token` is a non-empty value.
    #[must_use]
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.access_token = Some(token);
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".into()));
        }
        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Invalid(
                "retry.min_delay_ms must not exceed retry.max_delay_ms".into(),
            ));
        }
        Ok(())
    }
}

fn resolve_from(
    env_path: Option<&Path>,
    current: &Path,
    xdg_path: Option<&Path>,
) -> Result<Option<DriveConfig>, ConfigError> {
    if let Some(path) = env_path
        && path.exists()
    {
        return DriveConfig::load(path).map(Some);
    }

    // `ancestors` starts with `current` itself.
    for dir in current.ancestors() {
        let candidate = dir.join(PROJECT_CONFIG_FILE);
        if candidate.exists() {
            return DriveConfig::load(candidate).map(Some);
        }
    }

    if let Some(path) = xdg_path
        && path.exists()
    {
        return DriveConfig::load(path).map(Some);
    }

    Ok(None)
}

fn xdg_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("drivekit").join("config.toml"))
}
