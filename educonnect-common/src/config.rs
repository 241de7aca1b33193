//! Client configuration loading
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (highest priority, applied by the binary)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error; the compiled defaults apply. A
//! config file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const ENV_CONFIG_FILE: &str = "EDUCONNECT_CONFIG";
/// Environment variable overriding the backend base URL
pub const ENV_BACKEND_URL: &str = "EDUCONNECT_BACKEND_URL";
/// Environment variable overriding the chat agent base URL
pub const ENV_AGENT_URL: &str = "EDUCONNECT_AGENT_URL";

const DEFAULT_BACKEND_URL: &str = "http://localhost:5001/api/v1";
const DEFAULT_AGENT_URL: &str = "http://localhost:8015";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Lesson client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL; tracking endpoints live under `/tracking`
    pub backend_url: String,
    /// Chat agent base URL
    pub agent_url: String,
    /// Per-request timeout for HTTP collaborators
    pub request_timeout_secs: u64,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// File holding this tab's scoped storage (tab id)
    pub tab_store_path: Option<PathBuf>,
    /// File holding persistent storage (chat history)
    pub history_store_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            agent_url: DEFAULT_AGENT_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: "info".to_string(),
            tab_store_path: None,
            history_store_path: None,
        }
    }
}

impl ClientConfig {
    /// Resolve and validate configuration from file and environment
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let config = Self::resolve(explicit_path)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration from file and environment without validating
    ///
    /// `explicit_path` (from the command line) wins over `EDUCONNECT_CONFIG`,
    /// which wins over the platform config file. Callers layering further
    /// overrides on top validate afterwards.
    pub fn resolve(explicit_path: Option<&Path>) -> Result<Self> {
        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(ENV_CONFIG_FILE).ok().map(PathBuf::from))
            .or_else(default_config_file);

        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                if explicit_path.is_some() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                Self::default()
            }
        };

        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse TOML content; unspecified keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_BACKEND_URL) {
            if !url.trim().is_empty() {
                self.backend_url = url;
            }
        }
        if let Ok(url) = std::env::var(ENV_AGENT_URL) {
            if !url.trim().is_empty() {
                self.agent_url = url;
            }
        }
    }

    /// Reject configurations no client could work with
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("backend_url", &self.backend_url), ("agent_url", &self.agent_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Backend base URL without a trailing slash
    pub fn backend_base(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }

    /// Agent base URL without a trailing slash
    pub fn agent_base(&self) -> &str {
        self.agent_url.trim_end_matches('/')
    }

    /// Tab store path, defaulting into the data directory
    pub fn tab_store_path(&self) -> PathBuf {
        self.tab_store_path
            .clone()
            .unwrap_or_else(|| default_data_dir().join("tab.json"))
    }

    /// History store path, defaulting into the data directory
    pub fn history_store_path(&self) -> PathBuf {
        self.history_store_path
            .clone()
            .unwrap_or_else(|| default_data_dir().join("history.json"))
    }
}

/// Platform config file location (`<config_dir>/educonnect/config.toml`)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("educonnect").join("config.toml"))
}

/// Platform data directory for file-backed stores
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("educonnect"))
        .unwrap_or_else(|| PathBuf::from("./educonnect_data"))
}
