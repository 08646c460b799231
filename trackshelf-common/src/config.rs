//! Configuration loading and resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file at the default location is not an error: a warning
//! is logged and compiled defaults are used. A config file that exists but
//! does not parse is an error.

use crate::time::millis_to_duration;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable overriding the backend base URL
pub const ENV_API_URL: &str = "TRACKSHELF_API_URL";

/// Environment variable overriding the config file location
pub const ENV_CONFIG_PATH: &str = "TRACKSHELF_CONFIG";

/// Bootstrap configuration as written in the TOML file
///
/// Every key is optional; absent keys fall through to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Backend base URL including the `/api` prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    /// Tracks per page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_limit: Option<u32>,

    /// Quiet period before a search term is applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_debounce_ms: Option<u64>,

    /// Per-request timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Built-in defaults used when no other source provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub api_base_url: String,
    pub page_limit: u32,
    pub search_debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            page_limit: 10,
            search_debounce_ms: 500,
            request_timeout_secs: 30,
            log_level: default_log_level(),
        }
    }
}

/// Fully resolved client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash
    pub api_base_url: String,
    pub page_limit: u32,
    pub search_debounce: Duration,
    pub request_timeout: Duration,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let defaults = CompiledDefaults::default();
        Self {
            api_base_url: defaults.api_base_url,
            page_limit: defaults.page_limit,
            search_debounce: millis_to_duration(defaults.search_debounce_ms),
            request_timeout: Duration::from_secs(defaults.request_timeout_secs),
            log_level: defaults.log_level,
        }
    }
}

/// Resolves [`ClientConfig`] from CLI overrides, environment, TOML and defaults
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_api_url: Option<String>,
    cli_config_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL given on the command line
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        self.cli_api_url = api_url;
        self
    }

    /// Config file given on the command line
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.cli_config_path = path;
        self
    }

    /// Config file to read, and whether it was requested explicitly
    fn config_file(&self) -> Option<(PathBuf, bool)> {
        if let Some(path) = &self.cli_config_path {
            return Some((path.clone(), true));
        }

        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            if !path.trim().is_empty() {
                return Some((PathBuf::from(path), true));
            }
        }

        default_config_path().map(|p| (p, false))
    }

    /// Load the TOML layer
    ///
    /// Explicitly requested files must exist; the default location may be
    /// absent.
    pub fn load_toml(&self) -> Result<TomlConfig> {
        let Some((path, explicit)) = self.config_file() else {
            warn!("Could not determine config directory, using defaults");
            return Ok(TomlConfig::default());
        };

        if !path.exists() {
            if explicit {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(TomlConfig::default());
        }

        let config = load_toml_file(&path)?;
        info!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Resolve every setting through the priority chain
    pub fn resolve(&self) -> Result<ClientConfig> {
        let toml_config = self.load_toml()?;
        self.resolve_with(toml_config)
    }

    /// Resolve against an already loaded TOML layer
    pub fn resolve_with(&self, toml_config: TomlConfig) -> Result<ClientConfig> {
        let defaults = CompiledDefaults::default();

        let api_base_url = self
            .cli_api_url
            .clone()
            .or_else(|| std::env::var(ENV_API_URL).ok().filter(|v| !v.trim().is_empty()))
            .or(toml_config.api_base_url)
            .unwrap_or(defaults.api_base_url);
        let api_base_url = api_base_url.trim().trim_end_matches('/').to_string();
        if api_base_url.is_empty() {
            return Err(Error::Config("api_base_url must not be empty".to_string()));
        }

        let page_limit = toml_config.page_limit.unwrap_or(defaults.page_limit);
        if page_limit == 0 {
            return Err(Error::Config("page_limit must be at least 1".to_string()));
        }

        let config = ClientConfig {
            api_base_url,
            page_limit,
            search_debounce: millis_to_duration(
                toml_config
                    .search_debounce_ms
                    .unwrap_or(defaults.search_debounce_ms),
            ),
            request_timeout: Duration::from_secs(
                toml_config
                    .request_timeout_secs
                    .unwrap_or(defaults.request_timeout_secs),
            ),
            log_level: toml_config.logging.level,
        };

        debug!(?config, "Resolved client configuration");
        Ok(config)
    }
}

/// Platform config location: `<config dir>/trackshelf/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("trackshelf").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}
