//! Configuration loading and value resolution
//!
//! Settings are resolved in the following priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the loader logs a warning and
//! continues with compiled defaults.

use crate::{CabinetRole, Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the stream base URL
pub const ENV_STREAM_URL: &str = "CABINET_STREAM_URL";
/// Environment variable holding the viewer's user id
pub const ENV_USER_ID: &str = "CABINET_USER_ID";
/// Environment variable holding the bearer credential
pub const ENV_STREAM_TOKEN: &str = "CABINET_STREAM_TOKEN";
/// Environment variable holding the viewer's cabinet role
pub const ENV_ROLE: &str = "CABINET_ROLE";

/// Delay before the first reconnect attempt
pub const DEFAULT_RECONNECT_BASE_DELAY_MS: u64 = 2_000;
/// Upper bound for any single reconnect delay
pub const DEFAULT_RECONNECT_MAX_DELAY_MS: u64 = 60_000;
/// Consecutive failures tolerated before the transport gives up
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
/// TCP/TLS connect timeout for a single attempt
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Notification listener configuration loaded from TOML
///
/// Every section is optional; absent sections take their defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Stream endpoint and reconnect tuning
    #[serde(default)]
    pub stream: StreamSettings,

    /// Viewer identity
    #[serde(default)]
    pub viewer: ViewerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Stream endpoint and reconnect policy settings
#[derive(Debug, Clone, Deserialize)]
pub struct StreamSettings {
    /// Base URL; the stream lives at `<base_url>/stream/<user_id>`
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,

    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,

    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// Viewer identity settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ViewerConfig {
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub role: Option<CabinetRole>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_reconnect_base_delay_ms() -> u64 {
    DEFAULT_RECONNECT_BASE_DELAY_MS
}

fn default_reconnect_max_delay_ms() -> u64 {
    DEFAULT_RECONNECT_MAX_DELAY_MS
}

fn default_max_reconnect_attempts() -> u32 {
    DEFAULT_MAX_RECONNECT_ATTEMPTS
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            reconnect_base_delay_ms: DEFAULT_RECONNECT_BASE_DELAY_MS,
            reconnect_max_delay_ms: DEFAULT_RECONNECT_MAX_DELAY_MS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl StreamSettings {
    /// Reject reconnect settings that would make the backoff schedule meaningless
    pub fn validate(&self) -> Result<()> {
        if self.reconnect_base_delay_ms == 0 {
            return Err(Error::Config(
                "stream.reconnect_base_delay_ms must be greater than zero".to_string(),
            ));
        }
        if self.reconnect_max_delay_ms < self.reconnect_base_delay_ms {
            return Err(Error::Config(format!(
                "stream.reconnect_max_delay_ms ({}) is below reconnect_base_delay_ms ({})",
                self.reconnect_max_delay_ms, self.reconnect_base_delay_ms
            )));
        }
        Ok(())
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.stream.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit path; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from an explicit path, or from the platform default
    /// location, falling back to compiled defaults when no file exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match locate_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config file found, using compiled defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Find the default configuration file for the platform
///
/// Linux checks `~/.config/cabinet/notify.toml` then `/etc/cabinet/notify.toml`;
/// other platforms check the user config directory only.
pub fn locate_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("cabinet").join("notify.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/cabinet/notify.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve a setting through the CLI → environment → TOML → default chain
///
/// Empty strings at any tier are treated as unset.
pub fn resolve_value(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
    default: Option<&str>,
) -> Option<String> {
    // Priority 1: Command-line argument
    if let Some(value) = cli_arg.filter(|v| !v.is_empty()) {
        return Some(value.to_string());
    }

    // Priority 2: Environment variable
    if let Ok(value) = std::env::var(env_var_name) {
        if !value.is_empty() {
            return Some(value);
        }
    }

    // Priority 3: TOML config file
    if let Some(value) = toml_value.filter(|v| !v.is_empty()) {
        return Some(value.to_string());
    }

    // Priority 4: Compiled default
    default.map(str::to_string)
}

/// Like [`resolve_value`], but a setting with no value at any tier is an error
pub fn require_value(
    setting: &str,
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Result<String> {
    resolve_value(cli_arg, env_var_name, toml_value, None).ok_or_else(|| {
        Error::Config(format!(
            "{} is not configured (pass it on the command line, set {}, or add it to the config file)",
            setting, env_var_name
        ))
    })
}
