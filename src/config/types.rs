// Configuration types module
// Defines the adapter options and the framework build metadata

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOSTNAME: &str = "0.0.0.0";

/// User-supplied adapter options, read by both the build and the runtime side
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Options {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_hostname")]
    pub hostname: String,
    /// When false the listener is never started (an external supervisor owns the socket)
    #[serde(default = "default_start")]
    pub start: bool,
    /// Bundler option overrides, merged over the built-in defaults
    #[serde(default)]
    pub bundler_overrides: Map<String, Value>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[allow(clippy::missing_const_for_fn)]
fn default_port() -> u16 {
    DEFAULT_PORT
}

#[allow(clippy::missing_const_for_fn)]
fn default_hostname() -> String {
    DEFAULT_HOSTNAME.to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_start() -> bool {
    true
}

impl Default for Options {
    fn default() -> Self {
        Self {
            port: default_port(),
            hostname: default_hostname(),
            start: default_start(),
            bundler_overrides: Map::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_access_log")]
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: default_access_log(),
            access_log_format: default_access_log_format(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Build settings resolved by the framework
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Entry module, relative to `server_root`
    pub server_entry: PathBuf,
    pub server_root: PathBuf,
    pub client_root: PathBuf,
}

impl BuildConfig {
    /// Location of the static output tree as seen from a deployed server directory.
    ///
    /// The framework emits `server/` and `client/` as siblings, so a bundled entry
    /// finds its static files one level up.
    pub fn client_root_for(server_dir: &Path) -> PathBuf {
        server_dir.join("..").join("client")
    }
}
