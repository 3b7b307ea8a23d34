// Configuration module entry point
// Loads adapter options and holds the option-merge helper used by the build side

pub mod merge;
mod types;

use serde_json::{Map, Value};
use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

pub use merge::{merge_all, merge_config};
pub use types::{BuildConfig, LoggingConfig, Options, DEFAULT_HOSTNAME, DEFAULT_PORT};

use crate::error::{AdapterError, Result};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "adapter";

impl Options {
    /// Load options from the given file path (without extension), layered with
    /// `ADAPTER_*` environment variables. A missing file is not an error.
    pub fn load_from(config_path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("ADAPTER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("hostname", DEFAULT_HOSTNAME)?
            .set_default("start", true)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .build()?;

        let mut options: Self = settings.try_deserialize()?;
        if let Some(overrides) = read_bundler_overrides(config_path)? {
            options.bundler_overrides = overrides;
        }
        Ok(options)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Resolve `hostname:port`. IP literals are used as-is, names go through the resolver.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        if let Ok(ip) = self.hostname.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        (self.hostname.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| AdapterError::InvalidAddress(format!("{}:{} ({e})", self.hostname, self.port)))?
            .next()
            .ok_or_else(|| AdapterError::InvalidAddress(format!("{}:{}", self.hostname, self.port)))
    }
}

/// `bundler_overrides` exactly as written in the TOML file.
///
/// The layered loader lowercases keys, but bundler options are camelCase
/// (`allowOverwrite`, `logOverride`), so the table is read again with `toml`.
/// `Ok(None)` when there is no file or the file has no such table.
fn read_bundler_overrides(config_path: &str) -> Result<Option<Map<String, Value>>> {
    let path = if config_path.ends_with(".toml") {
        PathBuf::from(config_path)
    } else {
        PathBuf::from(format!("{config_path}.toml"))
    };

    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut table: toml::Table = toml::from_str(&raw).map_err(|e| {
        AdapterError::Configuration(format!("invalid options file {}: {e}", path.display()))
    })?;

    let Some(overrides) = table.remove("bundler_overrides") else {
        return Ok(None);
    };
    match serde_json::to_value(overrides) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(AdapterError::Configuration(
            "bundler_overrides must be a table".to_string(),
        )),
        Err(e) => Err(AdapterError::Configuration(format!(
            "bundler_overrides in {}: {e}",
            path.display()
        ))),
    }
}

impl BuildConfig {
    /// Read build metadata from a TOML file
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| {
            AdapterError::Configuration(format!("invalid build config {}: {e}", path.display()))
        })
    }
}
