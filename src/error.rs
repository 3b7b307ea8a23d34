//! Error types shared by the build and runtime pipelines.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdapterError>;

#[derive(Error, Debug)]
pub enum AdapterError {
    /// Build metadata was read before the configuration-resolved hook ran.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The external bundler failed; the message is its own output, verbatim.
    #[error("Build error: {0}")]
    Build(String),

    /// Chunk removal failed. Never fatal, only logged.
    #[error("Cleanup error for {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to bind listener on {addr}: {source}")]
    ListenerBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Render error: {0}")]
    Render(String),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
