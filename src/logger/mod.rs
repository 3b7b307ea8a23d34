//! Logger module
//!
//! Line-oriented logging for both pipelines:
//! - listener lifecycle
//! - access logging with multiple formats
//! - build orchestration steps
//! - errors and warnings

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::LoggingConfig;
use std::net::SocketAddr;
use std::path::Path;

/// Initialize the logger. Call once at startup; without it lines go to stdout/stderr.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    writer::init(
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, client_root: &Path) {
    write_info(&format!("Server running on port {}", addr.port()));
    write_info(&format!("[Server] Listening on: http://{addr}"));
    write_info(&format!("[Server] Static root: {}", client_root.display()));
}

pub fn log_server_disabled() {
    write_info("[Server] start = false, listener not created");
}

pub fn log_server_stopped(addr: &SocketAddr) {
    write_info(&format!("[Server] Listener on {addr} closed"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_build_step(message: &str) {
    write_info(&format!("[Build] {message}"));
}
