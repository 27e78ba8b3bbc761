//! Logger module
//!
//! Provides logging utilities for the file server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use std::path::Path;

/// Initialize the logger with configuration
///
/// Should be called once at application startup. Until then every message
/// goes to stdout/stderr.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Startup banner, always on stdout so the URL is visible even when the
/// access log goes to a file
pub fn log_server_start(addr: &SocketAddr, root: &Path, config: &Config) {
    println!(
        "Server running at http://localhost:{} with CORS enabled",
        addr.port()
    );
    println!("Listening on: http://{addr}");
    println!("Serving files from: {}", root.display());
    println!(
        "CORS: origin '{}', methods '{}', headers '{}'",
        config.cors.allow_origin, config.cors.allow_methods, config.cors.allow_headers
    );
    if let Some(workers) = config.server.workers {
        println!("Worker threads: {workers}");
    }
    if let Some(ref path) = config.logging.access_log_file {
        println!("Access log: {path}");
    }
    if let Some(ref path) = config.logging.error_log_file {
        println!("Error log: {path}");
    }
    println!("Press Ctrl+C to stop");
}

pub fn log_shutdown(signal: &str) {
    write_info(&format!("\n[SIGNAL] {signal} received, shutting down"));
}

pub fn log_server_stopped(addr: &SocketAddr) {
    write_info(&format!("Server on {addr} stopped, listener closed"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_connection_rejected(peer_addr: &SocketAddr, active: usize, max: u64) {
    write_error(&format!(
        "[WARN] Max connections reached: {active}/{max}. Connection from {peer_addr} rejected."
    ));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}

pub fn log_bind_failed(addr: &SocketAddr, err: &std::io::Error) {
    log_error(&format!("Failed to bind {addr}: {err}"));
    if err.kind() == std::io::ErrorKind::AddrInUse {
        write_error("        Another process is already listening on this port");
    }
}
