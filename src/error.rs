//! Crate error type
//!
//! Per-request failures never reach this type: they are turned into HTTP
//! responses by the handler. `ServerError` only covers startup and
//! configuration problems, which are fatal.

use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address '{0}'")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("served root '{path}' is not accessible: {source}")]
    Root {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value for header {name}: '{value}'")]
    InvalidHeader { name: &'static str, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
