// Server module entry point
// Listener ownership, accept loop and signal handling

pub mod connection;
pub mod listener;
pub mod signal;

// Rust does not allow `loop` as a module name (keyword), use server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{AppState, Config};
use crate::error::{Result, ServerError};
use crate::logger;

// Re-export commonly used items
pub use listener::create_listener;
pub use signal::shutdown_signal;

/// A bound file server
///
/// Owns the listening socket: it is acquired in [`Server::bind`] and released
/// when [`Server::run_until`] returns or the value is dropped.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: Arc<AppState>,
}

impl Server {
    /// Validate `config`, resolve the served root and bind the listener.
    ///
    /// Must be called from within a Tokio runtime. Bind failures are logged
    /// and returned as [`ServerError::Bind`].
    pub fn bind(config: Config) -> Result<Self> {
        let addr = config.socket_addr()?;
        let state = Arc::new(AppState::new(config)?);

        let listener = create_listener(addr).map_err(|source| {
            logger::log_bind_failed(&addr, &source);
            ServerError::Bind { addr, source }
        })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            state,
        })
    }

    /// Actual bound address (differs from the configured one for port 0)
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Serve until `shutdown` resolves, then close the listening socket
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        server_loop::run_server_loop(self.listener, self.state, shutdown).await;
        logger::log_server_stopped(&self.local_addr);
        Ok(())
    }
}
