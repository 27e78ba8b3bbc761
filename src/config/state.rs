// Application state module
// Immutable per-process state shared by every connection

use std::path::PathBuf;
use std::sync::Arc;

use super::types::Config;
use crate::cors::CorsPolicy;
use crate::error::{Result, ServerError};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonical served root, resolved once at startup
    pub root: PathBuf,
    pub cors: Arc<CorsPolicy>,
}

impl AppState {
    /// Resolve the served root and build the CORS policy from `config`
    pub fn new(config: Config) -> Result<Self> {
        let root = std::fs::canonicalize(&config.files.root).map_err(|source| {
            ServerError::Root {
                path: config.files.root.clone(),
                source,
            }
        })?;
        if !root.is_dir() {
            return Err(ServerError::Root {
                path: config.files.root.clone(),
                source: std::io::Error::other("not a directory"),
            });
        }
        let cors = Arc::new(CorsPolicy::from_config(&config.cors)?);

        Ok(Self { config, root, cors })
    }

    /// Whether per-request access logging is enabled
    pub const fn access_log(&self) -> bool {
        self.config.logging.access_log
    }
}
