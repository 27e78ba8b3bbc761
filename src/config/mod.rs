// Configuration module entry point
// Layered configuration (defaults, optional file, environment) and runtime state

mod state;
mod types;

use std::net::{IpAddr, SocketAddr};

use crate::error::ServerError;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, CorsConfig, FilesConfig, LoggingConfig, PerformanceConfig, ServerConfig,
};

/// Prefix for environment overrides, e.g. `CORS_DEVSERVER_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "CORS_DEVSERVER";

impl Config {
    /// Load configuration: defaults, then the file at `config_path` if one is
    /// given, then environment overrides
    ///
    /// No file is looked up implicitly. An explicit path must exist
    /// (extension optional).
    pub fn load(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("files.root", ".")?
            .set_default("files.directory_listing", true)?
            .set_default("cors.allow_origin", "*")?
            .set_default("cors.allow_methods", "GET, POST, OPTIONS")?
            .set_default("cors.allow_headers", "Content-Type")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        self.server
            .host
            .parse::<IpAddr>()
            .map(|ip| SocketAddr::new(ip, self.server.port))
            .map_err(|_| {
                ServerError::InvalidAddress(format!("{}:{}", self.server.host, self.server.port))
            })
    }
}
