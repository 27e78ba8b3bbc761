//! Development static file server with permissive CORS.
//!
//! Serves files from a directory over plain HTTP and adds
//! `Access-Control-Allow-Origin`, `-Methods` and `-Headers` to every response.
//! `OPTIONS` preflights get an empty `200` without touching the filesystem.

pub mod config;
pub mod cors;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::Config;
pub use cors::{Cors, CorsPolicy};
pub use error::ServerError;
pub use server::Server;
