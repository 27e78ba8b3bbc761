//! HTTP protocol layer module
//!
//! Response builders and conditional-request helpers, decoupled from file
//! resolution.

pub mod cache;
pub mod response;

// Re-export commonly used types
pub use response::{
    build_304_response, build_404_response, build_501_response, build_file_response,
    build_html_response, build_redirect_response,
};
