//! Request handler module
//!
//! Method dispatch and static file serving under the served root.
//! CORS decoration happens one layer up, in `crate::cors`.

mod listing;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
pub use static_files::{resolve, Resolved};
