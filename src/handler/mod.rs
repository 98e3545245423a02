//! Request handler module
//!
//! Responsible for request routing dispatch and the per-endpoint logic:
//! track streaming, static asset passthrough and statistics.

pub mod music;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
