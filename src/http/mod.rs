//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from specific business logic.
//! Shared by the track endpoint and the static asset passthrough.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{resolve, RangeOutcome, RangeSpec};
pub use response::{
    build_404_response, build_405_response, build_416_response, build_json_response,
    build_options_response, build_text_response, empty_body, ResponseBody,
};
