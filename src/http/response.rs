//! HTTP response building module
//!
//! Provides builders for the responses the server emits, decoupled from business logic.
//! All bodies share one boxed type so that buffered and streamed responses mix freely.

use super::cache::CachePolicy;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Body type of every response produced by the server
pub type ResponseBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// Wrap buffered bytes as a response body
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Empty response body
pub fn empty_body() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Headers shared by full and partial media responses
#[derive(Debug, Clone)]
pub struct MediaHeaders {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub content_length: u64,
    /// `Content-Range` value, only for 206
    pub content_range: Option<String>,
    pub last_modified: String,
    pub cache_policy: CachePolicy,
}

/// Build a 200/206 media response around an already prepared body
pub fn build_media_response(headers: MediaHeaders, body: ResponseBody) -> Response<ResponseBody> {
    let status = headers.status;
    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", headers.content_type)
        .header("Content-Length", headers.content_length)
        .header("Accept-Ranges", "bytes")
        .header("Last-Modified", headers.last_modified)
        .header("Cache-Control", headers.cache_policy.to_header_value());

    if let Some(content_range) = headers.content_range {
        builder = builder.header("Content-Range", content_range);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        Response::new(empty_body())
    })
}

/// Build short plain-text response (error statuses)
pub fn build_text_response(status: StatusCode, text: &'static str) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", text.len())
        .body(full_body(text))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(full_body(text))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::NOT_FOUND, "File not found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(full_body("405 Method Not Allowed"))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(full_body("405 Method Not Allowed"))
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(204)
        .header("Allow", "GET, HEAD, OPTIONS");

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS")
            .header("Access-Control-Allow-Headers", "Range")
            .header(
                "Access-Control-Expose-Headers",
                "Content-Range, Content-Length, Accept-Ranges",
            )
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(empty_body()).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(empty_body())
    })
}

/// Build 416 Range Not Satisfiable response
///
/// The body stays empty; `Content-Range` advertises the real size.
pub fn build_416_response(file_size: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(416)
        .header("Content-Range", format!("bytes */{file_size}"))
        .header("Accept-Ranges", "bytes")
        .header("Content-Length", 0)
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(empty_body())
        })
}

/// Build JSON response from any serializable value
pub fn build_json_response<T: Serialize>(value: &T, policy: CachePolicy) -> Response<ResponseBody> {
    let json = match serde_json::to_vec(value) {
        Ok(json) => json,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize JSON response: {e}"));
            return build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .header("Content-Length", json.len())
        .header("Cache-Control", policy.to_header_value())
        .body(full_body(json))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            Response::new(empty_body())
        })
}

/// Add CORS headers to an outgoing response
pub fn apply_cors(response: &mut Response<ResponseBody>) {
    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        hyper::header::HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Expose-Headers",
        hyper::header::HeaderValue::from_static("Content-Range, Content-Length, Accept-Ranges"),
    );
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
