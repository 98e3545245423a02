//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation, route matching, and dispatching.

use crate::config::AppState;
use crate::handler::{music, static_files};
use crate::http::cache::CachePolicy;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

const MUSIC_PREFIX: &str = "/music/";
const STATIC_PREFIX: &str = "/static/";
const STATS_PATH: &str = "/stats";

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub range_header: Option<String>,
}

/// Main entry point for HTTP request handling
///
/// Request bodies are never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let method = req.method();
    let path = req.uri().path();

    let ctx = RequestContext {
        path,
        is_head: *method == Method::HEAD,
        range_header: header_string(&req, "range"),
    };

    let mut response = match check_http_method(method, state.config.http.enable_cors) {
        Some(resp) => resp,
        None => route_request(&ctx, &state).await,
    };

    if state.config.http.enable_cors {
        http::response::apply_cors(&mut response);
    }

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            remote_addr.ip().to_string(),
            method.to_string(),
            req.uri().to_string(),
        );
        entry.http_version = version_label(req.version()).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        entry.range = ctx.range_header.clone();
        entry.referer = header_string(&req, "referer");
        entry.user_agent = header_string(&req, "user-agent");
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Route request based on path
async fn route_request(ctx: &RequestContext<'_>, state: &AppState) -> Response<ResponseBody> {
    if ctx.path == STATS_PATH {
        return http::build_json_response(&state.stats.report(), CachePolicy::NoStore);
    }

    if let Some(name) = ctx.path.strip_prefix(MUSIC_PREFIX) {
        return music::serve_track(ctx, name, state).await;
    }

    if let Some(rest) = ctx.path.strip_prefix(STATIC_PREFIX) {
        return static_files::serve_static(ctx, rest, state).await;
    }

    http::build_404_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::body::Bytes;

    fn state_with(files: &[(&str, &[u8])]) -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        for (name, data) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, data).unwrap();
        }
        let mut config = Config::defaults().unwrap();
        config.media.dir = dir.path().to_string_lossy().into_owned();
        config.logging.access_log = false;
        (dir, Arc::new(AppState::new(&config)))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        range: Option<&str>,
    ) -> (Response<()>, Bytes) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(range) = range {
            builder = builder.header("Range", range);
        }
        let req = builder.body(()).unwrap();
        let resp = handle_request(req, Arc::clone(state), peer()).await.unwrap();
        let (parts, body) = resp.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (Response::from_parts(parts, ()), bytes)
    }

    #[tokio::test]
    async fn test_stats_reflect_streams_and_are_idempotent() {
        let data = vec![1_u8; 2048];
        let (_dir, state) = state_with(&[("song.mp3", data.as_slice())]);

        let (resp, body) = send(&state, Method::GET, "/stats", None).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "application/json");
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"totalTransferred": "0B", "totalRequests": 0})
        );

        send(&state, Method::GET, "/music/song.mp3", None).await;
        send(&state, Method::GET, "/music/song.mp3", Some("bytes=0-1023")).await;

        let (_, first) = send(&state, Method::GET, "/stats", None).await;
        let (_, second) = send(&state, Method::GET, "/stats", None).await;
        assert_eq!(first, second);
        let json: serde_json::Value = serde_json::from_slice(&first).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"totalTransferred": "3KB", "totalRequests": 2})
        );
    }

    #[tokio::test]
    async fn test_music_route_partial() {
        let data: Vec<u8> = (0..1000_u32).map(|i| (i % 256) as u8).collect();
        let (_dir, state) = state_with(&[("song.mp3", data.as_slice())]);

        let (resp, body) =
            send(&state, Method::GET, "/music/song.mp3", Some("bytes=200-299")).await;
        assert_eq!(resp.status(), 206);
        assert_eq!(resp.headers()["Content-Range"], "bytes 200-299/1000");
        assert_eq!(&body[..], &data[200..300]);
    }

    #[tokio::test]
    async fn test_traversal_through_router() {
        let (_dir, state) = state_with(&[]);
        let (resp, _) = send(&state, Method::GET, "/music/../../etc/passwd", None).await;
        assert_eq!(resp.status(), 403);
        let (resp, _) = send(&state, Method::GET, "/music/..%2F..%2Fetc%2Fpasswd", None).await;
        assert_eq!(resp.status(), 403);
    }

    #[tokio::test]
    async fn test_methods() {
        let (_dir, state) = state_with(&[]);
        let (resp, _) = send(&state, Method::POST, "/music/song.mp3", None).await;
        assert_eq!(resp.status(), 405);
        assert_eq!(resp.headers()["Allow"], "GET, HEAD, OPTIONS");

        let (resp, _) = send(&state, Method::OPTIONS, "/music/song.mp3", None).await;
        assert_eq!(resp.status(), 204);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (_dir, state) = state_with(&[]);
        let (resp, _) = send(&state, Method::GET, "/nowhere", None).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_static_route() {
        let (_dir, state) = state_with(&[("covers/front.jpg", &b"jpeg"[..])]);
        let (resp, body) = send(&state, Method::GET, "/static/covers/front.jpg", None).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "image/jpeg");
        assert_eq!(body, "jpeg");

        assert_eq!(state.stats.snapshot().request_count, 0);
    }
}
