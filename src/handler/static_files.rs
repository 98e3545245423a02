//! Static file serving module (`/static/<path>`)
//!
//! Plain passthrough rooted at the media directory: no filename grammar, no
//! metadata cache, no statistics. Single ranges are honored; a malformed Range
//! header is ignored and the whole file is sent.

use crate::config::AppState;
use crate::error::MediaError;
use crate::handler::music::decode_name;
use crate::handler::router::RequestContext;
use crate::http::cache::{format_http_date, CachePolicy};
use crate::http::response::{build_media_response, MediaHeaders};
use crate::http::{self, mime, RangeOutcome, ResponseBody};
use crate::logger;
use crate::media::{self, filename};
use http_body_util::BodyExt;
use hyper::{Response, StatusCode};
use std::path::PathBuf;

/// Serve a static asset relative to the media root
pub async fn serve_static(
    ctx: &RequestContext<'_>,
    raw_path: &str,
    state: &AppState,
) -> Response<ResponseBody> {
    match stream_static(ctx, raw_path, state).await {
        Ok(response) => response,
        Err(err) => {
            match &err {
                MediaError::PathTraversal(_) => logger::log_warning(&err.to_string()),
                MediaError::StreamFailure(_) => logger::log_error(&err.to_string()),
                _ => logger::log_debug(&err.to_string()),
            }
            err.into_response()
        }
    }
}

/// Resolve a request path to a file inside the media root
///
/// Symlinks are followed, but the target must stay under the root.
async fn resolve_path(state: &AppState, relative: &str) -> Result<PathBuf, MediaError> {
    if filename::has_parent_segment(relative) {
        return Err(MediaError::PathTraversal(relative.to_string()));
    }

    let relative = relative.trim_start_matches('/');
    let candidate = state.media_root.join(relative);
    if relative.is_empty() {
        return Err(MediaError::FileNotFound(candidate));
    }

    let root = match tokio::fs::canonicalize(&state.media_root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Media directory not found or inaccessible '{}': {e}",
                state.media_root.display()
            ));
            return Err(MediaError::FileNotFound(candidate));
        }
    };

    // File not found is common (404), no need to log at warning level
    let Ok(canonical) = tokio::fs::canonicalize(&candidate).await else {
        return Err(MediaError::FileNotFound(candidate));
    };
    if !canonical.starts_with(&root) {
        return Err(MediaError::PathTraversal(format!(
            "{relative} -> {}",
            canonical.display()
        )));
    }

    Ok(canonical)
}

async fn stream_static(
    ctx: &RequestContext<'_>,
    raw_path: &str,
    state: &AppState,
) -> Result<Response<ResponseBody>, MediaError> {
    let relative = decode_name(raw_path)?;
    let path = resolve_path(state, &relative).await?;

    let meta = state
        .storage
        .stat(&path)
        .await
        .map_err(|_| MediaError::FileNotFound(path.clone()))?;

    let (status, window) = match http::resolve(meta.size, ctx.range_header.as_deref()) {
        RangeOutcome::Partial(range) => (StatusCode::PARTIAL_CONTENT, Some(range)),
        RangeOutcome::Unsatisfiable => {
            return Err(MediaError::RangeUnsatisfiable { total: meta.size })
        }
        RangeOutcome::Full | RangeOutcome::Malformed => (StatusCode::OK, None),
    };

    let headers = MediaHeaders {
        status,
        content_type: mime::get_content_type(mime::extension_of(&path)),
        content_length: window.map_or(meta.size, |range| range.len()),
        content_range: window.map(|range| range.content_range()),
        last_modified: format_http_date(&meta.last_modified),
        cache_policy: CachePolicy::Public(0),
    };

    if ctx.is_head {
        return Ok(build_media_response(headers, http::empty_body()));
    }

    let body = media::open_window(
        state.storage.as_ref(),
        &path,
        window,
        meta.size,
        state.config.stream.chunk_size,
    )
    .await?;

    Ok(build_media_response(headers, body.boxed_unsync()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use hyper::body::Bytes;

    fn state_in(dir: &std::path::Path) -> AppState {
        let mut config = Config::defaults().unwrap();
        config.media.dir = dir.to_string_lossy().into_owned();
        AppState::new(&config)
    }

    fn ctx(range: Option<&str>) -> RequestContext<'static> {
        RequestContext {
            path: "/static/",
            is_head: false,
            range_header: range.map(ToString::to_string),
        }
    }

    async fn body_of(response: Response<ResponseBody>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_serves_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("covers")).unwrap();
        std::fs::write(dir.path().join("covers/front.png"), b"png-bytes").unwrap();
        let state = state_in(dir.path());

        let resp = serve_static(&ctx(None), "covers/front.png", &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "image/png");
        assert_eq!(resp.headers()["Cache-Control"], "public, max-age=0");
        assert_eq!(body_of(resp).await, "png-bytes");
    }

    #[tokio::test]
    async fn test_range_and_malformed_range() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"0123456789").unwrap();
        let state = state_in(dir.path());

        let resp = serve_static(&ctx(Some("bytes=2-4")), "notes.txt", &state).await;
        assert_eq!(resp.status(), 206);
        assert_eq!(body_of(resp).await, "234");

        let resp = serve_static(&ctx(Some("lines=1-2")), "notes.txt", &state).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_of(resp).await, "0123456789");

        let resp = serve_static(&ctx(Some("bytes=50-")), "notes.txt", &state).await;
        assert_eq!(resp.status(), 416);
    }

    #[tokio::test]
    async fn test_rejects_traversal_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("albums")).unwrap();
        let state = state_in(dir.path());

        let resp = serve_static(&ctx(None), "..%2Fsecret.txt", &state).await;
        assert_eq!(resp.status(), 403);

        let resp = serve_static(&ctx(None), "albums", &state).await;
        assert_eq!(resp.status(), 404);

        let resp = serve_static(&ctx(None), "", &state).await;
        assert_eq!(resp.status(), 404);

        let resp = serve_static(&ctx(None), "missing.txt", &state).await;
        assert_eq!(resp.status(), 404);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_is_forbidden() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), b"secret").unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt"))
            .unwrap();
        let state = state_in(dir.path());

        let resp = serve_static(&ctx(None), "link.txt", &state).await;
        assert_eq!(resp.status(), 403);
    }
}
