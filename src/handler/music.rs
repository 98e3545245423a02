//! Track streaming endpoint (`/music/<filename>`)
//!
//! Per request: validate the name, look up (cached) metadata, resolve the
//! Range header, emit headers, then hand the byte window to the stream
//! transport. Rejections are decided before any byte is written.

use crate::config::AppState;
use crate::error::MediaError;
use crate::handler::router::RequestContext;
use crate::http::cache::{format_http_date, CachePolicy};
use crate::http::response::{build_media_response, MediaHeaders};
use crate::http::{self, mime, RangeOutcome, ResponseBody};
use crate::logger;
use crate::media::{self, filename};
use http_body_util::BodyExt;
use hyper::{Response, StatusCode};
use percent_encoding::percent_decode_str;
use std::path::Path;
use std::sync::Arc;

/// Serve one track, converting every rejection into its fixed response
pub async fn serve_track(
    ctx: &RequestContext<'_>,
    raw_name: &str,
    state: &AppState,
) -> Response<ResponseBody> {
    match stream_track(ctx, raw_name, state).await {
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

/// Percent-decode the raw path segment
pub fn decode_name(raw: &str) -> Result<String, MediaError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| MediaError::InvalidFilename(raw.to_string()))
}

/// Reject traversal first, then anything outside the filename grammar
pub fn validate_name(name: &str) -> Result<(), MediaError> {
    if filename::has_parent_segment(name) {
        return Err(MediaError::PathTraversal(name.to_string()));
    }
    if !filename::is_valid_filename(name) {
        return Err(MediaError::InvalidFilename(name.to_string()));
    }
    Ok(())
}

async fn stream_track(
    ctx: &RequestContext<'_>,
    raw_name: &str,
    state: &AppState,
) -> Result<Response<ResponseBody>, MediaError> {
    let name = decode_name(raw_name)?;
    validate_name(&name)?;

    let path = state.media_root.join(&name);
    let meta = media::lookup(&state.metadata_cache, state.storage.as_ref(), &path)
        .await
        .map_err(|e| {
            logger::log_debug(&format!("Stat failed for {}: {e}", path.display()));
            MediaError::FileNotFound(path.clone())
        })?;

    let (status, window) = match http::resolve(meta.size, ctx.range_header.as_deref()) {
        RangeOutcome::Full => (StatusCode::OK, None),
        RangeOutcome::Partial(range) => (StatusCode::PARTIAL_CONTENT, Some(range)),
        RangeOutcome::Unsatisfiable => {
            return Err(MediaError::RangeUnsatisfiable { total: meta.size })
        }
        RangeOutcome::Malformed => return Err(MediaError::RangeMalformed { total: meta.size }),
    };

    let headers = MediaHeaders {
        status,
        content_type: mime::audio_content_type(mime::extension_of(Path::new(&name))),
        content_length: window.map_or(meta.size, |range| range.len()),
        content_range: window.map(|range| range.content_range()),
        last_modified: format_http_date(&meta.last_modified),
        cache_policy: CachePolicy::Public(state.config.http.cache_max_age),
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
    .await?
    .with_stats(Arc::clone(&state.stats));

    Ok(build_media_response(headers, body.boxed_unsync()))
}
