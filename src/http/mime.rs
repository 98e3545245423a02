//! MIME type detection module
//!
//! Returns the Content-Type for a file based on its extension.

use std::path::Path;

/// Get MIME Content-Type for an audio track extension
///
/// Only the extensions accepted by the track filename grammar are mapped;
/// anything else falls back to `application/octet-stream`.
pub fn audio_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}

/// Get MIME Content-Type for any static asset extension
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension {
        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",

        // Images (cover art)
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        // Audio
        Some("mp3" | "wav" | "flac" | "m4a") => audio_content_type(extension),
        Some("ogg" | "oga") => "audio/ogg",
        Some("opus") => "audio/opus",
        Some("aac") => "audio/aac",

        // Playlists and lyrics
        Some("m3u") => "audio/x-mpegurl",
        Some("m3u8") => "application/vnd.apple.mpegurl",
        Some("lrc") => "text/plain; charset=utf-8",

        // Video
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",

        _ => "application/octet-stream",
    }
}

/// Extract the extension of a path as `&str`
pub fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}
