//! Request error taxonomy
//!
//! Every rejection is detected before response bytes are sent, except
//! [`MediaError::StreamFailure`] which may also surface mid-body (see `media::stream`).

use crate::http::{self, ResponseBody};
use hyper::{Response, StatusCode};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("path traversal attempt: {0:?}")]
    PathTraversal(String),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("range not satisfiable for {total} bytes")]
    RangeUnsatisfiable { total: u64 },

    #[error("malformed range header for {total} bytes")]
    RangeMalformed { total: u64 },

    #[error("stream failure: {0}")]
    StreamFailure(#[from] io::Error),
}

impl MediaError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidFilename(_) => StatusCode::BAD_REQUEST,
            Self::PathTraversal(_) => StatusCode::FORBIDDEN,
            Self::FileNotFound(_) => StatusCode::NOT_FOUND,
            Self::RangeUnsatisfiable { .. } | Self::RangeMalformed { .. } => {
                StatusCode::RANGE_NOT_SATISFIABLE
            }
            Self::StreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert into the fixed response for this error
    pub fn into_response(self) -> Response<ResponseBody> {
        let status = self.status();
        match self {
            Self::InvalidFilename(_) => http::build_text_response(status, "Invalid filename"),
            Self::PathTraversal(_) => http::build_text_response(status, "Access denied"),
            Self::FileNotFound(_) => http::build_text_response(status, "File not found"),
            Self::RangeUnsatisfiable { total } | Self::RangeMalformed { total } => {
                http::build_416_response(total)
            }
            Self::StreamFailure(_) => http::build_text_response(status, "Internal server error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(MediaError::InvalidFilename("a!".into()).status(), 400);
        assert_eq!(MediaError::PathTraversal("..".into()).status(), 403);
        assert_eq!(MediaError::FileNotFound("x.mp3".into()).status(), 404);
        assert_eq!(MediaError::RangeUnsatisfiable { total: 1 }.status(), 416);
        assert_eq!(MediaError::RangeMalformed { total: 1 }.status(), 416);
        let err = MediaError::from(io::Error::other("disk gone"));
        assert_eq!(err.status(), 500);
        assert_eq!(err.to_string(), "stream failure: disk gone");
    }

    #[test]
    fn test_into_response_416_carries_size() {
        let resp = MediaError::RangeMalformed { total: 42 }.into_response();
        assert_eq!(resp.status(), 416);
        assert_eq!(resp.headers()["Content-Range"], "bytes */42");
    }
}
