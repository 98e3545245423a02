//! Byte-range stream transport
//!
//! [`FileBody`] is a hyper body that reads a fixed window of a file one bounded
//! chunk at a time. Nothing is read until hyper polls for the next frame, so a
//! client that disconnects stops the read loop with at most one chunk in flight.
//!
//! Errors while opening or seeking are returned to the caller before any header
//! is written. Errors after that can only end the body: the failure is logged,
//! hyper aborts the connection, and the status already sent stands.

use super::metadata::Storage;
use crate::http::RangeSpec;
use crate::logger;
use crate::stats::TransferStats;
use hyper::body::{Body, Bytes, Frame, SizeHint};
use std::io::{self, SeekFrom};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeekExt, ReadBuf};

/// Default read chunk (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Streaming body over `len` bytes of `reader`
pub struct FileBody<R> {
    reader: R,
    remaining: u64,
    sent: u64,
    buf: Vec<u8>,
    stats: Option<Arc<TransferStats>>,
    label: String,
    failed: bool,
    settled: bool,
}

impl<R: AsyncRead + Unpin> FileBody<R> {
    /// Stream `len` bytes from the current position of `reader`
    pub fn new(reader: R, len: u64, chunk_size: usize) -> Self {
        let capacity = usize::try_from(len)
            .map_or(chunk_size, |len| len.min(chunk_size))
            .max(1);

        Self {
            reader,
            remaining: len,
            sent: 0,
            buf: vec![0; capacity],
            stats: None,
            label: String::new(),
            failed: false,
            settled: false,
        }
    }

    /// Report delivered bytes and completion to `stats`
    #[must_use]
    pub fn with_stats(mut self, stats: Arc<TransferStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Name used in log lines
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl<R> FileBody<R> {
    /// Bytes handed to the connection so far
    #[cfg(test)]
    pub const fn bytes_sent(&self) -> u64 {
        self.sent
    }

    /// Account for this body exactly once
    fn settle(&mut self) {
        if self.settled {
            return;
        }
        self.settled = true;

        let completed = self.remaining == 0 && !self.failed;
        if let Some(stats) = &self.stats {
            stats.add_bytes(self.sent);
            if completed {
                stats.add_request();
            }
        }
        if !completed && !self.failed {
            logger::log_debug(&format!(
                "Stream for {} closed by client after {} bytes ({} left)",
                self.label, self.sent, self.remaining
            ));
        }
    }

    fn fail(&mut self, err: &io::Error) {
        self.failed = true;
        logger::log_error(&format!(
            "Stream error for {} after {} bytes: {err}",
            self.label, self.sent
        ));
        self.settle();
    }
}

impl<R: AsyncRead + Unpin> Body for FileBody<R> {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        if this.failed {
            return Poll::Ready(None);
        }
        if this.remaining == 0 {
            this.settle();
            return Poll::Ready(None);
        }

        let want = usize::try_from(this.remaining).map_or(this.buf.len(), |r| r.min(this.buf.len()));
        let mut read_buf = ReadBuf::new(&mut this.buf[..want]);

        let polled = Pin::new(&mut this.reader).poll_read(cx, &mut read_buf);
        match polled {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(err)) => {
                this.fail(&err);
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(Ok(())) => {
                let filled = read_buf.filled();
                if filled.is_empty() {
                    let err = io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "file ended before the requested range",
                    );
                    this.fail(&err);
                    return Poll::Ready(Some(Err(err)));
                }

                let chunk = Bytes::copy_from_slice(filled);
                let n = chunk.len() as u64;
                this.remaining -= n;
                this.sent += n;
                if this.remaining == 0 {
                    this.settle();
                }
                Poll::Ready(Some(Ok(Frame::data(chunk))))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.remaining == 0 || self.failed
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining)
    }
}

impl<R> Drop for FileBody<R> {
    fn drop(&mut self) {
        self.settle();
    }
}

/// Open `path` positioned at the start of `window` (or byte 0)
///
/// The returned body yields exactly `window.len()` bytes, or `size` bytes
/// when no window is given.
pub async fn open_window(
    storage: &dyn Storage,
    path: &Path,
    window: Option<RangeSpec>,
    size: u64,
    chunk_size: usize,
) -> io::Result<FileBody<File>> {
    let mut file = storage.open(path).await?;

    let len = match window {
        Some(range) => {
            file.seek(SeekFrom::Start(range.start)).await?;
            range.len()
        }
        None => size,
    };

    Ok(FileBody::new(file, len, chunk_size).with_label(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::metadata::DiskStorage;
    use http_body_util::BodyExt;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    /// Serves one chunk, then fails
    struct FailingReader {
        served: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.served {
                return Poll::Ready(Err(io::Error::other("disk read failed")));
            }
            self.served = true;
            buf.put_slice(&[7; 10]);
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_window_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        let data = sample(1000);
        std::fs::write(&path, &data).unwrap();

        let window = RangeSpec {
            start: 200,
            end: 299,
            total: 1000,
        };
        let body = open_window(&DiskStorage, &path, Some(window), 1000, DEFAULT_CHUNK_SIZE)
            .await
            .unwrap();
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(bytes.len(), 100);
        assert_eq!(&bytes[..], &data[200..=299]);
    }

    #[tokio::test]
    async fn test_chunks_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.flac");
        let data = sample(200 * 1024 + 7);
        std::fs::write(&path, &data).unwrap();

        let mut body = open_window(&DiskStorage, &path, None, data.len() as u64, DEFAULT_CHUNK_SIZE)
            .await
            .unwrap();

        let mut collected = Vec::new();
        let mut frames = 0;
        while let Some(frame) = body.frame().await {
            let chunk = frame.unwrap().into_data().unwrap();
            assert!(chunk.len() <= DEFAULT_CHUNK_SIZE);
            collected.extend_from_slice(&chunk);
            frames += 1;
        }
        assert!(frames >= 4);
        assert_eq!(collected, data);
    }

    #[tokio::test]
    async fn test_completion_updates_stats() {
        let stats = Arc::new(TransferStats::new());
        let data = sample(300);
        let body = FileBody::new(&data[..], 300, 128).with_stats(Arc::clone(&stats));

        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(bytes.len(), 300);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_bytes, 300);
        assert_eq!(snapshot.request_count, 1);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_ends_body() {
        let stats = Arc::new(TransferStats::new());
        let mut body = FileBody::new(FailingReader { served: false }, 100, 64)
            .with_stats(Arc::clone(&stats))
            .with_label("broken.mp3");

        let first = body.frame().await.unwrap().unwrap();
        assert_eq!(first.into_data().unwrap().len(), 10);

        let second = body.frame().await.unwrap();
        assert!(second.is_err());
        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());

        drop(body);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_bytes, 10);
        assert_eq!(snapshot.request_count, 0);
    }

    #[tokio::test]
    async fn test_truncated_file_is_an_error() {
        let data = sample(50);
        let mut body = FileBody::new(&data[..], 80, 64);
        let mut got = 0;
        let mut failed = false;
        while let Some(frame) = body.frame().await {
            match frame {
                Ok(f) => got += f.into_data().unwrap().len(),
                Err(e) => {
                    assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);
                    failed = true;
                }
            }
        }
        assert_eq!(got, 50);
        assert!(failed);
    }

    #[tokio::test]
    async fn test_client_disconnect_stops_reading() {
        let stats = Arc::new(TransferStats::new());
        let data = sample(1000);
        let mut body = FileBody::new(&data[..], 1000, 100).with_stats(Arc::clone(&stats));

        body.frame().await.unwrap().unwrap();
        assert_eq!(body.bytes_sent(), 100);
        drop(body);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_bytes, 100);
        assert_eq!(snapshot.request_count, 0);
    }

    #[tokio::test]
    async fn test_open_missing_file_fails_before_streaming() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_window(&DiskStorage, &dir.path().join("gone.mp3"), None, 10, 64).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_body() {
        let stats = Arc::new(TransferStats::new());
        let body = FileBody::new(&b""[..], 0, 64).with_stats(Arc::clone(&stats));
        assert!(body.is_end_stream());
        drop(body);
        assert_eq!(stats.snapshot().request_count, 1);
    }
}
