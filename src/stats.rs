//! Transfer statistics
//!
//! Process-lifetime counters shared by every in-flight request.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Total bytes streamed and completed track requests
#[derive(Debug, Default)]
pub struct TransferStats {
    total_bytes: AtomicU64,
    request_count: AtomicU64,
}

/// Point-in-time copy of [`TransferStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_bytes: u64,
    pub request_count: u64,
}

/// `/stats` response body
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub total_transferred: String,
    pub total_requests: u64,
}

impl TransferStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add bytes delivered to a client
    pub fn add_bytes(&self, bytes: u64) {
        self.total_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Count one completed request
    pub fn add_request(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            request_count: self.request_count.load(Ordering::Relaxed),
        }
    }

    pub fn report(&self) -> StatsReport {
        let snapshot = self.snapshot();
        StatsReport {
            total_transferred: format_bytes(snapshot.total_bytes),
            total_requests: snapshot.request_count,
        }
    }
}

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Human readable byte count with 1024-based units
///
/// Two decimals at most, trailing zeros dropped: `0B`, `1000B`, `1.5KB`, `2MB`.
pub fn format_bytes(bytes: u64) -> String {
    let mut unit = 0;
    let mut threshold = 1_u64;
    while unit + 1 < UNITS.len() && bytes >= threshold * 1024 {
        threshold *= 1024;
        unit += 1;
    }

    if unit == 0 {
        return format!("{bytes}B");
    }

    #[allow(clippy::cast_precision_loss)]
    let value = bytes as f64 / threshold as f64;
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}{}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(1000), "1000B");
        assert_eq!(format_bytes(1023), "1023B");
        assert_eq!(format_bytes(1024), "1KB");
        assert_eq!(format_bytes(1536), "1.5KB");
        assert_eq!(format_bytes(1_048_576), "1MB");
        assert_eq!(format_bytes(1_288_490_189), "1.2GB");
        assert_eq!(format_bytes(1 << 50), "1PB");
        assert_eq!(format_bytes(1 << 60), "1024PB");
    }

    #[test]
    fn test_report_is_stable_without_transfers() {
        let stats = TransferStats::new();
        stats.add_bytes(1536);
        stats.add_request();
        let first = stats.report();
        let second = stats.report();
        assert_eq!(first, second);
        assert_eq!(
            first,
            StatsReport {
                total_transferred: "1.5KB".to_string(),
                total_requests: 1,
            }
        );
    }

    #[test]
    fn test_report_json_shape() {
        let stats = TransferStats::new();
        let json = serde_json::to_value(stats.report()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"totalTransferred": "0B", "totalRequests": 0})
        );
    }

    #[test]
    fn test_concurrent_increments() {
        let stats = Arc::new(TransferStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.add_bytes(10);
                        stats.add_request();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                total_bytes: 80_000,
                request_count: 8000,
            }
        );
    }
}
