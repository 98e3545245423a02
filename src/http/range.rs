//! HTTP Range request resolution module
//!
//! Resolves a `Range` header against a file size (RFC 7233, `bytes` unit).
//! Only the first range of a list is honored; multipart responses are not produced.

/// A satisfiable byte window, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    /// First byte offset
    pub start: u64,
    /// Last byte offset (inclusive)
    pub end: u64,
    /// Size of the whole resource
    pub total: u64,
}

impl RangeSpec {
    /// Number of bytes in the window
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value, e.g. `bytes 200-299/1000`
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// Range header resolution result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No Range header, send the whole resource
    Full,
    /// Valid single range - 206
    Partial(RangeSpec),
    /// Well-formed but outside the resource - 416
    Unsatisfiable,
    /// Header present but not parseable - 416
    Malformed,
}

/// Resolve an optional Range header against `total_size`
///
/// Supported formats:
/// - `bytes=start-end` - Specific range, `end` clamped to the last byte
/// - `bytes=start-` - From start to end
/// - `bytes=-suffix` - Last suffix bytes (whole file if suffix exceeds it)
///
/// # Examples
/// ```ignore
/// let outcome = resolve(1000, Some("bytes=200-299"));
/// assert!(matches!(outcome, RangeOutcome::Partial(r) if r.len() == 100));
/// assert_eq!(resolve(1000, None), RangeOutcome::Full);
/// ```
pub fn resolve(total_size: u64, range_header: Option<&str>) -> RangeOutcome {
    let Some(header) = range_header else {
        return RangeOutcome::Full;
    };

    let Some((unit, ranges)) = header.split_once('=') else {
        return RangeOutcome::Malformed;
    };
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return RangeOutcome::Malformed;
    }

    // Additional ranges are ignored
    let first = ranges.split(',').next().unwrap_or_default().trim();
    let Some((start_str, end_str)) = first.split_once('-') else {
        return RangeOutcome::Malformed;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        return resolve_suffix(end_str, total_size);
    }

    resolve_standard(start_str, end_str, total_size)
}

/// Parsed decimal position
enum Position {
    Value(u64),
    /// Only digits, but larger than `u64::MAX`
    Overflow,
}

fn parse_position(s: &str) -> Option<Position> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse::<u64>().map_or(Position::Overflow, Position::Value))
}

/// Resolve suffix range (e.g., "-500")
fn resolve_suffix(suffix_str: &str, total_size: u64) -> RangeOutcome {
    let suffix = match parse_position(suffix_str) {
        Some(Position::Value(v)) => v,
        Some(Position::Overflow) => u64::MAX,
        None => return RangeOutcome::Malformed,
    };

    if suffix == 0 || total_size == 0 {
        return RangeOutcome::Unsatisfiable;
    }

    RangeOutcome::Partial(RangeSpec {
        start: total_size.saturating_sub(suffix),
        end: total_size - 1,
        total: total_size,
    })
}

/// Resolve standard range (e.g., "0-99" or "100-")
fn resolve_standard(start_str: &str, end_str: &str, total_size: u64) -> RangeOutcome {
    let start = match parse_position(start_str) {
        Some(Position::Value(v)) => v,
        Some(Position::Overflow) => return RangeOutcome::Unsatisfiable,
        None => return RangeOutcome::Malformed,
    };

    let last = if end_str.is_empty() {
        u64::MAX
    } else {
        match parse_position(end_str) {
            Some(Position::Value(v)) => v,
            Some(Position::Overflow) => u64::MAX,
            None => return RangeOutcome::Malformed,
        }
    };

    if start >= total_size {
        return RangeOutcome::Unsatisfiable;
    }

    let end = last.min(total_size - 1);
    if start > end {
        return RangeOutcome::Unsatisfiable;
    }

    RangeOutcome::Partial(RangeSpec {
        start,
        end,
        total: total_size,
    })
}
