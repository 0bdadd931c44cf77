//! HTTP `Range` header parsing
//!
//! Only the single-range forms `bytes=<start>-<end>` and `bytes=<start>-` are
//! accepted. Suffix ranges (`bytes=-500`) and multi-range lists are rejected as
//! malformed.

use crate::error::RangeError;
use crate::models::ByteRange;

const BYTES_UNIT: &str = "bytes=";

/// Outcome of parsing a Range header against a known length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No Range header: serve `[0, total)`
    FullBody { total: u64 },
    /// A satisfiable single range
    Partial(ByteRange),
}

/// Parse an optional Range header against `total_length` bytes.
///
/// `end` is clamped to `total_length - 1`; a `start` at or past the end of the
/// resource is not satisfiable.
pub fn parse_range(header: Option<&str>, total_length: u64) -> Result<RangeRequest, RangeError> {
    let Some(raw) = header else {
        return Ok(RangeRequest::FullBody {
            total: total_length,
        });
    };

    let spec = raw
        .trim()
        .strip_prefix(BYTES_UNIT)
        .ok_or_else(|| RangeError::Malformed(format!("unsupported range unit in '{raw}'")))?;

    let (start_str, end_str) = spec
        .split_once('-')
        .ok_or_else(|| RangeError::Malformed(format!("missing '-' in '{raw}'")))?;

    let start = parse_offset(start_str, raw)?;
    let end = match end_str.trim() {
        "" => None,
        value => Some(parse_offset(value, raw)?),
    };

    if start >= total_length {
        return Err(RangeError::NotSatisfiable {
            total: total_length,
        });
    }

    let last = total_length - 1;
    let end = end.map_or(last, |end| end.min(last));
    if end < start {
        return Err(RangeError::Malformed(format!(
            "range end precedes start in '{raw}'"
        )));
    }

    Ok(RangeRequest::Partial(ByteRange {
        start,
        end,
        total: total_length,
    }))
}

fn parse_offset(value: &str, raw: &str) -> Result<u64, RangeError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RangeError::Malformed(format!("missing range start in '{raw}'")));
    }
    value
        .parse::<u64>()
        .map_err(|_| RangeError::Malformed(format!("invalid offset '{value}' in '{raw}'")))
}
