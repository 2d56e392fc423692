//! Cursor helpers and configuration shared by the structure codecs.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, WireError};
use crate::layout::WCHAR_SIZE;

/// Default cap on the search string, in UTF-16 code units.
pub const DEFAULT_MAX_SEARCH_LEN: usize = 32 * 1024;

/// Configuration for the QUERY2 codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Longest search string accepted by the request encoder. Default: 32K units.
    pub max_search_len: usize,
    /// Reject result lists whose `numitems` exceeds `totitems`. Default: true.
    pub strict_counts: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_search_len: DEFAULT_MAX_SEARCH_LEN,
            strict_counts: true,
        }
    }
}

/// Fail with `TruncatedBuffer` unless `src` holds at least `needed` more bytes.
pub(crate) fn ensure_remaining(src: &impl Buf, needed: usize) -> Result<()> {
    if src.remaining() < needed {
        return Err(WireError::TruncatedBuffer {
            needed,
            available: src.remaining(),
        });
    }
    Ok(())
}

/// Append UTF-16 `units` as little-endian followed by a null unit.
pub(crate) fn put_wide_str(dst: &mut BytesMut, units: &[u16]) {
    dst.reserve(WCHAR_SIZE * (units.len() + 1));
    for unit in units {
        dst.put_u16_le(*unit);
    }
    dst.put_u16_le(0);
}

/// Read a null-terminated UTF-16LE string starting at `start`.
///
/// Returns the decoded string and the byte offset just past its terminator,
/// or `None` when no terminator lies within `src`.
pub(crate) fn find_wide_str(src: &[u8], start: usize) -> Option<(Vec<u16>, usize)> {
    let mut units = Vec::new();
    let mut pos = start;
    while pos + WCHAR_SIZE <= src.len() {
        let unit = u16::from_le_bytes([src[pos], src[pos + 1]]);
        pos += WCHAR_SIZE;
        if unit == 0 {
            return Some((units, pos));
        }
        units.push(unit);
    }
    None
}

pub(crate) fn utf16_to_string(units: &[u16], context: &'static str) -> Result<String> {
    String::from_utf16(units).map_err(|_| WireError::MalformedString(context))
}
