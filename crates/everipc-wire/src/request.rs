use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::codec::{ensure_remaining, find_wide_str, put_wide_str, utf16_to_string, CodecConfig};
use crate::error::{Result, WireError};
use crate::flags::{RequestFlags, SearchFlags, SortOrder};
use crate::layout::{query2_len, QUERY2_HEADER_SIZE};

/// `max_results` sentinel: return every match.
pub const ALL_RESULTS: u32 = 0xFFFF_FFFF;

/// One outbound QUERY2 search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Window that should receive the reply.
    pub reply_target_id: u32,
    /// Copy-data kind the reply will carry.
    pub reply_message_id: u32,
    pub search_flags: SearchFlags,
    /// Index of the first result to return.
    pub offset: u32,
    /// Result cap, or [`ALL_RESULTS`].
    pub max_results: u32,
    pub request_flags: RequestFlags,
    pub sort_type: SortOrder,
    pub search_string: String,
}

impl QueryRequest {
    /// Create a request for `search` that asks for names and paths of all results.
    pub fn new(reply_target_id: u32, reply_message_id: u32, search: impl Into<String>) -> Self {
        Self {
            reply_target_id,
            reply_message_id,
            search_flags: SearchFlags::empty(),
            offset: 0,
            max_results: ALL_RESULTS,
            request_flags: RequestFlags::NAME | RequestFlags::PATH,
            sort_type: SortOrder::NAME_ASCENDING,
            search_string: search.into(),
        }
    }

    pub fn with_request_flags(mut self, flags: RequestFlags) -> Self {
        self.request_flags = flags;
        self
    }

    pub fn with_search_flags(mut self, flags: SearchFlags) -> Self {
        self.search_flags = flags;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort_type = sort;
        self
    }

    /// Restrict the reply to `max_results` items starting at `offset`.
    pub fn with_window(mut self, offset: u32, max_results: u32) -> Self {
        self.offset = offset;
        self.max_results = max_results;
        self
    }

    /// True when `max_results` is the "all results" sentinel.
    pub fn is_unbounded(&self) -> bool {
        self.max_results == ALL_RESULTS
    }

    /// The exact encoded length of this request.
    pub fn wire_size(&self) -> usize {
        query2_len(self.search_string.encode_utf16().count())
    }

    /// Encode into `dst` using the default configuration.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        self.encode_with_config(dst, &CodecConfig::default())
    }

    /// Encode into `dst`.
    ///
    /// Wire format:
    /// ```text
    /// ┌─────────┬─────────┬─────────┬─────────┬─────────┬─────────┬─────────┬──────────────────┐
    /// │ reply   │ reply   │ search  │ offset  │ max     │ request │ sort    │ search string    │
    /// │ target  │ message │ flags   │         │ results │ flags   │ type    │ UTF-16LE + 0x0000│
    /// │ (4B LE) │ (4B LE) │ (4B LE) │ (4B LE) │ (4B LE) │ (4B LE) │ (4B LE) │                  │
    /// └─────────┴─────────┴─────────┴─────────┴─────────┴─────────┴─────────┴──────────────────┘
    /// ```
    pub fn encode_with_config(&self, dst: &mut BytesMut, config: &CodecConfig) -> Result<()> {
        let units: Vec<u16> = self.search_string.encode_utf16().collect();
        if units.len() > config.max_search_len {
            return Err(WireError::InvalidArgument(format!(
                "search string too long ({} units, max {})",
                units.len(),
                config.max_search_len
            )));
        }
        if units.contains(&0) {
            return Err(WireError::InvalidArgument(
                "search string contains a null character".to_string(),
            ));
        }

        dst.reserve(query2_len(units.len()));
        dst.put_u32_le(self.reply_target_id);
        dst.put_u32_le(self.reply_message_id);
        dst.put_u32_le(self.search_flags.bits());
        dst.put_u32_le(self.offset);
        dst.put_u32_le(self.max_results);
        dst.put_u32_le(self.request_flags.bits());
        dst.put_u32_le(self.sort_type.0);
        put_wide_str(dst, &units);

        trace!(units = units.len(), "encoded query2 request");
        Ok(())
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode a request buffer.
    ///
    /// Bytes after the string terminator are ignored.
    pub fn decode(src: &[u8]) -> Result<Self> {
        let mut cursor = src;
        ensure_remaining(&cursor, QUERY2_HEADER_SIZE)?;

        let reply_target_id = cursor.get_u32_le();
        let reply_message_id = cursor.get_u32_le();
        let search_flags = SearchFlags::from_bits_retain(cursor.get_u32_le());
        let offset = cursor.get_u32_le();
        let max_results = cursor.get_u32_le();
        let request_flags = RequestFlags::from_bits_retain(cursor.get_u32_le());
        let sort_type = SortOrder(cursor.get_u32_le());

        let (units, end) = find_wide_str(src, QUERY2_HEADER_SIZE)
            .ok_or(WireError::MalformedString("search_string"))?;
        let search_string = utf16_to_string(&units, "search_string")?;

        if end < src.len() {
            debug!(
                trailing = src.len() - end,
                "ignoring bytes after query2 search string"
            );
        }

        Ok(Self {
            reply_target_id,
            reply_message_id,
            search_flags,
            offset,
            max_results,
            request_flags,
            sort_type,
            search_string,
        })
    }
}
