//! Copy-data message kinds and the envelope that carries QUERY2 buffers.
//!
//! The transport itself is out of scope. `CopyData` mirrors what a
//! window-message transport hands over: a kind tag plus an opaque buffer.

use bytes::Bytes;
use tracing::debug;

use crate::codec::CodecConfig;
use crate::error::{Result, WireError};
use crate::list::ResultList;
use crate::request::QueryRequest;

/// Reply to a query (the replying process may use any caller-chosen kind).
pub const QUERY_COMPLETE: u32 = 0;

/// Legacy wide-character query.
pub const QUERY: u32 = 1;

/// Versioned query carrying a `QueryRequest`.
pub const QUERY2: u32 = 3;

/// Returns a human-readable name for a copy-data kind.
pub fn kind_name(kind: u32) -> &'static str {
    match kind {
        QUERY_COMPLETE => "QUERY_COMPLETE",
        QUERY => "QUERY",
        QUERY2 => "QUERY2",
        _ => "UNKNOWN",
    }
}

/// One buffer crossing the IPC boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyData {
    pub kind: u32,
    pub payload: Bytes,
}

impl CopyData {
    pub fn new(kind: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Wrap an encoded QUERY2 request.
    pub fn query2(request: &QueryRequest) -> Result<Self> {
        Ok(Self::new(QUERY2, request.to_bytes()?))
    }

    /// Decode the request carried by a QUERY2 message.
    pub fn into_request(self) -> Result<QueryRequest> {
        if self.kind != QUERY2 {
            return Err(WireError::UnexpectedMessage {
                expected: QUERY2,
                actual: self.kind,
            });
        }
        QueryRequest::decode(&self.payload)
    }

    /// Decode a reply, checking it carries the kind the request asked for.
    pub fn into_result_list(self, request: &QueryRequest) -> Result<ResultList> {
        self.into_result_list_with_config(request, &CodecConfig::default())
    }

    pub fn into_result_list_with_config(
        self,
        request: &QueryRequest,
        config: &CodecConfig,
    ) -> Result<ResultList> {
        if self.kind != request.reply_message_id {
            return Err(WireError::UnexpectedMessage {
                expected: request.reply_message_id,
                actual: self.kind,
            });
        }
        debug!(
            kind = self.kind,
            size = self.payload.len(),
            "decoding reply payload"
        );
        ResultList::decode_with_config(self.payload, config)
    }
}
