use crate::flags::RequestFlags;

/// Errors that can occur while encoding or decoding QUERY2 structures.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Not enough bytes for a declared field or array.
    #[error("truncated buffer ({available} bytes available, {needed} needed)")]
    TruncatedBuffer { needed: usize, available: usize },

    /// A string has no null terminator within bounds or is not valid UTF-16.
    #[error("malformed string in {0}")]
    MalformedString(&'static str),

    /// An offset points past the end of the region it indexes.
    #[error("offset {offset} out of bounds (region is {len} bytes)")]
    OutOfBounds { offset: usize, len: usize },

    /// The caller asked for a field the response does not carry.
    #[error("field {0:?} was not requested")]
    FieldNotRequested(RequestFlags),

    /// Caller-side misuse, such as an oversized search string.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A result list claims to return more items than it matched.
    #[error("numitems {numitems} exceeds totitems {totitems}")]
    CountExceedsTotal { numitems: u32, totitems: u32 },

    /// A copy-data message arrived with an unexpected kind.
    #[error("unexpected message kind {actual} (expected {expected})")]
    UnexpectedMessage { expected: u32, actual: u32 },
}

pub type Result<T> = std::result::Result<T, WireError>;
