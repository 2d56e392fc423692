//! Byte-exact codecs for the Everything QUERY2 IPC structures.
//!
//! A query travels as one contiguous buffer:
//! - A 28-byte header of seven little-endian `u32` fields
//! - The search string as null-terminated UTF-16LE
//!
//! The reply is a 20-byte header, `numitems` 8-byte item descriptors, and a
//! data region holding each item's requested fields as null-terminated
//! UTF-16LE text. Descriptors index into that region by offset.
//!
//! Decoding either yields a fully validated value or an error.

pub mod codec;
pub mod error;
pub mod flags;
pub mod item;
pub mod layout;
pub mod list;
pub mod message;
pub mod request;

pub use codec::{CodecConfig, DEFAULT_MAX_SEARCH_LEN};
pub use error::{Result, WireError};
pub use flags::{FlagCheck, ItemFlags, RequestFlags, SearchFlags, SortOrder};
pub use item::ItemDescriptor;
pub use layout::{FieldLayout, ITEM2_SIZE, LIST2_HEADER_SIZE, QUERY2_HEADER_SIZE};
pub use list::{ListHeader, ResultList, ResultListBuilder};
pub use message::{CopyData, QUERY, QUERY2, QUERY_COMPLETE};
pub use request::{QueryRequest, ALL_RESULTS};
