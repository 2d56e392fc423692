//! Byte layout of the QUERY2 structures.
//!
//! All integers are 4-byte little-endian unsigned values with no padding
//! between them.

/// One field of a fixed-layout structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
}

const fn field(name: &'static str, offset: usize, size: usize) -> FieldLayout {
    FieldLayout { name, offset, size }
}

/// Fixed request header: 7 x u32 = 28 bytes. The search string follows.
pub const QUERY2_HEADER_SIZE: usize = 28;

/// Fixed result-list header: 5 x u32 = 20 bytes.
pub const LIST2_HEADER_SIZE: usize = 20;

/// Item descriptor: flags (4) + data_offset (4) = 8 bytes.
pub const ITEM2_SIZE: usize = 8;

/// Size of one UTF-16 code unit on the wire.
pub const WCHAR_SIZE: usize = 2;

/// `size == 0` marks the variable-length tail.
pub const QUERY2_FIELDS: &[FieldLayout] = &[
    field("reply_hwnd", 0, 4),
    field("reply_copydata_message", 4, 4),
    field("search_flags", 8, 4),
    field("offset", 12, 4),
    field("max_results", 16, 4),
    field("request_flags", 20, 4),
    field("sort_type", 24, 4),
    field("search_string", 28, 0),
];

pub const LIST2_FIELDS: &[FieldLayout] = &[
    field("totitems", 0, 4),
    field("numitems", 4, 4),
    field("offset", 8, 4),
    field("request_flags", 12, 4),
    field("sort_type", 16, 4),
];

pub const ITEM2_FIELDS: &[FieldLayout] = &[field("flags", 0, 4), field("data_offset", 4, 4)];

/// Byte offset of a named field in a layout table.
pub fn offset_of(fields: &[FieldLayout], name: &str) -> Option<usize> {
    fields.iter().find(|f| f.name == name).map(|f| f.offset)
}

/// Fixed size implied by a layout table (last field end).
pub fn fixed_size(fields: &[FieldLayout]) -> usize {
    fields.iter().map(|f| f.offset + f.size).max().unwrap_or(0)
}

/// Total encoded request length for a search string of `units` UTF-16 units.
pub const fn query2_len(units: usize) -> usize {
    QUERY2_HEADER_SIZE + WCHAR_SIZE * (units + 1)
}

/// Byte offset of the data region for a list carrying `numitems` items.
pub const fn list2_data_start(numitems: usize) -> usize {
    LIST2_HEADER_SIZE + ITEM2_SIZE * numitems
}
