//! Flag and sort vocabularies shared by requests and responses.
//!
//! Every numeric value here is fixed by the remote search process. The
//! request flag bits are not contiguous: `ATTRIBUTES` is `0x100` and the next
//! flag, `RUN_COUNT`, jumps to `0x1000`.

use bitflags::bitflags;
use tracing::warn;

use crate::error::{Result, WireError};

bitflags! {
    /// Which per-item fields a query asks for.
    ///
    /// Fields appear in the result data region in ascending bit order, so
    /// the declaration order below is also the wire order.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RequestFlags: u32 {
        const NAME = 0x0000_0001;
        const PATH = 0x0000_0002;
        const FULL_PATH_AND_NAME = 0x0000_0004;
        const EXTENSION = 0x0000_0008;
        const SIZE = 0x0000_0010;
        const DATE_CREATED = 0x0000_0020;
        const DATE_MODIFIED = 0x0000_0040;
        const DATE_ACCESSED = 0x0000_0080;
        const ATTRIBUTES = 0x0000_0100;
        const RUN_COUNT = 0x0000_1000;
        const DATE_RUN = 0x0000_2000;
    }
}

bitflags! {
    /// Match behavior for the search string.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SearchFlags: u32 {
        const MATCH_CASE = 0x0000_0001;
        const MATCH_WHOLE_WORD = 0x0000_0002;
        const MATCH_PATH = 0x0000_0004;
        const REGEX = 0x0000_0008;
    }
}

bitflags! {
    /// Per-item type flags carried by each item descriptor.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ItemFlags: u32 {
        const FOLDER = 0x0000_0001;
        const DRIVE = 0x0000_0002;
    }
}

/// Outcome of checking a raw request-flags value against the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagCheck {
    /// Documented flags present in the value.
    pub known: RequestFlags,
    /// Bits outside the documented set.
    pub unknown: u32,
}

impl FlagCheck {
    /// True when the value contains only documented bits.
    pub fn is_clean(&self) -> bool {
        self.unknown == 0
    }

    /// Human-readable note about unknown bits, if any.
    pub fn diagnostic(&self) -> Option<String> {
        if self.is_clean() {
            return None;
        }
        Some(format!(
            "request flags contain undocumented bits 0x{:08X}; they are passed through but carry no known field",
            self.unknown
        ))
    }
}

impl RequestFlags {
    /// Split a raw value into documented flags and unknown residue.
    ///
    /// Never fails: unknown bits may belong to a newer protocol revision.
    pub fn validate(bits: u32) -> FlagCheck {
        let check = FlagCheck {
            known: Self::from_bits_truncate(bits),
            unknown: bits & !Self::all().bits(),
        };
        if let Some(note) = check.diagnostic() {
            warn!(bits, "{note}");
        }
        check
    }

    /// Parse `NAME|SIZE`, `name,size`, `0x11` or `17`.
    ///
    /// Names are case-insensitive and may use `-` in place of `_`.
    pub fn parse(expr: &str) -> Result<Self> {
        let mut flags = Self::empty();
        for token in expr.split(['|', ',']) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            flags |= parse_token(token)?;
        }
        Ok(flags)
    }

    /// The constant name of a single documented flag.
    pub fn field_name(self) -> Option<&'static str> {
        Self::all()
            .iter_names()
            .find(|(_, flag)| *flag == self)
            .map(|(name, _)| name)
    }
}

fn parse_token(token: &str) -> Result<RequestFlags> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u32::from_str_radix(hex, 16)
            .map(RequestFlags::from_bits_retain)
            .map_err(|_| WireError::InvalidArgument(format!("invalid hex flags: {token}")));
    }
    if token.bytes().all(|b| b.is_ascii_digit()) {
        return token
            .parse::<u32>()
            .map(RequestFlags::from_bits_retain)
            .map_err(|_| WireError::InvalidArgument(format!("invalid flags value: {token}")));
    }

    let name = token.to_ascii_uppercase().replace('-', "_");
    RequestFlags::from_name(&name)
        .ok_or_else(|| WireError::InvalidArgument(format!("unknown request flag: {token}")))
}

/// Sort code sent with a request and echoed back in the result list.
///
/// The codes are opaque to the codec. Values without a named constant pass
/// through unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SortOrder(pub u32);

macro_rules! sort_orders {
    ($($name:ident = $value:literal,)*) => {
        impl SortOrder {
            $(pub const $name: SortOrder = SortOrder($value);)*

            /// Constant name for a documented sort code.
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(stringify!($name)),)*
                    _ => None,
                }
            }

            /// Every documented sort code, in numeric order.
            pub fn known() -> &'static [SortOrder] {
                &[$(SortOrder::$name,)*]
            }
        }
    };
}

sort_orders! {
    NAME_ASCENDING = 1,
    NAME_DESCENDING = 2,
    PATH_ASCENDING = 3,
    PATH_DESCENDING = 4,
    SIZE_ASCENDING = 5,
    SIZE_DESCENDING = 6,
    EXTENSION_ASCENDING = 7,
    EXTENSION_DESCENDING = 8,
    TYPE_NAME_ASCENDING = 9,
    TYPE_NAME_DESCENDING = 10,
    DATE_CREATED_ASCENDING = 11,
    DATE_CREATED_DESCENDING = 12,
    DATE_MODIFIED_ASCENDING = 13,
    DATE_MODIFIED_DESCENDING = 14,
    ATTRIBUTES_ASCENDING = 15,
    ATTRIBUTES_DESCENDING = 16,
    FILE_LIST_FILENAME_ASCENDING = 17,
    FILE_LIST_FILENAME_DESCENDING = 18,
    RUN_COUNT_ASCENDING = 19,
    RUN_COUNT_DESCENDING = 20,
    DATE_RECENTLY_CHANGED_ASCENDING = 21,
    DATE_RECENTLY_CHANGED_DESCENDING = 22,
    DATE_ACCESSED_ASCENDING = 23,
    DATE_ACCESSED_DESCENDING = 24,
    DATE_RUN_ASCENDING = 25,
    DATE_RUN_DESCENDING = 26,
}

impl From<u32> for SortOrder {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<SortOrder> for u32 {
    fn from(value: SortOrder) -> Self {
        value.0
    }
}
