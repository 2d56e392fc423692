use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, WireError};
use crate::flags::ItemFlags;
use crate::layout::ITEM2_SIZE;

/// Fixed-size record describing one result item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemDescriptor {
    pub flags: ItemFlags,
    /// Offset of this item's fields, relative to the start of the data region.
    pub data_offset: u32,
}

impl ItemDescriptor {
    pub fn new(flags: ItemFlags, data_offset: u32) -> Self {
        Self { flags, data_offset }
    }

    pub fn is_folder(&self) -> bool {
        self.flags.contains(ItemFlags::FOLDER)
    }

    pub fn is_drive(&self) -> bool {
        self.flags.contains(ItemFlags::DRIVE)
    }

    /// Decode the descriptor that starts `at` bytes into `src`.
    ///
    /// A short buffer reports `needed` as the absolute end of the descriptor
    /// (`at + 8`) against `src.len()`. `data_offset` is not checked here; only
    /// the enclosing list knows the size of the data region.
    pub fn decode(src: &[u8], at: usize) -> Result<Self> {
        let end = at.checked_add(ITEM2_SIZE).unwrap_or(usize::MAX);
        if src.len() < end {
            return Err(WireError::TruncatedBuffer {
                needed: end,
                available: src.len(),
            });
        }
        let mut cursor = &src[at..end];

        let flags = ItemFlags::from_bits_retain(cursor.get_u32_le());
        let data_offset = cursor.get_u32_le();
        Ok(Self { flags, data_offset })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(ITEM2_SIZE);
        dst.put_u32_le(self.flags.bits());
        dst.put_u32_le(self.data_offset);
    }
}
