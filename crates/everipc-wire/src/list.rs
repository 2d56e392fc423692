use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::codec::{ensure_remaining, find_wide_str, put_wide_str, utf16_to_string, CodecConfig};
use crate::error::{Result, WireError};
use crate::flags::{ItemFlags, RequestFlags, SortOrder};
use crate::item::ItemDescriptor;
use crate::layout::{ITEM2_SIZE, LIST2_HEADER_SIZE};

/// Fixed header of a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHeader {
    /// Total number of matches for the query.
    pub totitems: u32,
    /// Number of items carried by this reply.
    pub numitems: u32,
    /// Index of the first carried item within all matches.
    pub offset: u32,
    /// Fields the responder honored, possibly with undocumented bits.
    pub request_flags: RequestFlags,
    pub sort_type: SortOrder,
}

impl ListHeader {
    pub fn decode(src: &[u8]) -> Result<Self> {
        let mut cursor = src;
        ensure_remaining(&cursor, LIST2_HEADER_SIZE)?;
        Ok(Self {
            totitems: cursor.get_u32_le(),
            numitems: cursor.get_u32_le(),
            offset: cursor.get_u32_le(),
            request_flags: RequestFlags::from_bits_retain(cursor.get_u32_le()),
            sort_type: SortOrder(cursor.get_u32_le()),
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(LIST2_HEADER_SIZE);
        dst.put_u32_le(self.totitems);
        dst.put_u32_le(self.numitems);
        dst.put_u32_le(self.offset);
        dst.put_u32_le(self.request_flags.bits());
        dst.put_u32_le(self.sort_type.0);
    }

    /// Documented fields present in the data region, in wire order.
    pub fn fields(&self) -> RequestFlags {
        RequestFlags::from_bits_truncate(self.request_flags.bits())
    }

    /// Byte offset where the data region starts, if it fits in `usize`.
    pub fn data_start(&self) -> Option<usize> {
        (self.numitems as usize)
            .checked_mul(ITEM2_SIZE)?
            .checked_add(LIST2_HEADER_SIZE)
    }
}

/// A decoded QUERY2 reply.
///
/// Owns the data region; item fields are decoded lazily on access.
#[derive(Debug, Clone)]
pub struct ResultList {
    header: ListHeader,
    items: Vec<ItemDescriptor>,
    data: Bytes,
}

impl ResultList {
    /// Decode a reply buffer using the default configuration.
    pub fn decode(src: Bytes) -> Result<Self> {
        Self::decode_with_config(src, &CodecConfig::default())
    }

    /// Decode a reply buffer.
    ///
    /// Wire format:
    /// ```text
    /// ┌────────────────────┬──────────────────────────┬──────────────────────┐
    /// │ Header (20B)       │ Descriptors              │ Data region          │
    /// │ tot/num/offset/    │ numitems x (flags,       │ UTF-16LE fields,     │
    /// │ request_flags/sort │ data_offset), 8B each    │ null-terminated      │
    /// └────────────────────┴──────────────────────────┴──────────────────────┘
    /// ```
    pub fn decode_with_config(src: Bytes, config: &CodecConfig) -> Result<Self> {
        let header = ListHeader::decode(&src)?;

        let data_start = header.data_start().ok_or(WireError::TruncatedBuffer {
            needed: usize::MAX,
            available: src.len(),
        })?;
        if src.len() < data_start {
            return Err(WireError::TruncatedBuffer {
                needed: data_start,
                available: src.len(),
            });
        }

        if header.numitems > header.totitems {
            if config.strict_counts {
                return Err(WireError::CountExceedsTotal {
                    numitems: header.numitems,
                    totitems: header.totitems,
                });
            }
            warn!(
                numitems = header.numitems,
                totitems = header.totitems,
                "result list carries more items than it matched"
            );
        }
        RequestFlags::validate(header.request_flags.bits());

        let items = (0..header.numitems as usize)
            .map(|i| ItemDescriptor::decode(&src, LIST2_HEADER_SIZE + i * ITEM2_SIZE))
            .collect::<Result<Vec<_>>>()?;

        let data = src.slice(data_start..);
        let has_fields = !header.fields().is_empty();
        for item in &items {
            let at = item.data_offset as usize;
            let in_bounds = if has_fields {
                at < data.len()
            } else {
                at <= data.len()
            };
            if !in_bounds {
                return Err(WireError::OutOfBounds {
                    offset: at,
                    len: data.len(),
                });
            }
        }

        debug!(
            totitems = header.totitems,
            numitems = header.numitems,
            data_len = data.len(),
            "decoded query2 result list"
        );

        Ok(Self {
            header,
            items,
            data,
        })
    }

    pub fn header(&self) -> &ListHeader {
        &self.header
    }

    pub fn items(&self) -> &[ItemDescriptor] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The trailing data region.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn item(&self, index: usize) -> Result<&ItemDescriptor> {
        self.items.get(index).ok_or(WireError::OutOfBounds {
            offset: index,
            len: self.items.len(),
        })
    }

    /// Return one text field of item `index`.
    ///
    /// `field` must be a single documented flag. Fields before it in bit
    /// order are skipped.
    pub fn resolve_field(&self, index: usize, field: RequestFlags) -> Result<String> {
        if field.field_name().is_none() {
            return Err(WireError::InvalidArgument(format!(
                "{field:?} is not a single request field"
            )));
        }
        if !self.header.fields().contains(field) {
            return Err(WireError::FieldNotRequested(field));
        }

        for entry in self.walk(index)? {
            let (flag, units) = entry?;
            if flag == field {
                return utf16_to_string(&units, "result field");
            }
        }
        Err(WireError::FieldNotRequested(field))
    }

    /// Every requested field of item `index`, in wire order.
    pub fn fields(&self, index: usize) -> Result<Vec<(RequestFlags, String)>> {
        self.walk(index)?
            .map(|entry| {
                let (flag, units) = entry?;
                Ok((flag, utf16_to_string(&units, "result field")?))
            })
            .collect()
    }

    fn walk(&self, index: usize) -> Result<FieldWalk<'_>> {
        let item = self.item(index)?;
        let start = item.data_offset as usize;
        let fields = self.header.fields();
        if !fields.is_empty() && start >= self.data.len() {
            return Err(WireError::OutOfBounds {
                offset: start,
                len: self.data.len(),
            });
        }
        Ok(FieldWalk {
            data: &self.data,
            pos: start,
            pending: fields.iter(),
        })
    }
}

/// Walks the null-terminated fields of one item.
struct FieldWalk<'a> {
    data: &'a [u8],
    pos: usize,
    pending: bitflags::iter::Iter<RequestFlags>,
}

impl Iterator for FieldWalk<'_> {
    type Item = Result<(RequestFlags, Vec<u16>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let flag = self.pending.next()?;
        match find_wide_str(self.data, self.pos) {
            Some((units, end)) => {
                self.pos = end;
                Some(Ok((flag, units)))
            }
            None => Some(Err(WireError::OutOfBounds {
                offset: self.pos,
                len: self.data.len(),
            })),
        }
    }
}

/// Assembles a wire-exact result list.
#[derive(Debug, Clone)]
pub struct ResultListBuilder {
    totitems: Option<u32>,
    offset: u32,
    request_flags: RequestFlags,
    sort_type: SortOrder,
    items: Vec<(ItemFlags, Vec<String>)>,
}

impl ResultListBuilder {
    pub fn new(request_flags: RequestFlags, sort_type: SortOrder) -> Self {
        Self {
            totitems: None,
            offset: 0,
            request_flags,
            sort_type,
            items: Vec::new(),
        }
    }

    /// Total match count. Defaults to the number of pushed items.
    pub fn totitems(mut self, totitems: u32) -> Self {
        self.totitems = Some(totitems);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Add an item with one text per requested field, in bit order.
    pub fn push<S: AsRef<str>>(mut self, flags: ItemFlags, fields: &[S]) -> Self {
        let fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
        self.items.push((flags, fields));
        self
    }

    pub fn build(self) -> Result<Bytes> {
        let expected = self.request_flags.iter_names().count();
        let numitems = u32::try_from(self.items.len())
            .map_err(|_| WireError::InvalidArgument("too many items".to_string()))?;
        let totitems = self.totitems.unwrap_or(numitems);
        if numitems > totitems {
            return Err(WireError::InvalidArgument(format!(
                "numitems {numitems} exceeds totitems {totitems}"
            )));
        }

        let mut data = BytesMut::new();
        let mut descriptors = BytesMut::with_capacity(self.items.len() * ITEM2_SIZE);
        for (index, (flags, fields)) in self.items.iter().enumerate() {
            if fields.len() != expected {
                return Err(WireError::InvalidArgument(format!(
                    "item {index} has {} fields, request flags need {expected}",
                    fields.len()
                )));
            }
            let data_offset = u32::try_from(data.len())
                .map_err(|_| WireError::InvalidArgument("data region too large".to_string()))?;
            ItemDescriptor::new(*flags, data_offset).encode(&mut descriptors);

            for text in fields {
                let units: Vec<u16> = text.encode_utf16().collect();
                if units.contains(&0) {
                    return Err(WireError::InvalidArgument(format!(
                        "item {index} field contains a null character"
                    )));
                }
                put_wide_str(&mut data, &units);
            }
        }

        let header = ListHeader {
            totitems,
            numitems,
            offset: self.offset,
            request_flags: self.request_flags,
            sort_type: self.sort_type,
        };
        let mut buf = BytesMut::with_capacity(LIST2_HEADER_SIZE + descriptors.len() + data.len());
        header.encode(&mut buf);
        buf.extend_from_slice(&descriptors);
        buf.extend_from_slice(&data);
        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{list2_data_start, offset_of, LIST2_FIELDS};

    fn wide(text: &str) -> Vec<u8> {
        let mut buf = BytesMut::new();
        let units: Vec<u16> = text.encode_utf16().collect();
        put_wide_str(&mut buf, &units);
        buf.to_vec()
    }

    fn raw_list(header: [u32; 5], items: &[(u32, u32)], data: &[u8]) -> Bytes {
        let mut buf = BytesMut::new();
        for value in header {
            buf.put_u32_le(value);
        }
        for (flags, offset) in items {
            buf.put_u32_le(*flags);
            buf.put_u32_le(*offset);
        }
        buf.put_slice(data);
        buf.freeze()
    }

    #[test]
    fn resolves_single_name() {
        let src = raw_list([1, 1, 0, 0x1, 0], &[(0, 0)], &wide("a.txt"));
        let list = ResultList::decode(src).unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list.header().totitems, 1);
        assert_eq!(list.resolve_field(0, RequestFlags::NAME).unwrap(), "a.txt");
    }

    #[test]
    fn short_buffers_are_truncated() {
        for len in 0..LIST2_HEADER_SIZE {
            let err = ResultList::decode(Bytes::from(vec![0u8; len])).unwrap_err();
            assert!(matches!(err, WireError::TruncatedBuffer { needed: 20, .. }));
        }
    }

    #[test]
    fn descriptor_array_must_fit() {
        let full = raw_list([3, 3, 0, 0, 0], &[(0, 0), (0, 0), (0, 0)], &[]);
        assert_eq!(full.len(), list2_data_start(3));
        assert!(ResultList::decode(full.clone()).is_ok());

        for cut in LIST2_HEADER_SIZE..full.len() {
            let err = ResultList::decode(full.slice(..cut)).unwrap_err();
            assert!(matches!(err, WireError::TruncatedBuffer { needed: 44, .. }));
        }
    }

    #[test]
    fn short_descriptor_array_wins_over_count_violation() {
        let src = raw_list([0, 5, 0, 0, 0], &[], &[]);
        let err = ResultList::decode(src).unwrap_err();
        assert!(matches!(
            err,
            WireError::TruncatedBuffer {
                needed: 60,
                available: 20
            }
        ));

        let src = raw_list([1, 3, 0, 0, 0], &[(0, 0), (0, 0)], &[]);
        let lenient = CodecConfig {
            strict_counts: false,
            ..CodecConfig::default()
        };
        let err = ResultList::decode_with_config(src, &lenient).unwrap_err();
        assert!(matches!(err, WireError::TruncatedBuffer { needed: 44, .. }));
    }

    #[test]
    fn huge_item_count_is_truncated_not_allocated() {
        let src = raw_list([u32::MAX, u32::MAX, 0, 0, 0], &[], &[]);
        let err = ResultList::decode(src).unwrap_err();
        assert!(matches!(err, WireError::TruncatedBuffer { .. }));
    }

    #[test]
    fn numitems_above_totitems_is_rejected() {
        let src = raw_list([1, 2, 0, 0, 0], &[(0, 0), (0, 0)], &[]);
        let err = ResultList::decode(src.clone()).unwrap_err();
        assert!(matches!(
            err,
            WireError::CountExceedsTotal {
                numitems: 2,
                totitems: 1
            }
        ));

        let lenient = CodecConfig {
            strict_counts: false,
            ..CodecConfig::default()
        };
        let list = ResultList::decode_with_config(src, &lenient).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn field_not_requested_for_every_flag() {
        for (name, flag) in RequestFlags::all().iter_names() {
            let honored = RequestFlags::all() - flag;
            let fields: Vec<String> = honored.iter_names().map(|(n, _)| n.to_string()).collect();
            let src = ResultListBuilder::new(honored, SortOrder::default())
                .push(ItemFlags::empty(), &fields[..])
                .build()
                .unwrap();
            let list = ResultList::decode(src).unwrap();

            let err = list.resolve_field(0, flag).unwrap_err();
            assert!(
                matches!(err, WireError::FieldNotRequested(f) if f == flag),
                "{name}"
            );
        }
    }

    #[test]
    fn walks_fields_in_bit_order() {
        let flags = RequestFlags::NAME
            | RequestFlags::PATH
            | RequestFlags::SIZE
            | RequestFlags::ATTRIBUTES
            | RequestFlags::DATE_RUN;
        let src = ResultListBuilder::new(flags, SortOrder::SIZE_DESCENDING)
            .totitems(10)
            .offset(4)
            .push(ItemFlags::empty(), &["a.txt", r"C:\docs", "1024", "32", "133"])
            .push(ItemFlags::FOLDER, &["src", r"C:\work", "", "16", "0"])
            .build()
            .unwrap();
        let list = ResultList::decode(src).unwrap();

        assert_eq!(list.header().offset, 4);
        assert_eq!(list.header().totitems, 10);
        assert_eq!(list.header().sort_type, SortOrder::SIZE_DESCENDING);
        assert_eq!(list.resolve_field(1, RequestFlags::PATH).unwrap(), r"C:\work");
        assert_eq!(list.resolve_field(1, RequestFlags::SIZE).unwrap(), "");
        assert_eq!(list.resolve_field(0, RequestFlags::DATE_RUN).unwrap(), "133");
        assert!(list.items()[1].is_folder());

        let all = list.fields(0).unwrap();
        let names: Vec<_> = all.iter().map(|(f, _)| f.field_name().unwrap()).collect();
        assert_eq!(names, ["NAME", "PATH", "SIZE", "ATTRIBUTES", "DATE_RUN"]);
        assert_eq!(all[1].1, r"C:\docs");
    }

    #[test]
    fn descriptors_allow_random_access() {
        let mut builder = ResultListBuilder::new(RequestFlags::NAME, SortOrder::NAME_ASCENDING);
        for i in 0..50 {
            builder = builder.push(ItemFlags::empty(), &[format!("file-{i}.log")]);
        }
        let list = ResultList::decode(builder.build().unwrap()).unwrap();
        assert_eq!(list.resolve_field(37, RequestFlags::NAME).unwrap(), "file-37.log");
    }

    #[test]
    fn unterminated_field_is_out_of_bounds() {
        let mut data = wide("a.txt");
        data.truncate(data.len() - 2);
        let src = raw_list([1, 1, 0, 0x1, 0], &[(0, 0)], &data);
        let list = ResultList::decode(src).unwrap();

        let err = list.resolve_field(0, RequestFlags::NAME).unwrap_err();
        assert!(matches!(err, WireError::OutOfBounds { offset: 0, len: 10 }));
    }

    #[test]
    fn later_field_missing_terminator() {
        let mut data = wide("a.txt");
        data.extend_from_slice(&[b'p', 0, b'q']);
        let src = raw_list([1, 1, 0, 0x3, 0], &[(0, 0)], &data);
        let list = ResultList::decode(src).unwrap();

        assert_eq!(list.resolve_field(0, RequestFlags::NAME).unwrap(), "a.txt");
        let err = list.resolve_field(0, RequestFlags::PATH).unwrap_err();
        assert!(matches!(err, WireError::OutOfBounds { .. }));
        assert!(list.fields(0).is_err());
    }

    #[test]
    fn data_offset_past_region_is_rejected() {
        let data = wide("a");
        let src = raw_list([2, 2, 0, 0x1, 0], &[(0, 0), (0, 4)], &data);
        let err = ResultList::decode(src).unwrap_err();
        assert!(matches!(err, WireError::OutOfBounds { offset: 4, len: 4 }));
    }

    #[test]
    fn items_without_fields_may_point_at_region_end() {
        let src = ResultListBuilder::new(RequestFlags::empty(), SortOrder::default())
            .push::<&str>(ItemFlags::DRIVE, &[])
            .build()
            .unwrap();
        let list = ResultList::decode(src).unwrap();
        assert!(list.data().is_empty());
        assert!(list.items()[0].is_drive());
        assert!(list.fields(0).unwrap().is_empty());
    }

    #[test]
    fn undocumented_bits_are_not_walked() {
        let src = raw_list([1, 1, 0, 0x0000_0201, 0], &[(0, 0)], &wide("x.bin"));
        let list = ResultList::decode(src).unwrap();
        assert_eq!(list.header().request_flags.bits(), 0x201);
        assert_eq!(list.fields(0).unwrap().len(), 1);
        assert_eq!(list.resolve_field(0, RequestFlags::NAME).unwrap(), "x.bin");
    }

    #[test]
    fn index_and_argument_errors() {
        let src = raw_list([1, 1, 0, 0x3, 0], &[(0, 0)], &wide("a"));
        let list = ResultList::decode(src).unwrap();

        let err = list.resolve_field(1, RequestFlags::NAME).unwrap_err();
        assert!(matches!(err, WireError::OutOfBounds { offset: 1, len: 1 }));

        let err = list
            .resolve_field(0, RequestFlags::NAME | RequestFlags::PATH)
            .unwrap_err();
        assert!(matches!(err, WireError::InvalidArgument(_)));
    }

    #[test]
    fn header_fields_at_layout_offsets() {
        let src = ResultListBuilder::new(RequestFlags::NAME, SortOrder(7))
            .totitems(9)
            .offset(3)
            .push(ItemFlags::empty(), &["n"])
            .build()
            .unwrap();
        let at = |name| {
            let off = offset_of(LIST2_FIELDS, name).unwrap();
            u32::from_le_bytes(src[off..off + 4].try_into().unwrap())
        };
        assert_eq!(at("totitems"), 9);
        assert_eq!(at("numitems"), 1);
        assert_eq!(at("offset"), 3);
        assert_eq!(at("request_flags"), 1);
        assert_eq!(at("sort_type"), 7);
    }

    #[test]
    fn builder_rejects_bad_input() {
        let err = ResultListBuilder::new(RequestFlags::NAME | RequestFlags::PATH, SortOrder(1))
            .push(ItemFlags::empty(), &["only-one"])
            .build()
            .unwrap_err();
        assert!(matches!(err, WireError::InvalidArgument(_)));

        let err = ResultListBuilder::new(RequestFlags::NAME, SortOrder(1))
            .totitems(0)
            .push(ItemFlags::empty(), &["a"])
            .build()
            .unwrap_err();
        assert!(matches!(err, WireError::InvalidArgument(_)));

        let err = ResultListBuilder::new(RequestFlags::NAME, SortOrder(1))
            .push(ItemFlags::empty(), &["a\0b"])
            .build()
            .unwrap_err();
        assert!(matches!(err, WireError::InvalidArgument(_)));
    }
}
