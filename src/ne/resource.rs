//! The NE resource table.
//!
//! The table opens with its own shift count, which scales the `offset` and
//! `length` of every resource into byte units. This is distinct from the
//! header's alignment shift count, which governs segments.

use log::debug;
use scroll::Pread;

use crate::error::{self, Error};

/// High bit of a raw resource `type`/`id` word: the low 15 bits are an
/// integer, not a name offset
pub const RESOURCE_ID_INTEGER: u16 = 0x8000;

/// Resource flag: the resource is moveable
pub const RESOURCE_FLAG_MOVEABLE: u16 = 0x0010;
/// Resource flag: the resource is pure (read-only)
pub const RESOURCE_FLAG_PURE: u16 = 0x0020;
/// Resource flag: the resource is preloaded
pub const RESOURCE_FLAG_PRELOAD: u16 = 0x0040;

/// Name for a predefined integer resource type, `None` for custom types.
pub fn resource_type_name(type_id: u16) -> Option<&'static str> {
    match type_id & !RESOURCE_ID_INTEGER {
        1 => Some("CURSOR"),
        2 => Some("BITMAP"),
        3 => Some("ICON"),
        4 => Some("MENU"),
        5 => Some("DIALOG"),
        6 => Some("STRING"),
        7 => Some("FONTDIR"),
        8 => Some("FONT"),
        9 => Some("ACCELERATOR"),
        10 => Some("RCDATA"),
        11 => Some("MESSAGE_TABLE"),
        12 => Some("GROUP_CURSOR"),
        13 => Some("GROUP_ICON"),
        16 => Some("VERSION"),
        17 => Some("DLGINCLUDE"),
        19 => Some("PLUGPLAY"),
        20 => Some("VXD"),
        21 => Some("ANICURSOR"),
        22 => Some("ANIICON"),
        23 => Some("HTML"),
        _ => None,
    }
}

/// A single resource within a type bucket.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Resource<'a> {
    /// Position of the content, in sector units scaled by the table's shift
    /// count
    pub offset: u16,
    /// Length of the content, in the same scaled units
    pub length: u16,
    pub flags: u16,
    /// Integer id when the high bit is set, else an offset to a
    /// length-prefixed name relative to the resource-table origin
    pub id: u16,
    pub reserved: u32,
    /// Resolved name for named resources
    pub name: Option<String>,
    /// Raw content; `None` unless resource data loading was requested
    pub data: Option<&'a [u8]>,
}

impl<'a> Resource<'a> {
    /// The integer id, when the resource is integer-keyed.
    pub fn integer_id(&self) -> Option<u16> {
        if self.id & RESOURCE_ID_INTEGER != 0 {
            Some(self.id & !RESOURCE_ID_INTEGER)
        } else {
            None
        }
    }

    pub fn is_moveable(&self) -> bool {
        self.flags & RESOURCE_FLAG_MOVEABLE != 0
    }
    pub fn is_pure(&self) -> bool {
        self.flags & RESOURCE_FLAG_PURE != 0
    }
    pub fn is_preload(&self) -> bool {
        self.flags & RESOURCE_FLAG_PRELOAD != 0
    }

    /// Byte range of the content within the file.
    pub fn file_range(&self, shift_count: u16) -> (usize, usize) {
        let start = (self.offset as usize) << shift_count;
        let len = (self.length as usize) << shift_count;
        (start, start + len)
    }
}

/// All resources of one type.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ResourceBucket<'a> {
    /// Integer type id when the high bit is set, else a name offset
    pub type_id: u16,
    pub reserved: u32,
    /// Resolved name for custom (named) resource types
    pub type_name: Option<String>,
    pub resources: Vec<Resource<'a>>,
}

impl ResourceBucket<'_> {
    /// The integer type id, when the bucket is integer-keyed.
    pub fn integer_type(&self) -> Option<u16> {
        if self.type_id & RESOURCE_ID_INTEGER != 0 {
            Some(self.type_id & !RESOURCE_ID_INTEGER)
        } else {
            None
        }
    }
}

/// The decoded resource table: the shift count and one bucket per type.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ResourceTable<'a> {
    pub shift_count: u16,
    pub buckets: Vec<ResourceBucket<'a>>,
}

fn read_pascal_string(bytes: &[u8], offset: usize) -> error::Result<String> {
    let offset = &mut { offset };
    let len = bytes
        .gread::<u8>(offset)
        .map_err(Error::truncated_at(*offset))? as usize;
    let name = bytes
        .get(*offset..*offset + len)
        .ok_or(Error::Truncated { offset: *offset })?;
    Ok(String::from_utf8_lossy(name).into_owned())
}

impl<'a> ResourceTable<'a> {
    /// Parses the resource table at file position `base`, optionally loading
    /// each resource's content.
    pub fn parse(bytes: &'a [u8], base: usize, load_data: bool) -> error::Result<Self> {
        let offset = &mut { base };
        let shift_count = bytes
            .gread_with::<u16>(offset, scroll::LE)
            .map_err(Error::truncated_at(*offset))?;

        let mut buckets = Vec::new();
        loop {
            let type_id = bytes
                .gread_with::<u16>(offset, scroll::LE)
                .map_err(Error::truncated_at(*offset))?;
            if type_id == 0 {
                break;
            }
            let count = bytes
                .gread_with::<u16>(offset, scroll::LE)
                .map_err(Error::truncated_at(*offset))?;
            let reserved = bytes
                .gread_with::<u32>(offset, scroll::LE)
                .map_err(Error::truncated_at(*offset))?;
            let mut bucket = ResourceBucket {
                type_id,
                reserved,
                type_name: None,
                resources: Vec::with_capacity(count as usize),
            };
            for _ in 0..count {
                let mut resource = Resource::default();
                resource.offset = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
                resource.length = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
                resource.flags = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
                resource.id = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
                resource.reserved = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
                bucket.resources.push(resource);
            }
            buckets.push(bucket);
        }

        // the type/resource records are in; go back for names and content
        for bucket in buckets.iter_mut() {
            if bucket.type_id & RESOURCE_ID_INTEGER == 0 {
                let name_pos = base + (bucket.type_id & !RESOURCE_ID_INTEGER) as usize;
                bucket.type_name = Some(read_pascal_string(bytes, name_pos)?);
            }
            for resource in bucket.resources.iter_mut() {
                if resource.id & RESOURCE_ID_INTEGER == 0 {
                    let name_pos = base + (resource.id & !RESOURCE_ID_INTEGER) as usize;
                    resource.name = Some(read_pascal_string(bytes, name_pos)?);
                }
                if load_data && resource.length != 0 {
                    let (start, end) = resource.file_range(shift_count);
                    debug!("resource {:#x} content at [{:#x}..{:#x})", resource.id, start, end);
                    resource.data = Some(
                        bytes
                            .get(start..end)
                            .ok_or(Error::Truncated { offset: start })?,
                    );
                }
            }
        }

        Ok(ResourceTable { shift_count, buckets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&4u16.to_le_bytes()); // shift count
        // one integer-typed bucket (ICON) with one named resource
        bytes.extend_from_slice(&0x8003u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0x0200u16.to_le_bytes()); // offset
        bytes.extend_from_slice(&0x0010u16.to_le_bytes()); // length
        bytes.extend_from_slice(&RESOURCE_FLAG_PRELOAD.to_le_bytes());
        bytes.extend_from_slice(&24u16.to_le_bytes()); // name offset, below
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes()); // table terminator
        assert_eq!(bytes.len(), 24);
        bytes.extend_from_slice(b"\x04FROB");
        bytes
    }

    #[test]
    fn reads_shift_count_and_buckets() {
        let bytes = sample_table();
        let table = ResourceTable::parse(&bytes, 0, false).unwrap();
        assert_eq!(table.shift_count, 4);
        assert_eq!(table.buckets.len(), 1);
        let bucket = &table.buckets[0];
        assert_eq!(bucket.integer_type(), Some(3));
        assert_eq!(resource_type_name(bucket.type_id), Some("ICON"));
        let resource = &bucket.resources[0];
        assert_eq!(resource.name.as_deref(), Some("FROB"));
        assert_eq!(resource.integer_id(), None);
        assert!(resource.is_preload());
    }

    #[test]
    fn shift_count_scales_content_range() {
        let bytes = sample_table();
        let table = ResourceTable::parse(&bytes, 0, false).unwrap();
        let resource = &table.buckets[0].resources[0];
        assert_eq!(resource.file_range(table.shift_count), (0x2000, 0x2100));
    }

    #[test]
    fn content_loading_checks_bounds() {
        let bytes = sample_table();
        // content range [0x2000, 0x2100) is far past the end of the table
        assert_eq!(
            ResourceTable::parse(&bytes, 0, true),
            Err(Error::Truncated { offset: 0x2000 })
        );
    }
}
