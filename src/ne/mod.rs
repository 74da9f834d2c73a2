//! A 16-bit segmented "new executable" (NE) parser

pub mod entry;
pub mod header;
pub mod resource;

use log::debug;
use scroll::Pread;

use crate::error::{self, Error};
use crate::options::LoadOptions;

pub use entry::{EntryBundle, EntryBundles};
pub use header::NeHeader;
pub use resource::{Resource, ResourceBucket, ResourceTable};

/// Segment flag: the segment is a data segment (else code)
pub const SEGMENT_FLAG_DATA: u16 = 0x0001;
/// Segment flag: the segment is moveable
pub const SEGMENT_FLAG_MOVEABLE: u16 = 0x0010;
/// Segment flag: the segment is preloaded
pub const SEGMENT_FLAG_PRELOAD: u16 = 0x0040;
/// Segment flag: the segment has relocation info
pub const SEGMENT_FLAG_RELOC_INFO: u16 = 0x0100;
/// Segment flag mask: discard priority
pub const SEGMENT_FLAG_DISCARD: u16 = 0xf000;

/// An entry in the segment table.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct SegmentEntry<'a> {
    /// Logical-sector offset to the segment data, in units of the header's
    /// alignment shift count; zero means no file data
    pub sector: u16,
    /// Length of the segment in the file; zero with a non-zero sector means
    /// 64K
    pub length: u16,
    pub flags: u16,
    /// Minimum allocation size; zero means 64K
    pub min_alloc: u16,
    /// Raw segment bytes; `None` unless segment data loading was requested
    pub data: Option<&'a [u8]>,
}

impl SegmentEntry<'_> {
    pub fn is_data(&self) -> bool {
        self.flags & SEGMENT_FLAG_DATA != 0
    }
    pub fn is_moveable(&self) -> bool {
        self.flags & SEGMENT_FLAG_MOVEABLE != 0
    }
    pub fn is_preload(&self) -> bool {
        self.flags & SEGMENT_FLAG_PRELOAD != 0
    }
    pub fn has_reloc_info(&self) -> bool {
        self.flags & SEGMENT_FLAG_RELOC_INFO != 0
    }

    /// Byte length of the segment data in the file.
    pub fn file_length(&self) -> usize {
        if self.length == 0 && self.sector != 0 {
            0x10000
        } else {
            self.length as usize
        }
    }
}

/// A name table entry; the resident and non-resident tables pair each name
/// with an entry-table ordinal.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct NeName {
    pub name: String,
    pub ordinal: u16,
}

/// An analyzed NE image.
///
/// All tables are decoded eagerly; only raw segment and resource content is
/// gated behind load options.
#[derive(Debug, PartialEq, Clone)]
pub struct NeImage<'a> {
    /// File position of the NE header; all header-relative offsets resolve
    /// against this
    pub header_position: usize,
    pub header: NeHeader,
    /// The entry table, verbatim; see [`NeImage::entry_bundles`]
    pub entry_table: &'a [u8],
    pub segments: Vec<SegmentEntry<'a>>,
    pub resources: ResourceTable<'a>,
    pub resident_names: Vec<NeName>,
    pub nonresident_names: Vec<NeName>,
    pub imported_names: Vec<String>,
    pub module_names: Vec<String>,
}

fn read_name_table(
    bytes: &[u8],
    base: usize,
    with_ordinals: bool,
) -> error::Result<(Vec<NeName>, Vec<String>)> {
    let offset = &mut { base };
    let mut names = Vec::new();
    let mut strings = Vec::new();
    loop {
        let len = bytes
            .gread::<u8>(offset)
            .map_err(Error::truncated_at(*offset))? as usize;
        if len == 0 {
            break;
        }
        let raw = bytes
            .get(*offset..*offset + len)
            .ok_or(Error::Truncated { offset: *offset })?;
        *offset += len;
        let name = String::from_utf8_lossy(raw).into_owned();
        if with_ordinals {
            let ordinal = bytes
                .gread_with::<u16>(offset, scroll::LE)
                .map_err(Error::truncated_at(*offset))?;
            names.push(NeName { name, ordinal });
        } else {
            strings.push(name);
        }
    }
    Ok((names, strings))
}

impl<'a> NeImage<'a> {
    /// Parses the NE portion of an executable whose header lives at file
    /// position `header_position`.
    pub fn parse_with_opts(
        bytes: &'a [u8],
        header_position: usize,
        opts: LoadOptions,
    ) -> error::Result<Self> {
        let header = NeHeader::parse(bytes, header_position)?;
        debug!("parsed NE header at {:#x}: {:?}", header_position, header);

        let entry_table = if header.entry_table_size != 0 {
            let start = header_position + header.entry_table_offset as usize;
            let end = start + header.entry_table_size as usize;
            bytes
                .get(start..end)
                .ok_or(Error::Truncated { offset: start })?
        } else {
            &[]
        };

        let segments = Self::parse_segments(bytes, header_position, &header, opts)?;

        // The resource count in the header is often zero even when resources
        // exist; coincident table offsets are the reliable emptiness check.
        let resources = if header.resource_table_offset != header.res_name_table_offset {
            ResourceTable::parse(
                bytes,
                header_position + header.resource_table_offset as usize,
                opts.contains(LoadOptions::RESOURCE_DATA),
            )?
        } else {
            ResourceTable::default()
        };

        let (resident_names, _) = read_name_table(
            bytes,
            header_position + header.res_name_table_offset as usize,
            true,
        )?;
        let (nonresident_names, _) =
            read_name_table(bytes, header.non_res_name_table_pos as usize, true)?;
        let (_, imported_names) = read_name_table(
            bytes,
            header_position + header.import_table_offset as usize,
            false,
        )?;
        let module_names = Self::parse_module_names(bytes, header_position, &header)?;

        Ok(NeImage {
            header_position,
            header,
            entry_table,
            segments,
            resources,
            resident_names,
            nonresident_names,
            imported_names,
            module_names,
        })
    }

    fn parse_segments(
        bytes: &'a [u8],
        header_position: usize,
        header: &NeHeader,
        opts: LoadOptions,
    ) -> error::Result<Vec<SegmentEntry<'a>>> {
        let offset = &mut (header_position + header.segment_table_offset as usize);
        let mut segments = Vec::with_capacity(header.num_segment_entries as usize);
        for _ in 0..header.num_segment_entries {
            let mut segment = SegmentEntry {
                sector: bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?,
                length: bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?,
                flags: bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?,
                min_alloc: bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?,
                data: None,
            };
            if opts.contains(LoadOptions::SEGMENT_DATA) && segment.sector != 0 {
                let start = (segment.sector as usize) << header.alignment_shift_count;
                let end = start + segment.file_length();
                segment.data = Some(
                    bytes
                        .get(start..end)
                        .ok_or(Error::Truncated { offset: start })?,
                );
            }
            segments.push(segment);
        }
        Ok(segments)
    }

    fn parse_module_names(
        bytes: &[u8],
        header_position: usize,
        header: &NeHeader,
    ) -> error::Result<Vec<String>> {
        let offset = &mut (header_position + header.module_table_offset as usize);
        let import_base = header_position + header.import_table_offset as usize;
        let mut names = Vec::with_capacity(header.num_module_entries as usize);
        for _ in 0..header.num_module_entries {
            let name_offset = bytes
                .gread_with::<u16>(offset, scroll::LE)
                .map_err(Error::truncated_at(*offset))?;
            let name_pos = &mut (import_base + name_offset as usize);
            let len = bytes
                .gread::<u8>(name_pos)
                .map_err(Error::truncated_at(*name_pos))? as usize;
            let raw = bytes
                .get(*name_pos..*name_pos + len)
                .ok_or(Error::Truncated { offset: *name_pos })?;
            names.push(String::from_utf8_lossy(raw).into_owned());
        }
        Ok(names)
    }

    /// Iterator over the decoded entry-table bundles.
    pub fn entry_bundles(&self) -> EntryBundles<'a> {
        EntryBundles::new(
            self.entry_table,
            self.header_position + self.header.entry_table_offset as usize,
        )
    }

    /// The module name: the first resident name table entry, if any.
    pub fn module_name(&self) -> Option<&str> {
        self.resident_names.first().map(|n| n.name.as_str())
    }

    /// The module description: the first non-resident name table entry, if
    /// any.
    pub fn module_description(&self) -> Option<&str> {
        self.nonresident_names.first().map(|n| n.name.as_str())
    }
}
