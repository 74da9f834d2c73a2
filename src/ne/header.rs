//! The 64-byte NE header.
//!
//! All table offsets named here are relative to the NE header origin except
//! [`NeHeader::non_res_name_table_pos`], which is file-absolute.

use scroll::Pread;

use crate::error::{self, Error};

/// `NE`, little endian
pub const NE_MAGIC: u16 = 0x454e;

/// Size of the NE header in bytes
pub const SIZEOF_NE_HEADER: usize = 64;

/// `executable_type` value for OS/2
pub const NE_ETYPE_OS2: u8 = 0x01;
/// `executable_type` value for 16-bit Windows
pub const NE_ETYPE_WINDOWS: u8 = 0x02;
/// `executable_type` value for European MS-DOS 4.x
pub const NE_ETYPE_EURO_DOS4: u8 = 0x03;
/// `executable_type` value for Windows/386
pub const NE_ETYPE_WINDOWS386: u8 = 0x04;
/// `executable_type` value for Borland Operating System Services
pub const NE_ETYPE_BOSS: u8 = 0x05;
/// `executable_type` value for PharLap 286|DOS-Extender, OS/2
pub const NE_ETYPE_PHARLAP_OS2: u8 = 0x81;
/// `executable_type` value for PharLap 286|DOS-Extender, Windows
pub const NE_ETYPE_PHARLAP_WIN: u8 = 0x82;

/// Convert an `executable_type` byte to its str representation
pub fn executable_type_to_str(etype: u8) -> &'static str {
    match etype {
        NE_ETYPE_OS2 => "OS/2",
        NE_ETYPE_WINDOWS => "Windows",
        NE_ETYPE_EURO_DOS4 => "European MS-DOS 4.x",
        NE_ETYPE_WINDOWS386 => "Windows/386",
        NE_ETYPE_BOSS => "BOSS",
        NE_ETYPE_PHARLAP_OS2 => "PharLap 286|DOS-Extender, OS/2",
        NE_ETYPE_PHARLAP_WIN => "PharLap 286|DOS-Extender, Windows",
        _ => "UNKNOWN",
    }
}

#[repr(C)]
#[derive(Debug, PartialEq, Copy, Clone, Default, Pread)]
pub struct NeHeader {
    /// Magic number: 0x454E ("NE")
    pub signature: u16,
    pub linker_version: u8,
    pub linker_revision: u8,
    /// Offset of the entry table, relative to the NE header
    pub entry_table_offset: u16,
    /// Size of the entry table in bytes
    pub entry_table_size: u16,
    pub checksum: u32,
    pub flags: u16,
    /// Segment number of the automatic data segment
    pub auto_data_segment: u16,
    /// Initial dynamic heap size in bytes; 0 for no heap
    pub initial_heap: u16,
    /// Initial stack size in bytes
    pub initial_stack: u16,
    pub initial_ip: u16,
    pub initial_cs: u16,
    pub initial_sp: u16,
    pub initial_ss: u16,
    pub num_segment_entries: u16,
    /// Number of entries in the module reference table
    pub num_module_entries: u16,
    /// Size of the non-resident name table in bytes
    pub non_res_name_table_size: u16,
    pub segment_table_offset: u16,
    pub resource_table_offset: u16,
    pub res_name_table_offset: u16,
    pub module_table_offset: u16,
    pub import_table_offset: u16,
    /// File-absolute position of the non-resident name table
    pub non_res_name_table_pos: u32,
    /// Number of movable entries in the entry table
    pub num_movable_entries: u16,
    /// log2 of the segment sector size (default 9); governs segments, not
    /// resources
    pub alignment_shift_count: u16,
    /// Often zero even when resources exist; the resource table itself
    /// carries a terminator
    pub num_resource_entries: u16,
    /// Target environment, see the `NE_ETYPE_*` constants
    pub executable_type: u8,
    /// Additional flags, for OS/2
    pub additional_flags: u8,
    /// Offset to return thunks or start of gangload area
    pub gangload_offset: u16,
    /// Offset to segment reference thunks or length of gangload area
    pub gangload_size: u16,
    pub min_code_swap_size: u16,
    /// Expected Windows version number, minor byte first
    pub expected_win_version: u16,
}

impl NeHeader {
    pub fn parse(bytes: &[u8], offset: usize) -> error::Result<Self> {
        let signature = bytes
            .pread_with::<u16>(offset, scroll::LE)
            .map_err(Error::truncated_at(offset))?;
        if signature != NE_MAGIC {
            return Err(Error::NotNe { offset, signature });
        }
        bytes
            .pread_with(offset, scroll::LE)
            .map_err(Error::truncated_at(offset))
    }
}
