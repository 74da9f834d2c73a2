//! The CLI (.NET) portion of a managed PE image.

pub mod heaps;
pub mod index;
pub mod metadata;
pub mod rows;
pub mod tables;

use log::debug;
use scroll::Pread;

use super::data_directories::DataDirectory;
use super::section_table::SectionTable;
use super::utils;
use crate::error::{self, Error};
use crate::options::LoadOptions;

pub use heaps::{BlobHeap, Guid, GuidHeap, StringsHeap, UserString, UserStringsHeap};
pub use index::{CodedIndex, Token};
pub use metadata::{CliMetadata, MetadataHeader, StreamHeader};
pub use rows::{Rows, TableId};
pub use tables::{CliTables, TablesHeader};

/// The assembly contains only IL code
pub const COMIMAGE_FLAGS_ILONLY: u32 = 0x0000_0001;
/// The assembly requires a 32-bit environment
pub const COMIMAGE_FLAGS_32BITREQUIRED: u32 = 0x0000_0002;
/// The assembly is a library, not a standalone executable
pub const COMIMAGE_FLAGS_IL_LIBRARY: u32 = 0x0000_0004;
/// The assembly is signed with a strong name
pub const COMIMAGE_FLAGS_STRONGNAMESIGNED: u32 = 0x0000_0008;
/// The entry point is a native method
pub const COMIMAGE_FLAGS_NATIVE_ENTRYPOINT: u32 = 0x0000_0010;
/// Debug information is tracked for the assembly
pub const COMIMAGE_FLAGS_TRACKDEBUGDATA: u32 = 0x0001_0000;
/// The assembly prefers a 32-bit environment when available
pub const COMIMAGE_FLAGS_32BITPREFERRED: u32 = 0x0002_0000;

pub const SIZEOF_CLI_HEADER: usize = 72;

/// The CLI header pointed at by the CLR runtime data directory.
#[repr(C)]
#[derive(Debug, PartialEq, Copy, Clone, Default, Pread)]
pub struct CliHeader {
    /// The size of this structure in bytes
    pub size: u32,
    pub major_runtime_version: u16,
    pub minor_runtime_version: u16,
    /// Location of the metadata root
    pub metadata: DataDirectory,
    pub flags: u32,
    /// A MethodDef token, or an RVA when
    /// [`COMIMAGE_FLAGS_NATIVE_ENTRYPOINT`] is set
    pub entry_point_token: u32,
    pub resources: DataDirectory,
    pub strong_name_signature: DataDirectory,
    pub code_manager_table: DataDirectory,
    pub vtable_fixups: DataDirectory,
    pub export_address_table_jumps: DataDirectory,
    pub managed_native_header: DataDirectory,
}

impl CliHeader {
    pub fn is_il_only(&self) -> bool {
        self.flags & COMIMAGE_FLAGS_ILONLY != 0
    }
    pub fn is_32bit_required(&self) -> bool {
        self.flags & COMIMAGE_FLAGS_32BITREQUIRED != 0
    }
    pub fn is_strong_name_signed(&self) -> bool {
        self.flags & COMIMAGE_FLAGS_STRONGNAMESIGNED != 0
    }
    pub fn has_native_entrypoint(&self) -> bool {
        self.flags & COMIMAGE_FLAGS_NATIVE_ENTRYPOINT != 0
    }
    pub fn is_32bit_preferred(&self) -> bool {
        self.flags & COMIMAGE_FLAGS_32BITPREFERRED != 0
    }
}

/// The CLI portion: the header plus, per load options, the decoded metadata.
#[derive(Debug, PartialEq, Clone)]
pub struct Cli<'a> {
    /// File position of the CLI header
    pub header_position: usize,
    pub header: CliHeader,
    /// `None` unless CLI metadata loading was requested
    pub metadata: Option<CliMetadata<'a>>,
}

impl<'a> Cli<'a> {
    /// Parses the CLI header behind the CLR runtime data directory, and the
    /// metadata behind it when requested.
    pub fn parse_with_opts(
        bytes: &'a [u8],
        dd: &DataDirectory,
        sections: &[SectionTable],
        opts: LoadOptions,
    ) -> error::Result<Self> {
        let rva = dd.virtual_address;
        let header_position = utils::find_offset(rva, sections)
            .ok_or(Error::UnresolvedRva { offset: 0, rva })?;
        let header = bytes
            .pread_with::<CliHeader>(header_position, scroll::LE)
            .map_err(Error::truncated_at(header_position))?;
        debug!("CLI header at {:#x}: {:?}", header_position, header);

        let metadata = if opts.contains(LoadOptions::CLI_METADATA)
            && header.metadata.virtual_address != 0
        {
            let rva = header.metadata.virtual_address;
            let metadata_position = utils::find_offset(rva, sections)
                .ok_or(Error::UnresolvedRva { offset: header_position, rva })?;
            Some(CliMetadata::parse_with_opts(bytes, metadata_position, opts)?)
        } else {
            None
        };

        Ok(Cli { header_position, header, metadata })
    }

    pub fn metadata(&self) -> Option<&CliMetadata<'a>> {
        self.metadata.as_ref()
    }
}
