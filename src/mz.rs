//! The old MS-DOS `MZ` executable header.
//!
//! Every executable in the family begins with this header; for NE and PE
//! images only [`MzHeader::new_header_offset`] still matters, but the whole
//! record is preserved for inspection of DOS-era binaries.

use log::debug;
use scroll::Pread;

use crate::error::{self, Error};
use crate::options::LoadOptions;

/// `MZ`, little endian
pub const MZ_MAGIC: u16 = 0x5a4d;
/// Value of `relocation_table_pos` that marks a modern header with the
/// reserved words and a new-header offset after the mandatory 28 bytes
pub const MODERN_RELOCATION_TABLE_POS: u16 = 0x40;

/// The 64-byte DOS header.
///
/// The final two fields only carry data when `relocation_table_pos == 0x40`;
/// genuinely old executables end after `overlay` and get zeroes there.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct MzHeader {
    /// Magic number: 0x5A4D ("MZ")
    pub signature: u16,
    /// Bytes used on the last 512-byte page of the file
    pub bytes_on_last_page: u16,
    /// Number of 512-byte pages, whole and partial
    pub num_pages: u16,
    /// Number of entries in the relocation pointer table
    pub num_relocation_items: u16,
    /// Header size in 16-byte paragraphs
    pub header_size: u16,
    /// Minimum number of extra paragraphs required
    pub min_allocation: u16,
    /// Number of extra paragraphs requested
    pub requested_allocation: u16,
    /// Relocatable segment address for SS
    pub initial_ss: u16,
    /// Initial SP value
    pub initial_sp: u16,
    pub checksum: u16,
    /// Initial IP value
    pub initial_ip: u16,
    /// Relocatable segment address for CS
    pub initial_cs: u16,
    /// File-absolute offset of the relocation table
    pub relocation_table_pos: u16,
    /// Overlay number; zero is the main executable
    pub overlay: u16,
    pub reserved1: [u16; 4],
    pub oem_id: u16,
    pub oem_info: u16,
    pub reserved2: [u16; 10],
    /// File-absolute offset of the NE/LE/LX/PE header, or 0
    pub new_header_offset: u32,
}

/// An entry in the MZ relocation pointer table.
#[repr(C)]
#[derive(Debug, PartialEq, Copy, Clone, Default, Pread)]
pub struct MzRelocPointer {
    pub offset: u16,
    pub segment: u16,
}

impl MzHeader {
    pub fn parse(bytes: &[u8]) -> error::Result<Self> {
        let offset = &mut 0;
        let signature = bytes
            .gread_with::<u16>(offset, scroll::LE)
            .map_err(Error::truncated_at(0))?;
        if signature != MZ_MAGIC {
            return Err(Error::NotMz { offset: 0, signature });
        }

        let mut header = MzHeader {
            signature,
            ..Default::default()
        };
        header.bytes_on_last_page = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        header.num_pages = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        header.num_relocation_items = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        header.header_size = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        header.min_allocation = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        header.requested_allocation = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        header.initial_ss = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        header.initial_sp = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        header.checksum = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        header.initial_ip = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        header.initial_cs = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        header.relocation_table_pos = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        header.overlay = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;

        if header.relocation_table_pos == MODERN_RELOCATION_TABLE_POS {
            for word in header.reserved1.iter_mut() {
                *word = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
            }
            header.oem_id = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
            header.oem_info = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
            for word in header.reserved2.iter_mut() {
                *word = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
            }
            header.new_header_offset = bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(*offset))?;
        }
        // otherwise this is an OLD exe file and nothing after the mandatory
        // header is meaningful; the tail fields stay zero

        debug!("parsed MZ header, new header offset {:#x}", header.new_header_offset);
        Ok(header)
    }

    /// Reads the relocation pointer table this header points at.
    pub fn parse_relocations(&self, bytes: &[u8]) -> error::Result<Vec<MzRelocPointer>> {
        let offset = &mut (self.relocation_table_pos as usize);
        let count = self.num_relocation_items as usize;
        let mut relocations = Vec::with_capacity(count);
        for _ in 0..count {
            let reloc = bytes
                .gread_with::<MzRelocPointer>(offset, scroll::LE)
                .map_err(Error::truncated_at(*offset))?;
            relocations.push(reloc);
        }
        Ok(relocations)
    }
}

/// The decoded MZ portion of an executable: the header plus, when
/// [`LoadOptions::MZ_RELOCATION_DATA`] was given, the relocation table.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct MzImage {
    pub header: MzHeader,
    /// `None` unless relocation loading was requested
    pub relocations: Option<Vec<MzRelocPointer>>,
}

impl MzImage {
    pub fn parse(bytes: &[u8]) -> error::Result<Self> {
        Self::parse_with_opts(bytes, LoadOptions::default())
    }

    pub fn parse_with_opts(bytes: &[u8], opts: LoadOptions) -> error::Result<Self> {
        let header = MzHeader::parse(bytes)?;
        let relocations = if opts.contains(LoadOptions::MZ_RELOCATION_DATA) {
            Some(header.parse_relocations(bytes)?)
        } else {
            None
        };
        Ok(MzImage { header, relocations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_mz() -> Vec<u8> {
        let mut bytes = vec![0u8; 0x40];
        bytes[0] = b'M';
        bytes[1] = b'Z';
        bytes[0x18] = 0x40; // relocation_table_pos
        bytes
    }

    #[test]
    fn parses_pure_mz() {
        let bytes = minimal_mz();
        let header = MzHeader::parse(&bytes).unwrap();
        assert_eq!(header.signature, MZ_MAGIC);
        assert_eq!(header.relocation_table_pos, 0x40);
        assert_eq!(header.new_header_offset, 0);
    }

    #[test]
    fn old_exe_tail_is_zeroed() {
        let mut bytes = minimal_mz();
        bytes[0x18] = 0x1c; // relocation table right after the mandatory header
        bytes[0x3c] = 0x80; // garbage where e_lfanew would be
        let header = MzHeader::parse(&bytes).unwrap();
        assert_eq!(header.new_header_offset, 0);
        assert_eq!(header.reserved1, [0u16; 4]);
    }

    #[test]
    fn short_file_is_truncated() {
        let bytes = &minimal_mz()[..0x20];
        assert_eq!(
            MzHeader::parse(bytes),
            Err(Error::Truncated { offset: 0x20 })
        );
    }

    #[test]
    fn bad_signature_wins_over_truncation() {
        assert_eq!(
            MzHeader::parse(b"PK"),
            Err(Error::NotMz { offset: 0, signature: 0x4b50 })
        );
    }

    #[test]
    fn loads_relocations_on_request() {
        let mut bytes = minimal_mz();
        bytes[0x06] = 2; // num_relocation_items
        // relocation_table_pos is 0x40, right past the header
        bytes.extend_from_slice(&[0x10, 0x00, 0x20, 0x00, 0x30, 0x00, 0x40, 0x00]);
        let header = MzHeader::parse(&bytes).unwrap();
        let relocs = header.parse_relocations(&bytes).unwrap();
        assert_eq!(relocs.len(), 2);
        assert_eq!(relocs[0], MzRelocPointer { offset: 0x10, segment: 0x20 });
        assert_eq!(relocs[1], MzRelocPointer { offset: 0x30, segment: 0x40 });

        let image = MzImage::parse(&bytes).unwrap();
        assert!(image.relocations.is_none());
        let image = MzImage::parse_with_opts(&bytes, LoadOptions::MZ_RELOCATION_DATA).unwrap();
        assert_eq!(image.relocations.as_deref(), Some(&relocs[..]));
    }
}
