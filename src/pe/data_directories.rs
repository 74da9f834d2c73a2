//! The PE optional header's data directory array.

use scroll::Pread;

use crate::error::{self, Error};

#[repr(C)]
#[derive(Debug, PartialEq, Copy, Clone, Default, Pread)]
pub struct DataDirectory {
    pub virtual_address: u32,
    pub size: u32,
}

pub const SIZEOF_DATA_DIRECTORY: usize = 8;
/// The data directory array always occupies 16 slots; a larger
/// `number_of_rva_and_sizes` only adds dead entries.
pub const NUM_DATA_DIRECTORIES: usize = 16;

/// The fixed 16-slot directory; all-zero entries decode as `None`.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct DataDirectories {
    pub data_directories: [Option<DataDirectory>; NUM_DATA_DIRECTORIES],
}

macro_rules! data_directory_getters {
    ($($name:ident => $idx:literal;)*) => {
        $(
            #[inline]
            pub fn $name(&self) -> Option<&DataDirectory> {
                self.data_directories[$idx].as_ref()
            }
        )*
    };
}

impl DataDirectories {
    /// Reads `count` directory entries, keeping the canonical first 16.
    pub fn parse(bytes: &[u8], count: usize, offset: &mut usize) -> error::Result<Self> {
        let mut data_directories = [None; NUM_DATA_DIRECTORIES];
        for i in 0..count {
            let dd = bytes
                .gread_with::<DataDirectory>(offset, scroll::LE)
                .map_err(Error::truncated_at(*offset))?;
            if i < NUM_DATA_DIRECTORIES && (dd.virtual_address != 0 || dd.size != 0) {
                data_directories[i] = Some(dd);
            }
        }
        Ok(DataDirectories { data_directories })
    }

    data_directory_getters! {
        get_export_table            => 0;
        get_import_table            => 1;
        get_resource_table          => 2;
        get_exception_table         => 3;
        get_certificate_table       => 4;
        get_base_relocation_table   => 5;
        get_debug_table             => 6;
        get_architecture            => 7;
        get_global_ptr              => 8;
        get_tls_table               => 9;
        get_load_config_table       => 10;
        get_bound_import_table      => 11;
        get_import_address_table    => 12;
        get_delay_import_descriptor => 13;
        get_clr_runtime_header      => 14;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_entries_decode_as_none() {
        let mut bytes = vec![0u8; NUM_DATA_DIRECTORIES * SIZEOF_DATA_DIRECTORY];
        // slot 14 (CLR runtime header) non-zero
        bytes[14 * 8..14 * 8 + 4].copy_from_slice(&0x2000u32.to_le_bytes());
        bytes[14 * 8 + 4..14 * 8 + 8].copy_from_slice(&0x48u32.to_le_bytes());
        let offset = &mut 0;
        let dds = DataDirectories::parse(&bytes, NUM_DATA_DIRECTORIES, offset).unwrap();
        assert_eq!(*offset, bytes.len());
        assert!(dds.get_export_table().is_none());
        let clr = dds.get_clr_runtime_header().unwrap();
        assert_eq!(clr.virtual_address, 0x2000);
        assert_eq!(clr.size, 0x48);
    }

    #[test]
    fn short_directory_is_truncated() {
        let bytes = [0u8; 12];
        let offset = &mut 0;
        assert_eq!(
            DataDirectories::parse(&bytes, 2, offset),
            Err(Error::Truncated { offset: 8 })
        );
    }
}
