//! A PE32 and PE32+ parser

pub mod cli;
pub mod data_directories;
pub mod header;
pub mod optional_header;
pub mod section_table;
pub mod utils;

use log::debug;

use crate::error::{self, Error};
use crate::options::LoadOptions;

pub use data_directories::{DataDirectories, DataDirectory};
pub use header::PeFileHeader;
pub use optional_header::OptionalHeader;
pub use section_table::SectionTable;

/// An analyzed PE32/PE32+ image.
#[derive(Debug)]
pub struct PeImage<'a> {
    /// File position of the PE signature
    pub header_position: usize,
    pub header: PeFileHeader,
    /// Absent when `size_of_optional_header` is zero (object files)
    pub optional_header: Option<OptionalHeader>,
    pub data_directories: DataDirectories,
    pub sections: Vec<SectionTable<'a>>,
    /// The CLI (.NET) portion, when the CLR runtime data directory points at
    /// one
    pub cli: Option<cli::Cli<'a>>,
}

impl<'a> PeImage<'a> {
    /// Parses the PE portion of an executable whose signature lives at file
    /// position `header_position`.
    pub fn parse_with_opts(
        bytes: &'a [u8],
        header_position: usize,
        opts: LoadOptions,
    ) -> error::Result<Self> {
        let header = header::PeFileHeader::parse(bytes, header_position)?;
        debug!("parsed PE file header at {:#x}: {:?}", header_position, header);

        let opt_header_start = header_position + header::SIZEOF_PE_FILE_HEADER;
        let mut optional_header = None;
        let mut data_directories = DataDirectories::default();
        if header.size_of_optional_header > 0 {
            let offset = &mut { opt_header_start };
            let parsed = OptionalHeader::parse(bytes, offset)?;
            data_directories = DataDirectories::parse(
                bytes,
                parsed.number_of_rva_and_sizes() as usize,
                offset,
            )?;
            optional_header = Some(parsed);
        }

        // the section table follows the full declared optional header
        let offset = &mut (opt_header_start + header.size_of_optional_header as usize);
        let mut sections = Vec::with_capacity(header.number_of_sections as usize);
        for i in 0..header.number_of_sections {
            let mut section = SectionTable::parse(bytes, offset)?;
            if opts.contains(LoadOptions::SECTION_DATA) && section.size_of_raw_data != 0 {
                section.load_data(bytes)?;
            }
            debug!("({}) {:?}", i, section.name());
            sections.push(section);
        }

        let cli = match data_directories.get_clr_runtime_header() {
            Some(dd) if dd.virtual_address != 0 => {
                Some(cli::Cli::parse_with_opts(bytes, dd, &sections, opts)?)
            }
            _ => None,
        };

        Ok(PeImage {
            header_position,
            header,
            optional_header,
            data_directories,
            sections,
            cli,
        })
    }

    /// Translates an RVA to a file offset through the section table.
    pub fn rva_to_file_offset(&self, rva: u32) -> Option<u64> {
        utils::find_offset(rva, &self.sections).map(|offset| offset as u64)
    }

    pub fn cli(&self) -> Option<&cli::Cli<'a>> {
        self.cli.as_ref()
    }

    pub fn is_64(&self) -> bool {
        matches!(self.optional_header, Some(OptionalHeader::Pe64(_)))
    }
}
