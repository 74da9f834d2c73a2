//! Options controlling how deep a load descends into an executable.
//!
//! Headers are always decoded; each flag opts in to one class of raw data or
//! CLI substructure. When a flag is off the corresponding field of the
//! decoded image is `None`, not empty.

use bitflags::bitflags;

bitflags! {
    /// A bitmask of load options accepted by [`crate::ExeImage::parse_with_opts`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LoadOptions: u32 {
        /// Load the MZ relocation pointer table.
        const MZ_RELOCATION_DATA = 0x0001;
        /// Load raw data for NE segments.
        const SEGMENT_DATA       = 0x0002;
        /// Load raw payload bytes for NE resources (resolved via the
        /// resource shift count).
        const RESOURCE_DATA      = 0x0004;
        /// Load raw data for PE sections.
        const SECTION_DATA       = 0x0008;
        /// Parse the CLI metadata root and stream directory.
        const CLI_METADATA       = 0x0010;
        /// Also slice the heap streams out of the metadata region.
        const CLI_METADATA_STREAMS = 0x0020;
        /// Also decode the `#~` tables stream into typed rows.
        const CLI_METADATA_TABLES  = 0x0040;
        /// Everything above.
        const ALL = Self::MZ_RELOCATION_DATA.bits()
            | Self::SEGMENT_DATA.bits()
            | Self::RESOURCE_DATA.bits()
            | Self::SECTION_DATA.bits()
            | Self::CLI_METADATA.bits()
            | Self::CLI_METADATA_STREAMS.bits()
            | Self::CLI_METADATA_TABLES.bits();
    }
}

impl Default for LoadOptions {
    /// Headers only.
    fn default() -> Self {
        LoadOptions::empty()
    }
}
