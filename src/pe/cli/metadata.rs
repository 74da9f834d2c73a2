//! The CLI metadata root: version string, stream directory, heap lookup.

use std::borrow::Cow;

use log::debug;
use scroll::Pread;

use super::heaps::{
    BlobHeap, BlobsIter, Guid, GuidHeap, StringsHeap, StringsIter, UserString, UserStringsHeap,
    UserStringsIter,
};
use super::index::CodedIndex;
use super::rows::TableId;
use super::tables::CliTables;
use crate::error::{self, Error};
use crate::options::LoadOptions;

/// "BSJB", the metadata root signature
pub const METADATA_SIGNATURE: u32 = 0x424a_5342;

/// Longest allowed stream-name payload
pub const MAX_STREAM_NAME_LEN: usize = 32;

#[inline]
fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// The fixed part of the metadata root plus its version string.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct MetadataHeader<'a> {
    /// "BSJB" when well formed; see [`MetadataHeader::is_valid`]
    pub signature: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub reserved: u32,
    /// Byte count of the version string, NUL padding included
    pub version_length: u32,
    /// The raw version bytes, NUL padding included
    pub version: &'a [u8],
    pub flags: u16,
    pub stream_count: u16,
}

impl<'a> MetadataHeader<'a> {
    pub fn is_valid(&self) -> bool {
        self.signature == METADATA_SIGNATURE
    }

    /// The version string with its NUL padding stripped.
    pub fn version_string(&self) -> Cow<'a, str> {
        let end = self
            .version
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.version.len());
        String::from_utf8_lossy(&self.version[..end])
    }
}

/// An entry of the stream directory. `offset` is relative to the metadata
/// root.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct StreamHeader<'a> {
    pub offset: u32,
    pub size: u32,
    /// The name payload, NUL terminator and padding stripped; at most 32
    /// bytes
    pub name: &'a [u8],
}

impl<'a> StreamHeader<'a> {
    pub fn parse(bytes: &'a [u8], offset: &mut usize) -> error::Result<Self> {
        let stream_offset = bytes
            .gread_with::<u32>(offset, scroll::LE)
            .map_err(Error::truncated_at(*offset))?;
        let size = bytes
            .gread_with::<u32>(offset, scroll::LE)
            .map_err(Error::truncated_at(*offset))?;
        let name_start = *offset;
        let tail = bytes
            .get(name_start..)
            .ok_or(Error::Truncated { offset: name_start })?;
        let name_len = match tail
            .iter()
            .take(MAX_STREAM_NAME_LEN + 1)
            .position(|&b| b == 0)
        {
            Some(len) => len,
            None if tail.len() <= MAX_STREAM_NAME_LEN => {
                return Err(Error::Truncated { offset: name_start + tail.len() });
            }
            None => return Err(Error::MalformedStreamName { offset: name_start }),
        };
        let name = &tail[..name_len];
        // the terminator plus padding bring the name field to a 4-byte
        // multiple
        *offset = name_start + align_up(name_len + 1, 4);
        Ok(StreamHeader { offset: stream_offset, size, name })
    }

    pub fn name_string(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.name)
    }
}

/// The decoded CLI metadata: root header, stream directory, and (per load
/// options) the raw streams and typed tables.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct CliMetadata<'a> {
    /// File position of the metadata root
    pub metadata_position: usize,
    pub header: MetadataHeader<'a>,
    pub stream_headers: Vec<StreamHeader<'a>>,
    /// Raw stream bytes, parallel to `stream_headers`; `None` unless stream
    /// loading was requested
    pub streams: Option<Vec<&'a [u8]>>,
    /// Decoded `#~` stream; `None` unless table loading was requested
    pub tables: Option<CliTables>,
}

impl<'a> CliMetadata<'a> {
    /// Parses the metadata root at file position `metadata_position`.
    pub fn parse_with_opts(
        bytes: &'a [u8],
        metadata_position: usize,
        opts: LoadOptions,
    ) -> error::Result<Self> {
        let offset = &mut { metadata_position };
        let signature = bytes
            .gread_with::<u32>(offset, scroll::LE)
            .map_err(Error::truncated_at(*offset))?;
        let major_version = bytes
            .gread_with::<u16>(offset, scroll::LE)
            .map_err(Error::truncated_at(*offset))?;
        let minor_version = bytes
            .gread_with::<u16>(offset, scroll::LE)
            .map_err(Error::truncated_at(*offset))?;
        let reserved = bytes
            .gread_with::<u32>(offset, scroll::LE)
            .map_err(Error::truncated_at(*offset))?;
        let version_length = bytes
            .gread_with::<u32>(offset, scroll::LE)
            .map_err(Error::truncated_at(*offset))?;
        let version = bytes
            .get(*offset..*offset + version_length as usize)
            .ok_or(Error::Truncated { offset: *offset })?;
        *offset += align_up(version_length as usize, 4);
        let flags = bytes
            .gread_with::<u16>(offset, scroll::LE)
            .map_err(Error::truncated_at(*offset))?;
        let stream_count = bytes
            .gread_with::<u16>(offset, scroll::LE)
            .map_err(Error::truncated_at(*offset))?;
        let header = MetadataHeader {
            signature,
            major_version,
            minor_version,
            reserved,
            version_length,
            version,
            flags,
            stream_count,
        };
        debug!(
            "metadata root at {:#x}: version {:?}, {} streams",
            metadata_position,
            header.version_string(),
            stream_count
        );

        let mut stream_headers = Vec::with_capacity(stream_count as usize);
        for _ in 0..stream_count {
            stream_headers.push(StreamHeader::parse(bytes, offset)?);
        }

        let streams = if opts.contains(LoadOptions::CLI_METADATA_STREAMS) {
            let mut streams = Vec::with_capacity(stream_headers.len());
            for sh in &stream_headers {
                let start = metadata_position + sh.offset as usize;
                let end = start + sh.size as usize;
                streams.push(
                    bytes
                        .get(start..end)
                        .ok_or(Error::Truncated { offset: start })?,
                );
            }
            Some(streams)
        } else {
            None
        };

        let mut metadata = CliMetadata {
            metadata_position,
            header,
            stream_headers,
            streams,
            tables: None,
        };

        if opts.contains(LoadOptions::CLI_METADATA_TABLES) {
            if let Some(tables_bytes) = metadata.stream(b"#~") {
                let base = metadata.stream_position(b"#~").unwrap_or(0);
                metadata.tables = Some(CliTables::parse(tables_bytes, base)?);
            }
        }

        Ok(metadata)
    }

    /// The raw bytes of the stream called `name`, when streams were loaded.
    pub fn stream(&self, name: &[u8]) -> Option<&'a [u8]> {
        let streams = self.streams.as_ref()?;
        self.stream_headers
            .iter()
            .position(|sh| sh.name == name)
            .and_then(|i| streams.get(i).copied())
    }

    fn stream_position(&self, name: &[u8]) -> Option<usize> {
        self.stream_headers
            .iter()
            .find(|sh| sh.name == name)
            .map(|sh| self.metadata_position + sh.offset as usize)
    }

    /// The `#Strings` heap; empty when absent or not loaded.
    pub fn strings_heap(&self) -> StringsHeap<'a> {
        StringsHeap { bytes: self.stream(b"#Strings").unwrap_or_default() }
    }

    /// The `#US` heap; empty when absent or not loaded.
    pub fn user_strings_heap(&self) -> UserStringsHeap<'a> {
        UserStringsHeap { bytes: self.stream(b"#US").unwrap_or_default() }
    }

    /// The `#Blob` heap; empty when absent or not loaded.
    pub fn blob_heap(&self) -> BlobHeap<'a> {
        BlobHeap { bytes: self.stream(b"#Blob").unwrap_or_default() }
    }

    /// The `#GUID` heap; empty when absent or not loaded.
    pub fn guid_heap(&self) -> GuidHeap<'a> {
        GuidHeap { bytes: self.stream(b"#GUID").unwrap_or_default() }
    }

    pub fn get_string(&self, offset: u32) -> Option<&'a str> {
        self.strings_heap().get(offset)
    }

    /// The GUID at 1-based `index`; index 0 is "no GUID".
    pub fn get_guid(&self, index: u32) -> Option<Guid> {
        self.guid_heap().get(index)
    }

    pub fn get_blob(&self, offset: u32) -> Option<&'a [u8]> {
        self.blob_heap().get(offset)
    }

    pub fn get_user_string(&self, offset: u32) -> Option<UserString<'a>> {
        self.user_strings_heap().get(offset)
    }

    pub fn iter_strings(&self) -> StringsIter<'a> {
        self.strings_heap().iter()
    }

    pub fn iter_user_strings(&self) -> UserStringsIter<'a> {
        self.user_strings_heap().iter()
    }

    pub fn iter_blobs(&self) -> BlobsIter<'a> {
        self.blob_heap().iter()
    }

    pub fn iter_guids(&self) -> Vec<Guid> {
        self.guid_heap().iter().collect()
    }

    /// Resolves a raw coded index of `family` into `(table, 1-based row)`.
    pub fn decode_index(&self, family: CodedIndex, raw: u32) -> error::Result<(TableId, u32)> {
        family.decode(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_root(stream_count: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&METADATA_SIGNATURE.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&12u32.to_le_bytes());
        bytes.extend_from_slice(b"v4.0.30319\0\0");
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&stream_count.to_le_bytes());
        bytes
    }

    #[test]
    fn parses_root_and_version() {
        let bytes = metadata_root(0);
        let metadata = CliMetadata::parse_with_opts(&bytes, 0, LoadOptions::ALL).unwrap();
        assert!(metadata.header.is_valid());
        assert_eq!(metadata.header.version_string(), "v4.0.30319");
        assert_eq!(metadata.header.stream_count, 0);
        assert_eq!(metadata.streams.as_deref(), Some(&[][..]));
        assert!(metadata.tables.is_none());
    }

    #[test]
    fn stream_names_are_nul_padded_to_four() {
        let mut bytes = metadata_root(2);
        let dir_start = bytes.len();
        bytes.extend_from_slice(&64u32.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(b"#GUID\0\0\0");
        bytes.extend_from_slice(&66u32.to_le_bytes());
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(b"#US\0");
        assert_eq!(bytes.len(), dir_start + 16 + 12);
        bytes.resize(70, 0xee);
        let metadata = CliMetadata::parse_with_opts(&bytes, 0, LoadOptions::empty()).unwrap();
        assert_eq!(metadata.stream_headers.len(), 2);
        assert_eq!(metadata.stream_headers[0].name_string(), "#GUID");
        assert_eq!(metadata.stream_headers[1].name, b"#US");
        assert_eq!(metadata.stream_headers[1].offset, 66);
        // streams were not requested
        assert!(metadata.streams.is_none());
        assert_eq!(metadata.stream(b"#US"), None);
    }

    #[test]
    fn overlong_stream_name_is_malformed() {
        let mut bytes = metadata_root(1);
        let name_start = bytes.len() + 8;
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&[b'x'; 33]);
        bytes.push(0);
        assert_eq!(
            CliMetadata::parse_with_opts(&bytes, 0, LoadOptions::empty()),
            Err(Error::MalformedStreamName { offset: name_start })
        );
    }

    #[test]
    fn stream_out_of_bounds_is_truncated() {
        let mut bytes = metadata_root(1);
        bytes.extend_from_slice(&0x1000u32.to_le_bytes());
        bytes.extend_from_slice(&0x10u32.to_le_bytes());
        bytes.extend_from_slice(b"#Blob\0\0\0");
        assert_eq!(
            CliMetadata::parse_with_opts(&bytes, 0, LoadOptions::ALL),
            Err(Error::Truncated { offset: 0x1000 })
        );
    }
}
