//! The metadata heaps: `#Strings`, `#US`, `#Blob` and `#GUID`.
//!
//! Heaps are pure views over the raw stream bytes held by the metadata;
//! lookups never allocate except where UTF-16 conversion demands it.

use core::fmt;

use scroll::Pread;

use crate::error::{self, Error};

/// Reads a `#US`/`#Blob` compressed length prefix.
///
/// One byte for lengths below 0x80, two for lengths below 0x4000, four
/// otherwise; a prefix starting `111` is invalid.
pub fn read_blob_length(bytes: &[u8], offset: &mut usize) -> error::Result<u32> {
    let b0 = bytes
        .gread::<u8>(offset)
        .map_err(Error::truncated_at(*offset))?;
    if b0 & 0b1000_0000 == 0 {
        Ok(b0 as u32)
    } else if b0 & 0b1100_0000 == 0b1000_0000 {
        let b1 = bytes
            .gread::<u8>(offset)
            .map_err(Error::truncated_at(*offset))?;
        Ok((((b0 & 0b0011_1111) as u32) << 8) | b1 as u32)
    } else if b0 & 0b1110_0000 == 0b1100_0000 {
        let b1 = bytes.gread::<u8>(offset).map_err(Error::truncated_at(*offset))?;
        let b2 = bytes.gread::<u8>(offset).map_err(Error::truncated_at(*offset))?;
        let b3 = bytes.gread::<u8>(offset).map_err(Error::truncated_at(*offset))?;
        Ok((((b0 & 0b0001_1111) as u32) << 24)
            | ((b1 as u32) << 16)
            | ((b2 as u32) << 8)
            | b3 as u32)
    } else {
        Err(Error::InvalidBlobLength { offset: *offset - 1, prefix: b0 })
    }
}

/// A 16-byte GUID from the `#GUID` heap.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Hash)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

pub const SIZEOF_GUID: usize = 16;

impl fmt::Display for Guid {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}

/// The `#Strings` heap: NUL-terminated UTF-8, indexed by byte offset.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct StringsHeap<'a> {
    pub bytes: &'a [u8],
}

impl<'a> StringsHeap<'a> {
    /// The NUL-terminated string starting at `offset`; `None` when the
    /// offset is out of bounds or the bytes are not UTF-8.
    pub fn get(&self, offset: u32) -> Option<&'a str> {
        let bytes = self.bytes.get(offset as usize..)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        core::str::from_utf8(&bytes[..end]).ok()
    }

    /// Iterates `(offset, string)` pairs over the whole heap, starting past
    /// the conventional empty string at offset 0.
    pub fn iter(&self) -> StringsIter<'a> {
        StringsIter { bytes: self.bytes, offset: 1.min(self.bytes.len()) }
    }
}

#[derive(Debug, Clone)]
pub struct StringsIter<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for StringsIter<'a> {
    type Item = (u32, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.bytes.len() {
            return None;
        }
        let offset = self.offset;
        let rest = &self.bytes[offset..];
        let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        self.offset = offset + end + 1;
        match core::str::from_utf8(&rest[..end]) {
            Ok(s) => Some((offset as u32, s)),
            Err(_) => None,
        }
    }
}

/// A decoded `#US` entry: UTF-16LE code units plus the terminal flag byte.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct UserString<'a> {
    /// The UTF-16LE payload, excluding the flag byte
    pub bytes: &'a [u8],
    /// The odd trailing byte; 1 marks strings whose characters need
    /// handling beyond 8-bit encodings, and empty blobs have none
    pub flag_byte: Option<u8>,
}

impl<'a> UserString<'a> {
    /// The UTF-16 code units, in order.
    pub fn units(&self) -> impl Iterator<Item = u16> + 'a {
        self.bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.units().collect::<Vec<_>>())
    }

    /// Whether any character requires non-8-bit handling, per the flag byte.
    pub fn needs_wide_handling(&self) -> bool {
        self.flag_byte.map_or(false, |flag| flag & 1 != 0)
    }
}

/// The `#US` heap: compressed-length-prefixed UTF-16 blobs, indexed by
/// offset.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct UserStringsHeap<'a> {
    pub bytes: &'a [u8],
}

impl<'a> UserStringsHeap<'a> {
    pub fn get(&self, offset: u32) -> Option<UserString<'a>> {
        let pos = &mut (offset as usize);
        let len = read_blob_length(self.bytes, pos).ok()? as usize;
        let blob = self.bytes.get(*pos..*pos + len)?;
        match blob.split_last() {
            Some((&flag, payload)) => Some(UserString { bytes: payload, flag_byte: Some(flag) }),
            None => Some(UserString { bytes: blob, flag_byte: None }),
        }
    }

    /// Iterates `(offset, string)` pairs over the whole heap.
    pub fn iter(&self) -> UserStringsIter<'a> {
        UserStringsIter { heap: UserStringsHeap { bytes: self.bytes }, offset: 0, failed: false }
    }
}

#[derive(Debug, Clone)]
pub struct UserStringsIter<'a> {
    heap: UserStringsHeap<'a>,
    offset: usize,
    failed: bool,
}

impl<'a> Iterator for UserStringsIter<'a> {
    type Item = error::Result<(u32, UserString<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.heap.bytes.len() {
            return None;
        }
        let offset = self.offset;
        let pos = &mut { offset };
        match read_blob_length(self.heap.bytes, pos) {
            Ok(len) => {
                self.offset = *pos + len as usize;
                match self.heap.get(offset as u32) {
                    Some(us) => Some(Ok((offset as u32, us))),
                    None => {
                        self.failed = true;
                        Some(Err(Error::Truncated { offset: *pos }))
                    }
                }
            }
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}

/// The `#Blob` heap: compressed-length-prefixed byte blobs, indexed by
/// offset.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct BlobHeap<'a> {
    pub bytes: &'a [u8],
}

impl<'a> BlobHeap<'a> {
    pub fn get(&self, offset: u32) -> Option<&'a [u8]> {
        let pos = &mut (offset as usize);
        let len = read_blob_length(self.bytes, pos).ok()? as usize;
        self.bytes.get(*pos..*pos + len)
    }

    /// Iterates `(offset, blob)` pairs over the whole heap.
    pub fn iter(&self) -> BlobsIter<'a> {
        BlobsIter { bytes: self.bytes, offset: 0, failed: false }
    }
}

#[derive(Debug, Clone)]
pub struct BlobsIter<'a> {
    bytes: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Iterator for BlobsIter<'a> {
    type Item = error::Result<(u32, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.bytes.len() {
            return None;
        }
        let offset = self.offset;
        let pos = &mut { offset };
        match read_blob_length(self.bytes, pos) {
            Ok(len) => match self.bytes.get(*pos..*pos + len as usize) {
                Some(blob) => {
                    self.offset = *pos + len as usize;
                    Some(Ok((offset as u32, blob)))
                }
                None => {
                    self.failed = true;
                    Some(Err(Error::Truncated { offset: *pos }))
                }
            },
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}

/// The `#GUID` heap: a dense array of GUIDs with 1-based indices; index 0
/// means "no GUID".
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct GuidHeap<'a> {
    pub bytes: &'a [u8],
}

impl<'a> GuidHeap<'a> {
    /// Number of GUIDs in the heap.
    pub fn len(&self) -> usize {
        self.bytes.len() / SIZEOF_GUID
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The GUID at 1-based `index`; index 0 is "no GUID".
    pub fn get(&self, index: u32) -> Option<Guid> {
        if index == 0 {
            return None;
        }
        let start = (index as usize - 1) * SIZEOF_GUID;
        let bytes = self.bytes.get(start..start + SIZEOF_GUID)?;
        let offset = &mut 0;
        Some(Guid {
            data1: bytes.gread_with(offset, scroll::LE).ok()?,
            data2: bytes.gread_with(offset, scroll::LE).ok()?,
            data3: bytes.gread_with(offset, scroll::LE).ok()?,
            data4: bytes[*offset..].try_into().ok()?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Guid> + '_ {
        (1..=self.len() as u32).filter_map(move |i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_length_encodings() {
        assert_eq!(read_blob_length(&[0x03], &mut 0), Ok(3));
        assert_eq!(read_blob_length(&[0x7f], &mut 0), Ok(0x7f));
        assert_eq!(read_blob_length(&[0x81, 0x23], &mut 0), Ok(0x0123));
        assert_eq!(
            read_blob_length(&[0xc1, 0x22, 0x33, 0x44], &mut 0),
            Ok(0x0122_3344)
        );
        assert_eq!(
            read_blob_length(&[0xe0], &mut 0),
            Err(Error::InvalidBlobLength { offset: 0, prefix: 0xe0 })
        );
    }

    #[test]
    fn strings_heap_lookup_and_iteration_agree() {
        let heap = StringsHeap { bytes: b"\0alpha\0beta\0" };
        assert_eq!(heap.get(0), Some(""));
        assert_eq!(heap.get(1), Some("alpha"));
        assert_eq!(heap.get(7), Some("beta"));
        assert_eq!(heap.get(3), Some("pha"));
        assert_eq!(heap.get(64), None);
        for (offset, s) in heap.iter() {
            assert_eq!(heap.get(offset), Some(s));
        }
        let all: Vec<_> = heap.iter().map(|(_, s)| s).collect();
        assert_eq!(all, ["alpha", "beta"]);
    }

    #[test]
    fn guid_heap_is_one_indexed() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x00112233u32.to_le_bytes());
        bytes.extend_from_slice(&0x4455u16.to_le_bytes());
        bytes.extend_from_slice(&0x6677u16.to_le_bytes());
        bytes.extend_from_slice(&[0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        bytes.extend_from_slice(&[0u8; 16]);
        let heap = GuidHeap { bytes: &bytes };
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.get(0), None);
        let first = heap.get(1).unwrap();
        assert_eq!(first.data1, 0x00112233);
        assert_eq!(first.to_string(), "00112233-4455-6677-8899-aabbccddeeff");
        assert_eq!(heap.get(2), Some(Guid::default()));
        assert_eq!(heap.get(3), None);
        let collected: Vec<_> = heap.iter().collect();
        assert_eq!(collected, vec![first, Guid::default()]);
    }

    #[test]
    fn user_strings_carry_their_flag_byte() {
        // "Hi" in UTF-16LE plus a flag byte of 0, then "€" with flag 1
        let bytes = [
            0x00, // empty blob at offset 0
            0x05, 0x48, 0x00, 0x69, 0x00, 0x00, // "Hi", flag 0
            0x03, 0xac, 0x20, 0x01, // "€", flag 1
        ];
        let heap = UserStringsHeap { bytes: &bytes };
        let empty = heap.get(0).unwrap();
        assert_eq!(empty.flag_byte, None);
        assert_eq!(empty.to_string_lossy(), "");
        let hi = heap.get(1).unwrap();
        assert_eq!(hi.to_string_lossy(), "Hi");
        assert_eq!(hi.flag_byte, Some(0));
        assert!(!hi.needs_wide_handling());
        let euro = heap.get(7).unwrap();
        assert_eq!(euro.to_string_lossy(), "\u{20ac}");
        assert!(euro.needs_wide_handling());
        let offsets: Vec<u32> = heap
            .iter()
            .map(|entry| entry.unwrap().0)
            .collect();
        assert_eq!(offsets, [0, 1, 7]);
    }

    #[test]
    fn blob_heap_round_trips_offsets() {
        let bytes = [0x00, 0x02, 0xaa, 0xbb, 0x01, 0xcc];
        let heap = BlobHeap { bytes: &bytes };
        assert_eq!(heap.get(0), Some(&[][..]));
        assert_eq!(heap.get(1), Some(&[0xaa, 0xbb][..]));
        assert_eq!(heap.get(4), Some(&[0xcc][..]));
        assert_eq!(heap.get(64), None);
        let blobs: Vec<_> = heap
            .iter()
            .collect::<error::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(
            blobs,
            vec![(0u32, &[][..]), (1, &[0xaa, 0xbb][..]), (4, &[0xcc][..])]
        );
    }
}
