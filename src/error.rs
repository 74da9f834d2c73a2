//! Typed decoding errors, each carrying the absolute file offset at which
//! the problem was detected.

use core::fmt;
use core::result;

#[derive(Debug, PartialEq, Eq, Clone)]
/// A custom Hobgoblin error
pub enum Error {
    /// A read crossed the end of the source or of a substream
    Truncated { offset: usize },
    /// The first two bytes are not `MZ`
    NotMz { offset: usize, signature: u16 },
    /// The bytes at the NE header position are not `NE`
    NotNe { offset: usize, signature: u16 },
    /// The bytes at the PE header position are not `PE\0\0`
    NotPe { offset: usize, signature: u32 },
    /// A `#US`/`#Blob` compressed length prefix starts with `111`
    InvalidBlobLength { offset: usize, prefix: u8 },
    /// The PE optional header magic is not PE32, PE32+ or ROM
    InvalidOptionalHeaderMagic { offset: usize, magic: u16 },
    /// An RVA falls inside no section
    UnresolvedRva { offset: usize, rva: u32 },
    /// `valid_tables` names a metadata table whose row shape is unknown,
    /// so neither it nor any later table can be located
    UnknownTable { offset: usize, table: u8 },
    /// A coded-index tag is reserved or out of range for its family
    InvalidCodedTag { offset: usize, tag: u32 },
    /// A metadata stream name exceeds 32 payload bytes
    MalformedStreamName { offset: usize },
}

impl Error {
    /// Maps any scroll failure to [`Error::Truncated`] at `offset`, for use
    /// with `map_err` at reads where the failing position is known.
    pub(crate) fn truncated_at(offset: usize) -> impl Fn(scroll::Error) -> Error {
        move |_| Error::Truncated { offset }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Truncated { offset } => {
                write!(fmt, "read past end of input (offset {offset:#x})")
            }
            Error::NotMz { offset, signature } => {
                write!(fmt, "not an MZ executable (offset {offset:#x}, signature {signature:#x})")
            }
            Error::NotNe { offset, signature } => {
                write!(fmt, "not an NE executable (offset {offset:#x}, signature {signature:#x})")
            }
            Error::NotPe { offset, signature } => {
                write!(fmt, "not a PE executable (offset {offset:#x}, signature {signature:#x})")
            }
            Error::InvalidBlobLength { offset, prefix } => {
                write!(fmt, "invalid blob length prefix {prefix:#04x} (offset {offset:#x})")
            }
            Error::InvalidOptionalHeaderMagic { offset, magic } => {
                write!(fmt, "invalid optional header magic {magic:#x} (offset {offset:#x})")
            }
            Error::UnresolvedRva { offset, rva } => {
                write!(fmt, "rva {rva:#x} falls in no section (offset {offset:#x})")
            }
            Error::UnknownTable { offset, table } => {
                write!(fmt, "unknown metadata table id {table:#x} (offset {offset:#x})")
            }
            Error::InvalidCodedTag { offset, tag } => {
                write!(fmt, "invalid coded-index tag {tag:#x} (offset {offset:#x})")
            }
            Error::MalformedStreamName { offset } => {
                write!(fmt, "metadata stream name longer than 32 bytes (offset {offset:#x})")
            }
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
