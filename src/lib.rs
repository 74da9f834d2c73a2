//! # Hobgoblin
//!
//! A mischievous, read-only inspector for the family of executable
//! containers that grew out of the DOS `MZ` stub: bare MZ images, 16-bit
//! segmented `NE` executables, and 32/64-bit `PE`/`PE32+` images including
//! the CLI (.NET) metadata embedded in managed assemblies.
//!
//! Everything is decoded up front into plain records that borrow from the
//! input bytes; no I/O happens after [`ExeImage::parse`] returns.
//!
//! ```no_run
//! use hobgoblin::{ExeImage, ExeKind, LoadOptions};
//!
//! fn run() -> hobgoblin::Result<()> {
//!     let bytes = std::fs::read("foo.exe").unwrap();
//!     let image = ExeImage::parse_with_opts(&bytes, LoadOptions::ALL)?;
//!     match image.kind() {
//!         ExeKind::Ne => println!("module {:?}", image.ne().unwrap().module_name()),
//!         ExeKind::Pe => println!("{} sections", image.pe().unwrap().sections.len()),
//!         _ => println!("{:?}", image.mz().header),
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod mz;
pub mod ne;
pub mod options;
pub mod pe;

pub use crate::error::{Error, Result};
pub use crate::options::LoadOptions;

use log::debug;
use scroll::Pread;

/// `LE`, little endian
pub const LE_MAGIC: u16 = 0x454c;
/// `LX`, little endian
pub const LX_MAGIC: u16 = 0x584c;

/// The container variant found behind the MZ stub.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ExeKind {
    /// Pure DOS executable, no new header
    Mz,
    /// 16-bit segmented new executable
    Ne,
    /// OS/2 2.x linear executable (recorded, not decoded)
    Le,
    /// OS/2 linear executable (recorded, not decoded)
    Lx,
    /// Portable executable
    Pe,
    /// A new header is present but its signature is unrecognized
    Unknown,
}

/// The decoded "new" portion of the executable, if any.
#[derive(Debug)]
enum NewExe<'a> {
    None,
    Le,
    Lx,
    Unknown(u32),
    Ne(ne::NeImage<'a>),
    Pe(pe::PeImage<'a>),
}

/// A decoded executable: the MZ portion plus at most one new-style image.
#[derive(Debug)]
pub struct ExeImage<'a> {
    mz: mz::MzImage,
    new: NewExe<'a>,
}

impl<'a> ExeImage<'a> {
    /// Parses headers only; see [`ExeImage::parse_with_opts`] to also load
    /// raw data and CLI metadata.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        Self::parse_with_opts(bytes, LoadOptions::default())
    }

    pub fn parse_with_opts(bytes: &'a [u8], opts: LoadOptions) -> Result<Self> {
        let mz = mz::MzImage::parse_with_opts(bytes, opts)?;
        let new_offset = mz.header.new_header_offset as usize;
        if new_offset == 0 {
            return Ok(ExeImage { mz, new: NewExe::None });
        }

        // Peek both signature widths at the new-header offset; the two-byte
        // formats are checked first so `NE`/`LE`/`LX` never misread as PE.
        let two_byte_sig: u16 = bytes
            .pread_with(new_offset, scroll::LE)
            .map_err(Error::truncated_at(new_offset))?;
        let new = match two_byte_sig {
            ne::header::NE_MAGIC => {
                NewExe::Ne(ne::NeImage::parse_with_opts(bytes, new_offset, opts)?)
            }
            LE_MAGIC => NewExe::Le,
            LX_MAGIC => NewExe::Lx,
            _ => {
                let four_byte_sig: u32 = bytes
                    .pread_with(new_offset, scroll::LE)
                    .map_err(Error::truncated_at(new_offset))?;
                if four_byte_sig == pe::header::PE_MAGIC {
                    NewExe::Pe(pe::PeImage::parse_with_opts(bytes, new_offset, opts)?)
                } else {
                    debug!("unrecognized new-header signature {:#x}", four_byte_sig);
                    NewExe::Unknown(four_byte_sig)
                }
            }
        };
        Ok(ExeImage { mz, new })
    }

    pub fn kind(&self) -> ExeKind {
        match self.new {
            NewExe::None => ExeKind::Mz,
            NewExe::Le => ExeKind::Le,
            NewExe::Lx => ExeKind::Lx,
            NewExe::Unknown(_) => ExeKind::Unknown,
            NewExe::Ne(_) => ExeKind::Ne,
            NewExe::Pe(_) => ExeKind::Pe,
        }
    }

    /// The MZ portion; always present.
    pub fn mz(&self) -> &mz::MzImage {
        &self.mz
    }

    pub fn ne(&self) -> Option<&ne::NeImage<'a>> {
        match self.new {
            NewExe::Ne(ref ne) => Some(ne),
            _ => None,
        }
    }

    pub fn pe(&self) -> Option<&pe::PeImage<'a>> {
        match self.new {
            NewExe::Pe(ref pe) => Some(pe),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_mz_has_no_new_image() {
        let mut bytes = vec![0u8; 0x40];
        bytes[0] = b'M';
        bytes[1] = b'Z';
        bytes[0x18] = 0x40;
        let image = ExeImage::parse(&bytes).unwrap();
        assert_eq!(image.kind(), ExeKind::Mz);
        assert_eq!(image.mz().header.new_header_offset, 0);
        assert!(image.ne().is_none());
        assert!(image.pe().is_none());
    }

    #[test]
    fn le_and_lx_are_recorded_not_decoded() {
        for (sig, kind) in [(b"LE", ExeKind::Le), (b"LX", ExeKind::Lx)] {
            let mut bytes = vec![0u8; 0x44];
            bytes[0] = b'M';
            bytes[1] = b'Z';
            bytes[0x18] = 0x40;
            bytes[0x3c] = 0x40;
            bytes[0x40] = sig[0];
            bytes[0x41] = sig[1];
            let image = ExeImage::parse(&bytes).unwrap();
            assert_eq!(image.kind(), kind);
        }
    }

    #[test]
    fn unknown_new_header_is_not_an_error() {
        let mut bytes = vec![0u8; 0x44];
        bytes[0] = b'M';
        bytes[1] = b'Z';
        bytes[0x18] = 0x40;
        bytes[0x3c] = 0x40;
        bytes[0x40..0x44].copy_from_slice(b"ABCD");
        let image = ExeImage::parse(&bytes).unwrap();
        assert_eq!(image.kind(), ExeKind::Unknown);
        assert!(image.pe().is_none());
    }
}
