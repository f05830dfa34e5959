//! Read-only decoding of ELF (Executable and Linkable Format) files.
//!
//! Given a path on disk, [`ElfFile::open`] eagerly materializes a typed,
//! navigable model of the file: its header, program segments, sections, and
//! a set of views derived from sections (the section-name string table, the
//! dynamic linking table, symbol tables, relocation tables, and note
//! records). All cross-references (section names, symbol names, relocation
//! symbols, section-to-segment assignment) are resolved once at load time;
//! after construction the model is immutable and safe to share between
//! threads.
//!
//! Both ELF classes (32- and 64-bit) and both data encodings (little- and
//! big-endian) are decoded into a single model whose integer fields are
//! widened to 64 bits, so consumers never branch on class or byte order.
//!
//! # Example
//!
//! ```no_run
//! use elfview_core::ElfFile;
//!
//! let file = ElfFile::open("/bin/ls")?;
//! println!("{} ({})", file.header().type_string(), file.header().machine_string());
//! for section in file.sections() {
//!     println!("  [{:2}] {:<20} {}", section.index(), section.name(), section.type_string());
//! }
//! # Ok::<(), elfview_core::ElfError>(())
//! ```
//!
//! The library never writes to the input and performs no validation beyond
//! what is needed to decode safely: malformed table entries are skipped or
//! reported as absent, never repaired.

#![deny(unsafe_code)]

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub mod dynamic;
pub mod endian;
pub mod file;
pub mod header;
pub mod note;
pub mod raw;
pub mod relocation;
pub mod section;
pub mod segment;
pub mod symbol;

pub use dynamic::{DynamicEntry, DynamicTable, DynamicTag, ValueKind};
pub use endian::EndianConverter;
pub use file::ElfFile;
pub use header::{ElfClass, ElfData, ElfType, FileHeader};
pub use note::{NoteEntry, NoteTable};
pub use relocation::{RelocationEntry, RelocationTable};
pub use section::{Section, SectionFlags, SectionType, SectionView};
pub use segment::{Segment, SegmentFlags, SegmentType};
pub use symbol::{Symbol, SymbolBinding, SymbolKind, SymbolTable};

/// ELF magic bytes: `"\x7fELF"`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Size of the ELF identification array.
pub const EI_NIDENT: usize = 16;

/// Returns the library version as a compile-time constant string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Error type for ELF decoding operations.
///
/// Construction of an [`ElfFile`] is all-or-nothing: any of these kinds
/// fails the whole operation. After construction, per-entry accessors
/// prefer returning `None` for out-of-range indices over failing.
#[derive(Debug, Error)]
pub enum ElfError {
    /// The path does not exist or cannot be opened for reading.
    #[error("cannot open {path:?}: {source}")]
    InputNotAccessible {
        /// The path that was passed to [`ElfFile::open`].
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The four-byte magic number does not match.
    #[error("invalid ELF magic number")]
    BadMagic,
    /// The class byte is neither `ELFCLASS32` nor `ELFCLASS64`.
    #[error("invalid ELF file class: {0}")]
    InvalidClass(u8),
    /// The encoding byte is neither `ELFDATA2LSB` nor `ELFDATA2MSB`.
    #[error("invalid ELF data encoding: {0}")]
    InvalidEncoding(u8),
    /// A read did not return the expected number of bytes, or an internal
    /// offset refers outside the file image.
    #[error("truncated or malformed {what}: need {needed} bytes at offset {offset:#x}, have {available}")]
    Truncated {
        /// The structure being decoded when the read failed.
        what: &'static str,
        /// File offset of the failing read.
        offset: u64,
        /// Bytes required by the structure.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },
}

/// Result type for ELF decoding operations.
pub type ElfResult<T> = Result<T, ElfError>;

/// Returns the `[offset, offset + size)` byte range of the file image, or
/// the truncation error when the range lies outside it.
pub(crate) fn image_slice<'a>(
    image: &'a [u8],
    offset: u64,
    size: u64,
    what: &'static str,
) -> ElfResult<&'a [u8]> {
    let truncated = || ElfError::Truncated {
        what,
        offset,
        needed: usize::try_from(size).unwrap_or(usize::MAX),
        available: image.len(),
    };
    let start = usize::try_from(offset).map_err(|_| truncated())?;
    let len = usize::try_from(size).map_err(|_| truncated())?;
    let end = start.checked_add(len).ok_or_else(truncated)?;
    image.get(start..end).ok_or_else(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elf_magic() {
        assert_eq!(ELF_MAGIC, [0x7f, 0x45, 0x4c, 0x46]);
    }

    #[test]
    fn test_version_nonempty() {
        assert!(!version().is_empty());
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_error_display() {
        let err = ElfError::BadMagic;
        assert_eq!(format!("{err}"), "invalid ELF magic number");

        let err = ElfError::InvalidClass(3);
        assert_eq!(format!("{err}"), "invalid ELF file class: 3");

        let err = ElfError::Truncated {
            what: "section header",
            offset: 0x40,
            needed: 64,
            available: 12,
        };
        assert_eq!(
            format!("{err}"),
            "truncated or malformed section header: need 64 bytes at offset 0x40, have 12"
        );
    }
}
