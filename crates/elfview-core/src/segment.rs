//! ELF program segment decoding.
//!
//! A [`Segment`] mirrors one program header plus the payload bytes it
//! covers in the file. After all sections are loaded, the file model
//! assigns to each segment the indices of the sections it contains.

use crate::endian::EndianConverter;
use crate::header::ElfClass;
use crate::raw::{Elf32Phdr, Elf64Phdr};
use crate::section::Section;
use crate::{ElfError, ElfResult, image_slice};

/// Program header type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    /// Unused entry
    Null,
    /// Loadable segment
    Load,
    /// Dynamic linking information
    Dynamic,
    /// Interpreter path
    Interp,
    /// Auxiliary information
    Note,
    /// Reserved
    Shlib,
    /// The program header table itself
    Phdr,
    /// Thread-local storage template
    Tls,
    /// GNU exception handling frame location
    GnuEhFrame,
    /// GNU stack permissions
    GnuStack,
    /// GNU read-only-after-relocation region
    GnuRelro,
    /// GNU property
    GnuProperty,
    /// Unknown type
    Unknown(u32),
}

impl From<u32> for SegmentType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Null,
            1 => Self::Load,
            2 => Self::Dynamic,
            3 => Self::Interp,
            4 => Self::Note,
            5 => Self::Shlib,
            6 => Self::Phdr,
            7 => Self::Tls,
            0x6474_e550 => Self::GnuEhFrame,
            0x6474_e551 => Self::GnuStack,
            0x6474_e552 => Self::GnuRelro,
            0x6474_e553 => Self::GnuProperty,
            other => Self::Unknown(other),
        }
    }
}

impl SegmentType {
    /// The printable token for this segment type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Load => "LOAD",
            Self::Dynamic => "DYNAMIC",
            Self::Interp => "INTERP",
            Self::Note => "NOTE",
            Self::Shlib => "SHLIB",
            Self::Phdr => "PHDR",
            Self::Tls => "TLS",
            Self::GnuEhFrame => "GNU_EH_FRAME",
            Self::GnuStack => "GNU_STACK",
            Self::GnuRelro => "GNU_RELRO",
            Self::GnuProperty => "GNU_PROPERTY",
            // Original token, misspelling intentional.
            Self::Unknown(_) => "UNKOWN",
        }
    }
}

/// Program header flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentFlags(pub u32);

impl SegmentFlags {
    /// Execute permission
    pub const PF_X: u32 = 0x1;
    /// Write permission
    pub const PF_W: u32 = 0x2;
    /// Read permission
    pub const PF_R: u32 = 0x4;

    /// Check if readable.
    pub fn is_readable(self) -> bool {
        self.0 & Self::PF_R != 0
    }

    /// Check if writable.
    pub fn is_writable(self) -> bool {
        self.0 & Self::PF_W != 0
    }

    /// Check if executable.
    pub fn is_executable(self) -> bool {
        self.0 & Self::PF_X != 0
    }

    /// Renders the flags as concatenated `R`/`W`/`X` tokens in that order.
    pub fn as_string(self) -> String {
        let mut result = String::new();
        if self.is_readable() {
            result.push('R');
        }
        if self.is_writable() {
            result.push('W');
        }
        if self.is_executable() {
            result.push('X');
        }
        result
    }
}

/// One program segment: widened header fields, the covered file bytes, and
/// the indices of the sections lying inside the segment.
#[derive(Debug, Clone)]
pub struct Segment {
    index: usize,
    segment_type: SegmentType,
    flags: SegmentFlags,
    offset: u64,
    vaddr: u64,
    paddr: u64,
    filesz: u64,
    memsz: u64,
    align: u64,
    data: Vec<u8>,
    section_indices: Vec<usize>,
}

impl Segment {
    /// Decodes the program header at `header_offset` in the file image and
    /// loads the segment's payload (`filesz` bytes at `offset`). Null
    /// segments keep an empty payload.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Truncated`] if the header or the payload extent
    /// lies outside the file image.
    pub(crate) fn parse(
        image: &[u8],
        header_offset: u64,
        index: usize,
        class: ElfClass,
        conv: &EndianConverter,
    ) -> ElfResult<Self> {
        let header = image_slice(image, header_offset, header_size(class) as u64, "program header")?;

        let mut segment = match class {
            ElfClass::Elf32 => {
                let raw = Elf32Phdr::parse(header).ok_or(ElfError::Truncated {
                    what: "program header",
                    offset: header_offset,
                    needed: Elf32Phdr::SIZE,
                    available: header.len(),
                })?;
                Self {
                    index,
                    segment_type: SegmentType::from(conv.u32(raw.p_type)),
                    flags: SegmentFlags(conv.u32(raw.p_flags)),
                    offset: u64::from(conv.u32(raw.p_offset)),
                    vaddr: u64::from(conv.u32(raw.p_vaddr)),
                    paddr: u64::from(conv.u32(raw.p_paddr)),
                    filesz: u64::from(conv.u32(raw.p_filesz)),
                    memsz: u64::from(conv.u32(raw.p_memsz)),
                    align: u64::from(conv.u32(raw.p_align)),
                    data: Vec::new(),
                    section_indices: Vec::new(),
                }
            }
            ElfClass::Elf64 => {
                let raw = Elf64Phdr::parse(header).ok_or(ElfError::Truncated {
                    what: "program header",
                    offset: header_offset,
                    needed: Elf64Phdr::SIZE,
                    available: header.len(),
                })?;
                Self {
                    index,
                    segment_type: SegmentType::from(conv.u32(raw.p_type)),
                    flags: SegmentFlags(conv.u32(raw.p_flags)),
                    offset: conv.u64(raw.p_offset),
                    vaddr: conv.u64(raw.p_vaddr),
                    paddr: conv.u64(raw.p_paddr),
                    filesz: conv.u64(raw.p_filesz),
                    memsz: conv.u64(raw.p_memsz),
                    align: conv.u64(raw.p_align),
                    data: Vec::new(),
                    section_indices: Vec::new(),
                }
            }
        };

        if segment.segment_type != SegmentType::Null && segment.filesz != 0 {
            segment.data =
                image_slice(image, segment.offset, segment.filesz, "segment data")?.to_vec();
        }

        Ok(segment)
    }

    /// The segment's position in the program header table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The segment's type.
    pub fn segment_type(&self) -> SegmentType {
        self.segment_type
    }

    /// The segment's type as a printable token.
    pub fn type_string(&self) -> &'static str {
        self.segment_type.as_str()
    }

    /// The segment's flags word.
    pub fn flags(&self) -> SegmentFlags {
        self.flags
    }

    /// The flags as concatenated `R`/`W`/`X` tokens.
    pub fn flags_string(&self) -> String {
        self.flags.as_string()
    }

    /// File offset of the segment's payload.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Virtual address of the segment in memory.
    pub fn virtual_address(&self) -> u64 {
        self.vaddr
    }

    /// Physical address of the segment.
    pub fn physical_address(&self) -> u64 {
        self.paddr
    }

    /// Number of bytes the segment occupies in the file.
    pub fn file_size(&self) -> u64 {
        self.filesz
    }

    /// Number of bytes the segment occupies in memory. At least
    /// [`file_size`](Self::file_size) for loadable segments.
    pub fn memory_size(&self) -> u64 {
        self.memsz
    }

    /// Required address alignment.
    pub fn address_alignment(&self) -> u64 {
        self.align
    }

    /// The payload bytes, `file_size` long. Empty for null segments.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Indices of the sections lying inside this segment, deduplicated, in
    /// section-table order.
    pub fn associated_sections(&self) -> &[usize] {
        &self.section_indices
    }

    /// Number of sections lying inside this segment.
    pub fn section_count(&self) -> usize {
        self.section_indices.len()
    }

    /// Check whether the given section lies inside this segment: allocated
    /// sections by virtual-address containment, others by file-offset
    /// containment.
    pub(crate) fn contains(&self, section: &Section) -> bool {
        if section.flags().is_allocated() {
            self.vaddr <= section.address()
                && section.address() + section.size() <= self.vaddr + self.memsz
        } else {
            self.offset <= section.offset()
                && section.offset() + section.size() <= self.offset + self.filesz
        }
    }

    /// Records an associated section index, keeping the list deduplicated.
    pub(crate) fn add_section_index(&mut self, index: usize) {
        if !self.section_indices.contains(&index) {
            self.section_indices.push(index);
        }
    }
}

fn header_size(class: ElfClass) -> usize {
    match class {
        ElfClass::Elf32 => Elf32Phdr::SIZE,
        ElfClass::Elf64 => Elf64Phdr::SIZE,
    }
}
