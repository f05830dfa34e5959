//! ELF section decoding.
//!
//! A [`Section`] holds the widened generic header fields plus the section's
//! payload bytes, loaded verbatim from the file (null and nobits sections
//! carry no payload). Sections whose type has a richer record structure
//! additionally carry a decoded [`SectionView`] payload, attached by the
//! file model once the sibling sections it depends on are available.

use crate::dynamic::DynamicTable;
use crate::endian::EndianConverter;
use crate::header::ElfClass;
use crate::note::NoteTable;
use crate::raw::{Elf32Shdr, Elf64Shdr};
use crate::relocation::RelocationTable;
use crate::symbol::SymbolTable;
use crate::{ElfError, ElfResult, image_slice};

/// Section header type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionType {
    /// Inactive section
    Null,
    /// Program data
    Progbits,
    /// Symbol table
    Symtab,
    /// String table
    Strtab,
    /// Relocation entries with addends
    Rela,
    /// Symbol hash table
    Hash,
    /// Dynamic linking information
    Dynamic,
    /// Notes
    Note,
    /// Uninitialized data (occupies no file space)
    Nobits,
    /// Relocation entries without addends
    Rel,
    /// Reserved
    Shlib,
    /// Dynamic linker symbol table
    Dynsym,
    /// Array of constructors
    InitArray,
    /// Array of destructors
    FiniArray,
    /// Array of pre-constructors
    PreinitArray,
    /// Section group
    Group,
    /// Extended symbol table indices
    SymtabShndx,
    /// GNU hash table
    GnuHash,
    /// GNU version definitions
    GnuVerdef,
    /// GNU version requirements
    GnuVerneed,
    /// GNU version symbol table
    GnuVersym,
    /// Unknown type
    Unknown(u32),
}

impl From<u32> for SectionType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Null,
            1 => Self::Progbits,
            2 => Self::Symtab,
            3 => Self::Strtab,
            4 => Self::Rela,
            5 => Self::Hash,
            6 => Self::Dynamic,
            7 => Self::Note,
            8 => Self::Nobits,
            9 => Self::Rel,
            10 => Self::Shlib,
            11 => Self::Dynsym,
            14 => Self::InitArray,
            15 => Self::FiniArray,
            16 => Self::PreinitArray,
            17 => Self::Group,
            18 => Self::SymtabShndx,
            0x6fff_fff6 => Self::GnuHash,
            0x6fff_fffd => Self::GnuVerdef,
            0x6fff_fffe => Self::GnuVerneed,
            0x6fff_ffff => Self::GnuVersym,
            other => Self::Unknown(other),
        }
    }
}

impl SectionType {
    /// The printable token for this section type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Progbits => "PROGBITS",
            Self::Symtab => "SYMTAB",
            Self::Strtab => "STRTAB",
            Self::Rela => "RELA",
            Self::Hash => "HASH",
            Self::Dynamic => "DYNAMIC",
            Self::Note => "NOTE",
            Self::Nobits => "NOBITS",
            Self::Rel => "REL",
            Self::Shlib => "SHLIB",
            Self::Dynsym => "DYNSYM",
            Self::InitArray => "INIT_ARRAY",
            Self::FiniArray => "FINI_ARRAY",
            Self::PreinitArray => "PREINIT_ARRAY",
            Self::Group => "GROUP",
            Self::SymtabShndx => "SYMTAB_SHNDX",
            Self::GnuHash => "GNU_HASH",
            Self::GnuVerdef => "VERDEF",
            Self::GnuVerneed => "VERNEED",
            Self::GnuVersym => "VERSYM",
            // Original token, misspelling intentional.
            Self::Unknown(_) => "UNKOWN",
        }
    }
}

/// Section header flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionFlags(pub u64);

impl SectionFlags {
    /// Writable
    pub const SHF_WRITE: u64 = 0x1;
    /// Occupies memory during execution
    pub const SHF_ALLOC: u64 = 0x2;
    /// Executable
    pub const SHF_EXECINSTR: u64 = 0x4;
    /// Might be merged
    pub const SHF_MERGE: u64 = 0x10;
    /// Contains null-terminated strings
    pub const SHF_STRINGS: u64 = 0x20;
    /// `sh_info` holds a section index
    pub const SHF_INFO_LINK: u64 = 0x40;
    /// Preserve link order
    pub const SHF_LINK_ORDER: u64 = 0x80;
    /// OS-specific handling required
    pub const SHF_OS_NONCONFORMING: u64 = 0x100;
    /// Member of a section group
    pub const SHF_GROUP: u64 = 0x200;
    /// Thread-local storage
    pub const SHF_TLS: u64 = 0x400;
    /// Compressed section data
    pub const SHF_COMPRESSED: u64 = 0x800;
    /// Large section (x86-64 medium/large code model)
    pub const SHF_LARGE: u64 = 0x1000_0000;
    /// Excluded from linking
    pub const SHF_EXCLUDE: u64 = 0x8000_0000;
    /// OS-specific mask
    pub const SHF_MASKOS: u64 = 0x0ff0_0000;
    /// Processor-specific mask
    pub const SHF_MASKPROC: u64 = 0xf000_0000;

    /// Single-character tokens in canonical emission order. Each entry is
    /// matched as a mask: the token is emitted when all of its bits are set.
    const FLAG_CHARS: [(u64, char); 14] = [
        (Self::SHF_WRITE, 'W'),
        (Self::SHF_ALLOC, 'A'),
        (Self::SHF_EXECINSTR, 'X'),
        (Self::SHF_MERGE, 'M'),
        (Self::SHF_STRINGS, 'S'),
        (Self::SHF_INFO_LINK, 'I'),
        (Self::SHF_LINK_ORDER, 'L'),
        (Self::SHF_GROUP, 'G'),
        (Self::SHF_TLS, 'T'),
        (Self::SHF_EXCLUDE, 'E'),
        (Self::SHF_LARGE, 'l'),
        (Self::SHF_OS_NONCONFORMING, 'O'),
        (Self::SHF_MASKOS, 'o'),
        (Self::SHF_MASKPROC, 'p'),
    ];

    pub fn is_writable(self) -> bool {
        self.0 & Self::SHF_WRITE != 0
    }

    pub fn is_allocated(self) -> bool {
        self.0 & Self::SHF_ALLOC != 0
    }

    pub fn is_executable(self) -> bool {
        self.0 & Self::SHF_EXECINSTR != 0
    }

    pub fn is_tls(self) -> bool {
        self.0 & Self::SHF_TLS != 0
    }

    /// Renders the flags as concatenated single-character tokens, e.g.
    /// `"WA"` for a writable, allocated section.
    pub fn as_string(self) -> String {
        let mut result = String::new();
        for (mask, ch) in Self::FLAG_CHARS {
            if self.0 & mask == mask {
                result.push(ch);
            }
        }
        result
    }
}

/// Kind-specific decoded payload of a section.
///
/// The closed set mirrors the section types that have a richer record
/// structure than a flat byte buffer. Views share the generic section's
/// bytes conceptually; their decoded records live here.
#[derive(Debug, Clone, Default)]
pub enum SectionView {
    /// No kind-specific structure.
    #[default]
    Plain,
    /// A string table; lookups go through [`Section::string_at`].
    StringTable,
    /// A decoded dynamic linking table.
    Dynamic(DynamicTable),
    /// A decoded symbol table.
    Symbols(SymbolTable),
    /// A decoded relocation table.
    Relocations(RelocationTable),
    /// Decoded note records.
    Notes(NoteTable),
}

/// One section of an ELF file: widened header fields, the payload bytes,
/// the name resolved from the section-header string table, and an optional
/// kind-specific view.
#[derive(Debug, Clone)]
pub struct Section {
    index: usize,
    name: String,
    name_offset: u32,
    section_type: SectionType,
    flags: SectionFlags,
    addr: u64,
    offset: u64,
    size: u64,
    link: u32,
    info: u32,
    addralign: u64,
    entsize: u64,
    data: Vec<u8>,
    view: SectionView,
}

impl Section {
    /// Decodes the section header at `header_offset` in the file image and
    /// loads the section's payload. Null and nobits sections keep an empty
    /// payload.
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
        let header = image_slice(image, header_offset, header_size(class) as u64, "section header")?;

        let mut section = match class {
            ElfClass::Elf32 => {
                let raw = Elf32Shdr::parse(header).ok_or(ElfError::Truncated {
                    what: "section header",
                    offset: header_offset,
                    needed: Elf32Shdr::SIZE,
                    available: header.len(),
                })?;
                Self {
                    index,
                    name: String::new(),
                    name_offset: conv.u32(raw.sh_name),
                    section_type: SectionType::from(conv.u32(raw.sh_type)),
                    flags: SectionFlags(u64::from(conv.u32(raw.sh_flags))),
                    addr: u64::from(conv.u32(raw.sh_addr)),
                    offset: u64::from(conv.u32(raw.sh_offset)),
                    size: u64::from(conv.u32(raw.sh_size)),
                    link: conv.u32(raw.sh_link),
                    info: conv.u32(raw.sh_info),
                    addralign: u64::from(conv.u32(raw.sh_addralign)),
                    entsize: u64::from(conv.u32(raw.sh_entsize)),
                    data: Vec::new(),
                    view: SectionView::Plain,
                }
            }
            ElfClass::Elf64 => {
                let raw = Elf64Shdr::parse(header).ok_or(ElfError::Truncated {
                    what: "section header",
                    offset: header_offset,
                    needed: Elf64Shdr::SIZE,
                    available: header.len(),
                })?;
                Self {
                    index,
                    name: String::new(),
                    name_offset: conv.u32(raw.sh_name),
                    section_type: SectionType::from(conv.u32(raw.sh_type)),
                    flags: SectionFlags(conv.u64(raw.sh_flags)),
                    addr: conv.u64(raw.sh_addr),
                    offset: conv.u64(raw.sh_offset),
                    size: conv.u64(raw.sh_size),
                    link: conv.u32(raw.sh_link),
                    info: conv.u32(raw.sh_info),
                    addralign: conv.u64(raw.sh_addralign),
                    entsize: conv.u64(raw.sh_entsize),
                    data: Vec::new(),
                    view: SectionView::Plain,
                }
            }
        };

        if !matches!(section.section_type, SectionType::Null | SectionType::Nobits)
            && section.size != 0
        {
            section.data =
                image_slice(image, section.offset, section.size, "section data")?.to_vec();
        }

        Ok(section)
    }

    /// The section's position in the section header table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The section's name, resolved from the section-header string table.
    /// Empty when the file has no such table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw offset of the section's name within the string table.
    pub fn name_offset(&self) -> u32 {
        self.name_offset
    }

    /// The section's type.
    pub fn section_type(&self) -> SectionType {
        self.section_type
    }

    /// The section's type as a printable token.
    pub fn type_string(&self) -> &'static str {
        self.section_type.as_str()
    }

    /// The section's flags word.
    pub fn flags(&self) -> SectionFlags {
        self.flags
    }

    /// The flags as concatenated single-character tokens.
    pub fn flags_string(&self) -> String {
        self.flags.as_string()
    }

    /// Virtual address for allocated sections, 0 otherwise.
    pub fn address(&self) -> u64 {
        self.addr
    }

    /// File offset of the section's payload.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Size of the section in bytes. For nobits sections this is the
    /// occupied memory size even though no payload bytes exist in the file.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The section-type-dependent `sh_link` cross-reference.
    pub fn link(&self) -> u32 {
        self.link
    }

    /// The section-type-dependent `sh_info` field.
    pub fn info(&self) -> u32 {
        self.info
    }

    /// Required address alignment.
    pub fn address_alignment(&self) -> u64 {
        self.addralign
    }

    /// Entry size for table-like sections, 0 otherwise.
    pub fn entry_size(&self) -> u64 {
        self.entsize
    }

    /// The payload bytes. Empty for null and nobits sections.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the null-terminated string starting at byte `offset` of the
    /// payload, or the empty string when `offset` is at or past the end of
    /// the payload (or the bytes there are not valid UTF-8).
    pub fn string_at(&self, offset: u64) -> &str {
        string_at_bytes(&self.data, offset)
    }

    /// The kind-specific view of this section.
    pub fn view(&self) -> &SectionView {
        &self.view
    }

    /// Check if this section is a string table.
    pub fn is_string_table(&self) -> bool {
        matches!(self.view, SectionView::StringTable)
    }

    /// The decoded dynamic table, if this is the dynamic section.
    pub fn dynamic_table(&self) -> Option<&DynamicTable> {
        match &self.view {
            SectionView::Dynamic(table) => Some(table),
            _ => None,
        }
    }

    /// The decoded symbol table, if this is a symbol section.
    pub fn symbol_table(&self) -> Option<&SymbolTable> {
        match &self.view {
            SectionView::Symbols(table) => Some(table),
            _ => None,
        }
    }

    /// The decoded relocation table, if this is a relocation section.
    pub fn relocation_table(&self) -> Option<&RelocationTable> {
        match &self.view {
            SectionView::Relocations(table) => Some(table),
            _ => None,
        }
    }

    /// The decoded note records, if this is a note section.
    pub fn note_table(&self) -> Option<&NoteTable> {
        match &self.view {
            SectionView::Notes(table) => Some(table),
            _ => None,
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_view(&mut self, view: SectionView) {
        self.view = view;
    }
}

fn header_size(class: ElfClass) -> usize {
    match class {
        ElfClass::Elf32 => Elf32Shdr::SIZE,
        ElfClass::Elf64 => Elf64Shdr::SIZE,
    }
}

/// The null-terminated string starting at `offset` in a string-table
/// payload; empty when `offset` is out of range or the bytes are not valid
/// UTF-8.
pub(crate) fn string_at_bytes(data: &[u8], offset: u64) -> &str {
    let Ok(start) = usize::try_from(offset) else {
        return "";
    };
    if start >= data.len() {
        return "";
    }
    let bytes = &data[start..];
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_type_conversion() {
        assert_eq!(SectionType::from(0), SectionType::Null);
        assert_eq!(SectionType::from(1), SectionType::Progbits);
        assert_eq!(SectionType::from(2), SectionType::Symtab);
        assert_eq!(SectionType::from(8), SectionType::Nobits);
        assert_eq!(SectionType::from(11), SectionType::Dynsym);
        assert_eq!(SectionType::from(0x6fff_fff6), SectionType::GnuHash);
        assert_eq!(SectionType::from(99999), SectionType::Unknown(99999));
    }

    #[test]
    fn test_section_type_tokens() {
        assert_eq!(SectionType::Progbits.as_str(), "PROGBITS");
        assert_eq!(SectionType::Nobits.as_str(), "NOBITS");
        assert_eq!(SectionType::Dynamic.as_str(), "DYNAMIC");
        assert_eq!(SectionType::Rela.as_str(), "RELA");
        assert_eq!(SectionType::Unknown(77).as_str(), "UNKOWN");
    }

    #[test]
    fn test_flags_string_canonical_order() {
        let flags = SectionFlags(SectionFlags::SHF_WRITE | SectionFlags::SHF_ALLOC);
        assert_eq!(flags.as_string(), "WA");

        let flags = SectionFlags(SectionFlags::SHF_ALLOC | SectionFlags::SHF_EXECINSTR);
        assert_eq!(flags.as_string(), "AX");

        let flags = SectionFlags(
            SectionFlags::SHF_TLS | SectionFlags::SHF_WRITE | SectionFlags::SHF_ALLOC,
        );
        assert_eq!(flags.as_string(), "WAT");

        assert_eq!(SectionFlags(0).as_string(), "");
    }

    #[test]
    fn test_flags_predicates() {
        let flags = SectionFlags(SectionFlags::SHF_ALLOC | SectionFlags::SHF_EXECINSTR);
        assert!(flags.is_allocated());
        assert!(flags.is_executable());
        assert!(!flags.is_writable());
        assert!(!flags.is_tls());
    }

    fn make_string_section(payload: &[u8]) -> Section {
        Section {
            index: 1,
            name: String::from(".strtab"),
            name_offset: 0,
            section_type: SectionType::Strtab,
            flags: SectionFlags(0),
            addr: 0,
            offset: 0,
            size: payload.len() as u64,
            link: 0,
            info: 0,
            addralign: 1,
            entsize: 0,
            data: payload.to_vec(),
            view: SectionView::StringTable,
        }
    }

    #[test]
    fn test_string_at() {
        let section = make_string_section(b"\0hello\0world\0");
        assert_eq!(section.string_at(0), "");
        assert_eq!(section.string_at(1), "hello");
        assert_eq!(section.string_at(3), "llo");
        assert_eq!(section.string_at(7), "world");
        assert_eq!(section.string_at(13), "");
        assert_eq!(section.string_at(100), "");
        assert_eq!(section.string_at(u64::MAX), "");
    }

    #[test]
    fn test_string_at_unterminated_tail() {
        // No trailing NUL: the string ends at the payload boundary.
        let section = make_string_section(b"\0abc");
        assert_eq!(section.string_at(1), "abc");
    }
}
