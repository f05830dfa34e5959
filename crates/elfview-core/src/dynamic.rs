//! Dynamic section decoding.
//!
//! The dynamic section is a table of `(tag, value)` pairs describing
//! dynamic-linking metadata. Whether a value is an integer, an address, or
//! ignored is determined by a closed tag→kind mapping.

use crate::endian::EndianConverter;
use crate::header::ElfClass;
use crate::raw::{Elf32Dyn, Elf64Dyn};

/// Dynamic table entry tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicTag {
    Null,
    Needed,
    PltRelSz,
    PltGot,
    Hash,
    StrTab,
    SymTab,
    Rela,
    RelaSz,
    RelaEnt,
    StrSz,
    SymEnt,
    Init,
    Fini,
    SoName,
    RPath,
    Symbolic,
    Rel,
    RelSz,
    RelEnt,
    PltRel,
    Debug,
    TextRel,
    JmpRel,
    BindNow,
    InitArray,
    InitArraySz,
    FiniArray,
    FiniArraySz,
    RunPath,
    Flags,
    PreinitArray,
    PreinitArraySz,
    GnuHash,
    VerNeed,
    VerNeedNum,
    VerSym,
    RelaCount,
    /// Tag outside the known set, carrying its raw value.
    Unknown(i64),
}

impl DynamicTag {
    /// Maps a raw `d_tag` value to its tag.
    pub fn from_raw(value: i64) -> Self {
        match value {
            0 => Self::Null,
            1 => Self::Needed,
            2 => Self::PltRelSz,
            3 => Self::PltGot,
            4 => Self::Hash,
            5 => Self::StrTab,
            6 => Self::SymTab,
            7 => Self::Rela,
            8 => Self::RelaSz,
            9 => Self::RelaEnt,
            10 => Self::StrSz,
            11 => Self::SymEnt,
            12 => Self::Init,
            13 => Self::Fini,
            14 => Self::SoName,
            15 => Self::RPath,
            16 => Self::Symbolic,
            17 => Self::Rel,
            18 => Self::RelSz,
            19 => Self::RelEnt,
            20 => Self::PltRel,
            21 => Self::Debug,
            22 => Self::TextRel,
            23 => Self::JmpRel,
            24 => Self::BindNow,
            25 => Self::InitArray,
            26 => Self::FiniArray,
            27 => Self::InitArraySz,
            28 => Self::FiniArraySz,
            29 => Self::RunPath,
            30 => Self::Flags,
            32 => Self::PreinitArray,
            33 => Self::PreinitArraySz,
            0x6fff_fef5 => Self::GnuHash,
            0x6fff_fff0 => Self::VerSym,
            0x6fff_fff9 => Self::RelaCount,
            0x6fff_fffe => Self::VerNeed,
            0x6fff_ffff => Self::VerNeedNum,
            other => Self::Unknown(other),
        }
    }

    /// The printable token for this tag, empty for unknown tags.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Needed => "NEEDED",
            Self::PltRelSz => "PLTRELSZ",
            Self::PltGot => "PLTGOT",
            Self::Hash => "HASH",
            Self::StrTab => "STRTAB",
            Self::SymTab => "SYMTAB",
            Self::Rela => "RELA",
            Self::RelaSz => "RELASZ",
            Self::RelaEnt => "RELAENT",
            Self::StrSz => "STRSZ",
            Self::SymEnt => "SYMENT",
            Self::Init => "INIT",
            Self::Fini => "FINI",
            Self::SoName => "SONAME",
            Self::RPath => "RPATH",
            Self::Symbolic => "SYMBOLIC",
            Self::Rel => "REL",
            Self::RelSz => "RELSZ",
            Self::RelEnt => "RELENT",
            Self::PltRel => "PLTREL",
            Self::Debug => "DEBUG",
            Self::TextRel => "TEXTREL",
            Self::JmpRel => "JMPREL",
            Self::BindNow => "BIND_NOW",
            Self::InitArray => "INIT_ARRAY",
            Self::InitArraySz => "INIT_ARRAYSZ",
            Self::FiniArray => "FINI_ARRAY",
            Self::FiniArraySz => "FINI_ARRAYSZ",
            Self::RunPath => "RUNPATH",
            Self::Flags => "FLAGS",
            Self::PreinitArray => "PREINIT_ARRAY",
            Self::PreinitArraySz => "PREINIT_ARRAYSZ",
            Self::GnuHash => "GNU_HASH",
            Self::VerNeed => "VERNEED",
            Self::VerNeedNum => "VERNEEDNUM",
            Self::VerSym => "VERSYM",
            Self::RelaCount => "RELACOUNT",
            Self::Unknown(_) => "",
        }
    }

    /// How this tag's value is interpreted.
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::Null | Self::Symbolic | Self::TextRel | Self::BindNow => ValueKind::Ignored,
            Self::Needed
            | Self::PltRelSz
            | Self::RelaSz
            | Self::RelaEnt
            | Self::StrSz
            | Self::SymEnt
            | Self::SoName
            | Self::RPath
            | Self::RelSz
            | Self::RelEnt
            | Self::PltRel
            | Self::InitArraySz
            | Self::FiniArraySz
            | Self::RunPath
            | Self::Flags
            | Self::PreinitArraySz => ValueKind::Integer,
            _ => ValueKind::Address,
        }
    }
}

/// Interpretation of a dynamic entry's value field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// The value is 0 by definition.
    Ignored,
    /// The value is a size or other integer.
    Integer,
    /// The value is a virtual address or pointer.
    Address,
}

/// A single `(tag, value)` pair of the dynamic section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicEntry {
    /// The entry's tag.
    pub tag: DynamicTag,
    /// The entry's value; 0 for tags whose value is ignored.
    pub value: u64,
}

impl DynamicEntry {
    /// The tag's printable token, empty for unknown tags.
    pub fn tag_string(&self) -> &'static str {
        self.tag.as_str()
    }
}

/// Decoded dynamic section.
#[derive(Debug, Clone, Default)]
pub struct DynamicTable {
    section_index: usize,
    entries: Vec<DynamicEntry>,
}

impl DynamicTable {
    /// Decodes the dynamic table from a section payload. The entry count is
    /// `data.len() / entry_size` (zero when the entry size is zero); a
    /// trailing partial record is ignored.
    pub(crate) fn decode(
        section_index: usize,
        data: &[u8],
        entry_size: u64,
        class: ElfClass,
        conv: &EndianConverter,
    ) -> Self {
        let mut entries = Vec::new();
        let Ok(entry_size) = usize::try_from(entry_size) else {
            return Self {
                section_index,
                entries,
            };
        };
        if entry_size == 0 {
            return Self {
                section_index,
                entries,
            };
        }

        let count = data.len() / entry_size;
        entries.reserve(count);
        for i in 0..count {
            let start = i * entry_size;
            let (tag, value) = match class {
                ElfClass::Elf32 => match Elf32Dyn::parse(&data[start..]) {
                    Some(raw) => (i64::from(conv.i32(raw.d_tag)), u64::from(conv.u32(raw.d_un))),
                    None => break,
                },
                ElfClass::Elf64 => match Elf64Dyn::parse(&data[start..]) {
                    Some(raw) => (conv.i64(raw.d_tag), conv.u64(raw.d_un)),
                    None => break,
                },
            };
            let tag = DynamicTag::from_raw(tag);
            let value = match tag.value_kind() {
                ValueKind::Ignored => 0,
                ValueKind::Integer | ValueKind::Address => value,
            };
            entries.push(DynamicEntry { tag, value });
        }

        Self {
            section_index,
            entries,
        }
    }

    /// Index of the backing section in the file's section table.
    pub fn section_index(&self) -> usize {
        self.section_index
    }

    /// Number of decoded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at `index`, or `None` when out of range.
    pub fn entry(&self, index: usize) -> Option<&DynamicEntry> {
        self.entries.get(index)
    }

    /// All decoded entries in table order.
    pub fn entries(&self) -> &[DynamicEntry] {
        &self.entries
    }
}
