//! Symbol table decoding.
//!
//! Symbol sections (`SHT_SYMTAB`, `SHT_DYNSYM`) are tables of fixed-size
//! entries whose name field is an offset into the string section named by
//! the symbol section's `sh_link`. Names are resolved once, at decode time.

use crate::endian::EndianConverter;
use crate::header::ElfClass;
use crate::raw::{Elf32Sym, Elf64Sym};
use crate::section::string_at_bytes;

/// The undefined-section sentinel for `st_shndx` (and for the file
/// header's string-table index).
pub const SHN_UNDEF: u16 = 0;

/// Symbol binding (scope), the high nibble of `st_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolBinding {
    /// Not visible outside the object file
    Local,
    /// Visible to all objects
    Global,
    /// Global, but may be overridden
    Weak,
    /// Unknown binding
    Unknown(u8),
}

impl From<u8> for SymbolBinding {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Local,
            1 => Self::Global,
            2 => Self::Weak,
            other => Self::Unknown(other),
        }
    }
}

impl SymbolBinding {
    /// The printable token for this binding.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Global => "GLOBAL",
            Self::Weak => "WEAK",
            // Original token, misspelling intentional.
            Self::Unknown(_) => "UNKOWN",
        }
    }
}

/// Symbol type, the low nibble of `st_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Unspecified
    NoType,
    /// Data object
    Object,
    /// Function
    Func,
    /// Section
    Section,
    /// Source file name
    File,
    /// Common block
    Common,
    /// Thread-local storage object
    Tls,
    /// Unknown type
    Unknown(u8),
}

impl From<u8> for SymbolKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::NoType,
            1 => Self::Object,
            2 => Self::Func,
            3 => Self::Section,
            4 => Self::File,
            5 => Self::Common,
            6 => Self::Tls,
            other => Self::Unknown(other),
        }
    }
}

impl SymbolKind {
    /// The printable token for this symbol type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoType => "NOTYPE",
            Self::Object => "OBJECT",
            Self::Func => "FUNC",
            Self::Section => "SECTION",
            Self::File => "FILE",
            Self::Common => "COMMON",
            Self::Tls => "TLS",
            // Original token, misspelling intentional.
            Self::Unknown(_) => "UNKOWN",
        }
    }
}

/// One decoded symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// The symbol's name, resolved from the linked string section.
    pub name: String,
    /// The symbol's value (an address for most symbol kinds).
    pub value: u64,
    /// The symbol's size in bytes.
    pub size: u64,
    /// The symbol's binding.
    pub binding: SymbolBinding,
    /// The symbol's type.
    pub kind: SymbolKind,
    /// Index of the section the symbol is defined in, or [`SHN_UNDEF`].
    pub section_index: u16,
    /// The raw `st_other` byte.
    pub other: u8,
}

impl Symbol {
    /// The binding's printable token.
    pub fn bind_string(&self) -> &'static str {
        self.binding.as_str()
    }

    /// The type's printable token.
    pub fn type_string(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Check if the symbol is undefined (section index is the sentinel).
    pub fn is_undefined(&self) -> bool {
        self.section_index == SHN_UNDEF
    }
}

/// Decoded symbol section.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    section_index: usize,
    string_section_index: usize,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Decodes a symbol table from a section payload. `strtab` is the
    /// payload of the string section named by the symbol section's
    /// `sh_link`; every name offset is resolved against it. The entry
    /// count is `data.len() / entry_size` (zero when the entry size is
    /// zero); a trailing partial record is ignored.
    pub(crate) fn decode(
        section_index: usize,
        string_section_index: usize,
        data: &[u8],
        entry_size: u64,
        strtab: &[u8],
        class: ElfClass,
        conv: &EndianConverter,
    ) -> Self {
        let mut symbols = Vec::new();
        let Ok(entry_size) = usize::try_from(entry_size) else {
            return Self {
                section_index,
                string_section_index,
                symbols,
            };
        };
        if entry_size == 0 {
            return Self {
                section_index,
                string_section_index,
                symbols,
            };
        }

        let count = data.len() / entry_size;
        symbols.reserve(count);
        for i in 0..count {
            let start = i * entry_size;
            let symbol = match class {
                ElfClass::Elf32 => match Elf32Sym::parse(&data[start..]) {
                    Some(raw) => Symbol {
                        name: string_at_bytes(strtab, u64::from(conv.u32(raw.st_name))).to_string(),
                        value: u64::from(conv.u32(raw.st_value)),
                        size: u64::from(conv.u32(raw.st_size)),
                        binding: SymbolBinding::from(raw.st_info >> 4),
                        kind: SymbolKind::from(raw.st_info & 0xf),
                        section_index: conv.u16(raw.st_shndx),
                        other: raw.st_other,
                    },
                    None => break,
                },
                ElfClass::Elf64 => match Elf64Sym::parse(&data[start..]) {
                    Some(raw) => Symbol {
                        name: string_at_bytes(strtab, u64::from(conv.u32(raw.st_name))).to_string(),
                        value: conv.u64(raw.st_value),
                        size: conv.u64(raw.st_size),
                        binding: SymbolBinding::from(raw.st_info >> 4),
                        kind: SymbolKind::from(raw.st_info & 0xf),
                        section_index: conv.u16(raw.st_shndx),
                        other: raw.st_other,
                    },
                    None => break,
                },
            };
            symbols.push(symbol);
        }

        Self {
            section_index,
            string_section_index,
            symbols,
        }
    }

    /// Index of the backing section in the file's section table.
    pub fn section_index(&self) -> usize {
        self.section_index
    }

    /// Index of the linked string section.
    pub fn string_section_index(&self) -> usize {
        self.string_section_index
    }

    /// Number of decoded symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if the table has no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The symbol at `index`, or `None` when out of range.
    pub fn symbol(&self, index: usize) -> Option<&Symbol> {
        self.symbols.get(index)
    }

    /// All decoded symbols in table order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_conv() -> EndianConverter {
        EndianConverter::new(true)
    }

    fn make_sym64(name: u32, info: u8, shndx: u16, value: u64, size: u64) -> [u8; 24] {
        let mut data = [0u8; 24];
        data[0..4].copy_from_slice(&name.to_le_bytes());
        data[4] = info;
        data[6..8].copy_from_slice(&shndx.to_le_bytes());
        data[8..16].copy_from_slice(&value.to_le_bytes());
        data[16..24].copy_from_slice(&size.to_le_bytes());
        data
    }

    const STRTAB: &[u8] = b"\0main\0_start\0";

    #[test]
    fn test_binding_and_kind_conversion() {
        assert_eq!(SymbolBinding::from(0), SymbolBinding::Local);
        assert_eq!(SymbolBinding::from(1), SymbolBinding::Global);
        assert_eq!(SymbolBinding::from(2), SymbolBinding::Weak);
        assert_eq!(SymbolBinding::from(9), SymbolBinding::Unknown(9));

        assert_eq!(SymbolKind::from(0), SymbolKind::NoType);
        assert_eq!(SymbolKind::from(1), SymbolKind::Object);
        assert_eq!(SymbolKind::from(2), SymbolKind::Func);
        assert_eq!(SymbolKind::from(6), SymbolKind::Tls);
        assert_eq!(SymbolKind::from(10), SymbolKind::Unknown(10));
    }

    #[test]
    fn test_tokens() {
        assert_eq!(SymbolBinding::Local.as_str(), "LOCAL");
        assert_eq!(SymbolBinding::Global.as_str(), "GLOBAL");
        assert_eq!(SymbolBinding::Weak.as_str(), "WEAK");
        assert_eq!(SymbolBinding::Unknown(5).as_str(), "UNKOWN");

        assert_eq!(SymbolKind::NoType.as_str(), "NOTYPE");
        assert_eq!(SymbolKind::Object.as_str(), "OBJECT");
        assert_eq!(SymbolKind::Func.as_str(), "FUNC");
        assert_eq!(SymbolKind::Unknown(9).as_str(), "UNKOWN");
    }

    #[test]
    fn test_decode_symbols() {
        let mut data = Vec::new();
        data.extend_from_slice(&make_sym64(0, 0, 0, 0, 0)); // null entry
        // GLOBAL | FUNC, defined in section 4
        data.extend_from_slice(&make_sym64(1, 0x12, 4, 0x40_0100, 0x20));
        // WEAK | OBJECT, undefined
        data.extend_from_slice(&make_sym64(6, 0x21, 0, 0, 8));

        let table = SymbolTable::decode(2, 1, &data, 24, STRTAB, ElfClass::Elf64, &le_conv());
        assert_eq!(table.len(), 3);
        assert_eq!(table.section_index(), 2);
        assert_eq!(table.string_section_index(), 1);

        // Index 0 is the conventional null symbol.
        let null = table.symbol(0).unwrap();
        assert_eq!(null.name, "");
        assert_eq!(null.value, 0);
        assert_eq!(null.size, 0);
        assert_eq!(null.other, 0);
        assert_eq!(null.binding, SymbolBinding::Local);
        assert_eq!(null.kind, SymbolKind::NoType);
        assert_eq!(null.section_index, SHN_UNDEF);

        let main = table.symbol(1).unwrap();
        assert_eq!(main.name, "main");
        assert_eq!(main.value, 0x40_0100);
        assert_eq!(main.size, 0x20);
        assert_eq!(main.binding, SymbolBinding::Global);
        assert_eq!(main.kind, SymbolKind::Func);
        assert_eq!(main.bind_string(), "GLOBAL");
        assert_eq!(main.type_string(), "FUNC");
        assert_eq!(main.section_index, 4);
        assert!(!main.is_undefined());

        let start = table.symbol(2).unwrap();
        assert_eq!(start.name, "_start");
        assert_eq!(start.binding, SymbolBinding::Weak);
        assert_eq!(start.kind, SymbolKind::Object);
        assert!(start.is_undefined());

        assert!(table.symbol(3).is_none());
    }

    #[test]
    fn test_decode_32bit_symbol_layout() {
        // Elf32_Sym places value and size before info/other/shndx.
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_le_bytes()); // st_name -> "main"
        data.extend_from_slice(&0x0804_8400u32.to_le_bytes()); // st_value
        data.extend_from_slice(&0x40u32.to_le_bytes()); // st_size
        data.push(0x12); // st_info = GLOBAL | FUNC
        data.push(0); // st_other
        data.extend_from_slice(&3u16.to_le_bytes()); // st_shndx

        let table = SymbolTable::decode(1, 0, &data, 16, STRTAB, ElfClass::Elf32, &le_conv());
        assert_eq!(table.len(), 1);
        let sym = table.symbol(0).unwrap();
        assert_eq!(sym.name, "main");
        assert_eq!(sym.value, 0x0804_8400);
        assert_eq!(sym.size, 0x40);
        assert_eq!(sym.binding, SymbolBinding::Global);
        assert_eq!(sym.kind, SymbolKind::Func);
        assert_eq!(sym.section_index, 3);
    }

    #[test]
    fn test_name_offset_out_of_range_is_empty() {
        let data = make_sym64(1000, 0x12, 1, 0, 0);
        let table = SymbolTable::decode(0, 0, &data, 24, STRTAB, ElfClass::Elf64, &le_conv());
        assert_eq!(table.symbol(0).unwrap().name, "");
    }

    #[test]
    fn test_zero_entry_size_yields_empty_table() {
        let data = make_sym64(0, 0, 0, 0, 0);
        let table = SymbolTable::decode(0, 0, &data, 0, STRTAB, ElfClass::Elf64, &le_conv());
        assert!(table.is_empty());
        assert!(table.symbol(0).is_none());
    }
}
