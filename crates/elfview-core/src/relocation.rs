//! Relocation table decoding.
//!
//! Relocation sections (`SHT_REL`, `SHT_RELA`) are tables of entries whose
//! `r_info` word packs a relocation type together with an index into the
//! symbol table named by the section's `sh_link`. The split differs by
//! class: low byte / high bytes for 32-bit files, low and high 32-bit
//! halves for 64-bit files. Each entry's symbol reference is fetched once
//! at decode time.

use crate::endian::EndianConverter;
use crate::header::ElfClass;
use crate::raw::{Elf32Rel, Elf32Rela, Elf64Rel, Elf64Rela};
use crate::symbol::{Symbol, SymbolTable};

/// Extracts the symbol index from an `r_info` word.
pub fn r_sym(info: u64, class: ElfClass) -> u32 {
    match class {
        ElfClass::Elf32 => (info as u32) >> 8,
        ElfClass::Elf64 => (info >> 32) as u32,
    }
}

/// Extracts the relocation type from an `r_info` word.
pub fn r_type(info: u64, class: ElfClass) -> u32 {
    match class {
        ElfClass::Elf32 => (info as u32) & 0xff,
        ElfClass::Elf64 => (info & 0xffff_ffff) as u32,
    }
}

/// One decoded relocation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationEntry {
    /// Location the relocation applies to.
    pub offset: u64,
    /// The raw packed type/symbol word.
    pub info: u64,
    /// Machine-specific relocation type extracted from `info`.
    pub rtype: u32,
    /// Index into the linked symbol table extracted from `info`.
    pub symbol_index: u32,
    /// Explicit addend; 0 for entries without addends.
    pub addend: i64,
    /// The referenced symbol, absent when `symbol_index` is out of range.
    pub symbol: Option<Symbol>,
}

/// Decoded relocation section.
#[derive(Debug, Clone, Default)]
pub struct RelocationTable {
    section_index: usize,
    symbol_section_index: usize,
    entries: Vec<RelocationEntry>,
}

impl RelocationTable {
    /// Decodes a relocation table from a section payload. `with_addend`
    /// selects the rela layout; `symtab` is the decoded table of the symbol
    /// section named by this section's `sh_link`. The entry count is
    /// `data.len() / entry_size` (zero when the entry size is zero); a
    /// trailing partial record is ignored.
    pub(crate) fn decode(
        section_index: usize,
        symbol_section_index: usize,
        data: &[u8],
        entry_size: u64,
        with_addend: bool,
        symtab: &SymbolTable,
        class: ElfClass,
        conv: &EndianConverter,
    ) -> Self {
        let mut entries = Vec::new();
        let Ok(entry_size) = usize::try_from(entry_size) else {
            return Self {
                section_index,
                symbol_section_index,
                entries,
            };
        };
        if entry_size == 0 {
            return Self {
                section_index,
                symbol_section_index,
                entries,
            };
        }

        let count = data.len() / entry_size;
        entries.reserve(count);
        for i in 0..count {
            let start = i * entry_size;
            let decoded = match (class, with_addend) {
                (ElfClass::Elf32, false) => Elf32Rel::parse(&data[start..])
                    .map(|raw| (u64::from(conv.u32(raw.r_offset)), u64::from(conv.u32(raw.r_info)), 0i64)),
                (ElfClass::Elf32, true) => Elf32Rela::parse(&data[start..]).map(|raw| {
                    (
                        u64::from(conv.u32(raw.r_offset)),
                        u64::from(conv.u32(raw.r_info)),
                        i64::from(conv.i32(raw.r_addend)),
                    )
                }),
                (ElfClass::Elf64, false) => Elf64Rel::parse(&data[start..])
                    .map(|raw| (conv.u64(raw.r_offset), conv.u64(raw.r_info), 0i64)),
                (ElfClass::Elf64, true) => Elf64Rela::parse(&data[start..]).map(|raw| {
                    (
                        conv.u64(raw.r_offset),
                        conv.u64(raw.r_info),
                        conv.i64(raw.r_addend),
                    )
                }),
            };
            let Some((offset, info, addend)) = decoded else {
                break;
            };

            let symbol_index = r_sym(info, class);
            entries.push(RelocationEntry {
                offset,
                info,
                rtype: r_type(info, class),
                symbol_index,
                addend,
                symbol: symtab.symbol(symbol_index as usize).cloned(),
            });
        }

        Self {
            section_index,
            symbol_section_index,
            entries,
        }
    }

    /// Index of the backing section in the file's section table.
    pub fn section_index(&self) -> usize {
        self.section_index
    }

    /// Index of the linked symbol section.
    pub fn symbol_section_index(&self) -> usize {
        self.symbol_section_index
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
    pub fn entry(&self, index: usize) -> Option<&RelocationEntry> {
        self.entries.get(index)
    }

    /// All decoded entries in table order.
    pub fn entries(&self) -> &[RelocationEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_conv() -> EndianConverter {
        EndianConverter::new(true)
    }

    fn make_symtab() -> SymbolTable {
        let strtab = b"\0puts\0exit\0";
        let mut data = Vec::new();
        // null entry, then GLOBAL|FUNC "puts" and "exit"
        data.extend_from_slice(&[0u8; 24]);
        for (name, value) in [(1u32, 0x40_1000u64), (6, 0x40_1010)] {
            let mut sym = [0u8; 24];
            sym[0..4].copy_from_slice(&name.to_le_bytes());
            sym[4] = 0x12;
            sym[6..8].copy_from_slice(&1u16.to_le_bytes());
            sym[8..16].copy_from_slice(&value.to_le_bytes());
            data.extend_from_slice(&sym);
        }
        SymbolTable::decode(2, 1, &data, 24, strtab, ElfClass::Elf64, &le_conv())
    }

    #[test]
    fn test_info_extraction_64bit() {
        let info: u64 = (7 << 32) | 6;
        assert_eq!(r_sym(info, ElfClass::Elf64), 7);
        assert_eq!(r_type(info, ElfClass::Elf64), 6);
    }

    #[test]
    fn test_info_extraction_32bit() {
        // R_386 split: symbol in the high bytes, type in the low byte.
        let info: u64 = (1799 << 8) as u64 | 7;
        assert_eq!(r_sym(info, ElfClass::Elf32), 1799);
        assert_eq!(r_type(info, ElfClass::Elf32), 7);
    }

    #[test]
    fn test_decode_rela64() {
        let symtab = make_symtab();
        let mut data = Vec::new();
        for (offset, info, addend) in [
            (0x60_0ff8u64, (1u64 << 32) | 6, 0i64), // GLOB_DAT -> puts
            (0x60_1000, (2u64 << 32) | 7, 8),       // JUMP_SLOT -> exit
        ] {
            data.extend_from_slice(&offset.to_le_bytes());
            data.extend_from_slice(&info.to_le_bytes());
            data.extend_from_slice(&addend.to_le_bytes());
        }

        let table =
            RelocationTable::decode(4, 2, &data, 24, true, &symtab, ElfClass::Elf64, &le_conv());
        assert_eq!(table.len(), 2);
        assert_eq!(table.section_index(), 4);
        assert_eq!(table.symbol_section_index(), 2);

        let entry = table.entry(0).unwrap();
        assert_eq!(entry.offset, 0x60_0ff8);
        assert_eq!(entry.rtype, 6);
        assert_eq!(entry.symbol_index, 1);
        assert_eq!(entry.addend, 0);
        assert_eq!(entry.symbol.as_ref().unwrap().name, "puts");
        assert_eq!(entry.symbol.as_ref().unwrap().value, 0x40_1000);

        let entry = table.entry(1).unwrap();
        assert_eq!(entry.addend, 8);
        assert_eq!(entry.symbol.as_ref().unwrap().name, "exit");

        assert!(table.entry(2).is_none());
    }

    #[test]
    fn test_decode_rel32_has_zero_addend() {
        let symtab = make_symtab();
        let mut data = Vec::new();
        let info: u32 = (1 << 8) | 7; // symbol 1, R_386_JMP_SLOT
        data.extend_from_slice(&0x0804_9000u32.to_le_bytes());
        data.extend_from_slice(&info.to_le_bytes());

        let table =
            RelocationTable::decode(3, 2, &data, 8, false, &symtab, ElfClass::Elf32, &le_conv());
        assert_eq!(table.len(), 1);
        let entry = table.entry(0).unwrap();
        assert_eq!(entry.offset, 0x0804_9000);
        assert_eq!(entry.rtype, 7);
        assert_eq!(entry.symbol_index, 1);
        assert_eq!(entry.addend, 0);
        assert_eq!(entry.symbol.as_ref().unwrap().name, "puts");
    }

    #[test]
    fn test_out_of_range_symbol_is_absent() {
        let symtab = make_symtab();
        let mut data = Vec::new();
        data.extend_from_slice(&0u64.to_le_bytes());
        data.extend_from_slice(&((99u64 << 32) | 1).to_le_bytes());
        data.extend_from_slice(&0i64.to_le_bytes());

        let table =
            RelocationTable::decode(0, 2, &data, 24, true, &symtab, ElfClass::Elf64, &le_conv());
        assert_eq!(table.len(), 1);
        let entry = table.entry(0).unwrap();
        assert_eq!(entry.symbol_index, 99);
        assert!(entry.symbol.is_none());
    }

    #[test]
    fn test_entry_symbol_index_matches_info() {
        let symtab = make_symtab();
        let mut data = Vec::new();
        for sym in 0u64..3 {
            data.extend_from_slice(&0u64.to_le_bytes());
            data.extend_from_slice(&((sym << 32) | 8).to_le_bytes());
            data.extend_from_slice(&0i64.to_le_bytes());
        }
        let table =
            RelocationTable::decode(0, 2, &data, 24, true, &symtab, ElfClass::Elf64, &le_conv());
        for entry in table.entries() {
            assert_eq!(entry.symbol_index, r_sym(entry.info, ElfClass::Elf64));
            assert_eq!(entry.rtype, r_type(entry.info, ElfClass::Elf64));
        }
    }
}
