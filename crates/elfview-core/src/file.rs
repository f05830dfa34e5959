//! The top-level ELF file model.
//!
//! [`ElfFile::open`] runs the whole decode pipeline once: validate the
//! identification bytes, build the endianness converter, decode the file
//! header, load every section (resolving names through the section-header
//! string table and attaching the derived views in dependency order), load
//! every segment, and assign each section to the segments containing it.
//! The resulting model is immutable; accessors hand out borrowed
//! references and never fail.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dynamic::{DynamicTable, DynamicTag};
use crate::endian::EndianConverter;
use crate::header::{ElfClass, ElfData, FileHeader, ident};
use crate::note::NoteTable;
use crate::relocation::RelocationTable;
use crate::section::{Section, SectionType, SectionView};
use crate::segment::Segment;
use crate::symbol::{SHN_UNDEF, SymbolTable};
use crate::{EI_NIDENT, ELF_MAGIC, ElfError, ElfResult};

/// An ELF file decoded into an immutable in-memory model.
///
/// The model exclusively owns its segments and sections; derived views
/// live inside their section and stay valid as long as the model does.
/// Two models compare equal exactly when their paths are equal.
#[derive(Debug)]
pub struct ElfFile {
    path: PathBuf,
    class: ElfClass,
    encoding: ElfData,
    header: FileHeader,
    sections: Vec<Section>,
    segments: Vec<Segment>,
    string_section: Option<usize>,
    dynamic_section: Option<usize>,
    symbol_sections: Vec<usize>,
    relocation_sections: Vec<usize>,
    note_sections: Vec<usize>,
}

impl ElfFile {
    /// Opens and decodes the ELF file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InputNotAccessible`] when the file cannot be
    /// read, [`ElfError::BadMagic`], [`ElfError::InvalidClass`] or
    /// [`ElfError::InvalidEncoding`] when the identification bytes are
    /// unusable, and [`ElfError::Truncated`] when a structural header or
    /// payload extent lies outside the file image.
    pub fn open(path: impl AsRef<Path>) -> ElfResult<Self> {
        let path = path.as_ref().to_path_buf();
        let image = fs::read(&path).map_err(|source| ElfError::InputNotAccessible {
            path: path.clone(),
            source,
        })?;
        Self::from_image(path, &image)
    }

    fn from_image(path: PathBuf, image: &[u8]) -> ElfResult<Self> {
        if image.len() < EI_NIDENT || image[..4] != ELF_MAGIC {
            return Err(ElfError::BadMagic);
        }
        let class = ElfClass::try_from(image[ident::EI_CLASS]).map_err(ElfError::InvalidClass)?;
        let encoding =
            ElfData::try_from(image[ident::EI_DATA]).map_err(ElfError::InvalidEncoding)?;
        let conv = EndianConverter::new(encoding.is_little_endian());
        let header = FileHeader::parse(image, class, &conv)?;

        let mut file = Self {
            path,
            class,
            encoding,
            header,
            sections: Vec::new(),
            segments: Vec::new(),
            string_section: None,
            dynamic_section: None,
            symbol_sections: Vec::new(),
            relocation_sections: Vec::new(),
            note_sections: Vec::new(),
        };

        file.load_sections(image, &conv)?;
        file.resolve_section_names();
        file.attach_views(&conv);
        file.load_segments(image, &conv)?;
        Ok(file)
    }

    /// Decodes the section header table in ascending index order.
    fn load_sections(&mut self, image: &[u8], conv: &EndianConverter) -> ElfResult<()> {
        let count = self.header.section_header_count();
        let base = self.header.section_header_offset();
        let entry_size = u64::from(self.header.section_header_size());

        self.sections.reserve(count as usize);
        for i in 0..count {
            let offset = table_offset(base, u64::from(i), entry_size, image, "section header")?;
            let mut section = Section::parse(image, offset, i as usize, self.class, conv)?;
            if section.section_type() == SectionType::Strtab {
                section.set_view(SectionView::StringTable);
            }
            self.sections.push(section);
        }
        Ok(())
    }

    /// Resolves every section's name through the section-header string
    /// table, when the header designates one.
    fn resolve_section_names(&mut self) {
        let shstrndx = self.header.section_header_string_table_index();
        if shstrndx == SHN_UNDEF {
            return;
        }
        let strtab = shstrndx as usize;
        if strtab >= self.sections.len() {
            return;
        }
        self.string_section = Some(strtab);

        let names: Vec<String> = self
            .sections
            .iter()
            .map(|section| {
                self.sections[strtab]
                    .string_at(u64::from(section.name_offset()))
                    .to_string()
            })
            .collect();
        for (section, name) in self.sections.iter_mut().zip(names) {
            section.set_name(name);
        }
    }

    /// Builds the derived views: the dynamic table, then symbol tables,
    /// then the relocation tables referencing them, then note tables.
    fn attach_views(&mut self, conv: &EndianConverter) {
        if let Some(index) = self
            .sections
            .iter()
            .position(|s| s.section_type() == SectionType::Dynamic)
        {
            let table = {
                let section = &self.sections[index];
                DynamicTable::decode(index, section.data(), section.entry_size(), self.class, conv)
            };
            self.sections[index].set_view(SectionView::Dynamic(table));
            self.dynamic_section = Some(index);
        }

        for index in 0..self.sections.len() {
            if !matches!(
                self.sections[index].section_type(),
                SectionType::Symtab | SectionType::Dynsym
            ) {
                continue;
            }
            let link = self.sections[index].link() as usize;
            let table = {
                let section = &self.sections[index];
                let strtab = self
                    .sections
                    .get(link)
                    .map(Section::data)
                    .unwrap_or_default();
                SymbolTable::decode(
                    index,
                    link,
                    section.data(),
                    section.entry_size(),
                    strtab,
                    self.class,
                    conv,
                )
            };
            self.sections[index].set_view(SectionView::Symbols(table));
            self.symbol_sections.push(index);
        }

        let empty_symtab = SymbolTable::default();
        for index in 0..self.sections.len() {
            let section_type = self.sections[index].section_type();
            if !matches!(section_type, SectionType::Rel | SectionType::Rela) {
                continue;
            }
            let link = self.sections[index].link() as usize;
            let table = {
                let section = &self.sections[index];
                let symtab = self
                    .sections
                    .get(link)
                    .and_then(Section::symbol_table)
                    .unwrap_or(&empty_symtab);
                RelocationTable::decode(
                    index,
                    link,
                    section.data(),
                    section.entry_size(),
                    section_type == SectionType::Rela,
                    symtab,
                    self.class,
                    conv,
                )
            };
            self.sections[index].set_view(SectionView::Relocations(table));
            self.relocation_sections.push(index);
        }

        for index in 0..self.sections.len() {
            if self.sections[index].section_type() != SectionType::Note {
                continue;
            }
            let table = NoteTable::decode(index, self.sections[index].data(), conv);
            self.sections[index].set_view(SectionView::Notes(table));
            self.note_sections.push(index);
        }
    }

    /// Decodes the program header table and assigns to each segment the
    /// sections it contains: allocated sections by virtual-address
    /// containment, all others by file-offset containment.
    fn load_segments(&mut self, image: &[u8], conv: &EndianConverter) -> ElfResult<()> {
        let count = self.header.program_header_count();
        let base = self.header.program_header_offset();
        let entry_size = u64::from(self.header.program_header_size());

        self.segments.reserve(count as usize);
        for i in 0..count {
            let offset = table_offset(base, u64::from(i), entry_size, image, "program header")?;
            let mut segment = Segment::parse(image, offset, i as usize, self.class, conv)?;
            for section in &self.sections {
                if segment.contains(section) {
                    segment.add_section_index(section.index());
                }
            }
            self.segments.push(segment);
        }
        Ok(())
    }

    /// The path the model was constructed from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file's class.
    pub fn class(&self) -> ElfClass {
        self.class
    }

    /// Check if the file uses the 64-bit class.
    pub fn is_64bit(&self) -> bool {
        self.class.is_64bit()
    }

    /// The file's data encoding.
    pub fn encoding(&self) -> ElfData {
        self.encoding
    }

    /// Check if the file is little-endian.
    pub fn is_little_endian(&self) -> bool {
        self.encoding.is_little_endian()
    }

    /// The decoded file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// All sections in section-table order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// All segments in program-table order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The section-header string table section, if the header designates a
    /// valid one.
    pub fn string_section(&self) -> Option<&Section> {
        self.string_section.map(|i| &self.sections[i])
    }

    /// The dynamic section, if the file has one.
    pub fn dynamic_section(&self) -> Option<&Section> {
        self.dynamic_section.map(|i| &self.sections[i])
    }

    /// The decoded dynamic table, if the file has a dynamic section.
    pub fn dynamic_table(&self) -> Option<&DynamicTable> {
        self.dynamic_section().and_then(Section::dynamic_table)
    }

    /// The symbol sections (`SHT_SYMTAB`, `SHT_DYNSYM`) in table order.
    pub fn symbol_sections(&self) -> impl Iterator<Item = &Section> {
        self.symbol_sections.iter().map(|&i| &self.sections[i])
    }

    /// The relocation sections (`SHT_REL`, `SHT_RELA`) in table order.
    pub fn relocation_sections(&self) -> impl Iterator<Item = &Section> {
        self.relocation_sections.iter().map(|&i| &self.sections[i])
    }

    /// The note sections in table order.
    pub fn note_sections(&self) -> impl Iterator<Item = &Section> {
        self.note_sections.iter().map(|&i| &self.sections[i])
    }

    /// The libraries named by the dynamic section's `NEEDED` entries, in
    /// entry order, resolved against the string section the dynamic
    /// section links to. Empty when the file has no usable dynamic
    /// section.
    pub fn needed_libraries(&self) -> Vec<String> {
        let Some(section) = self.dynamic_section() else {
            return Vec::new();
        };
        let Some(table) = section.dynamic_table() else {
            return Vec::new();
        };
        let Some(strtab) = self.sections.get(section.link() as usize) else {
            return Vec::new();
        };
        table
            .entries()
            .iter()
            .filter(|entry| entry.tag == DynamicTag::Needed)
            .map(|entry| strtab.string_at(entry.value).to_string())
            .collect()
    }
}

impl fmt::Display for ElfFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ELFFile ({})", self.path.display())
    }
}

impl PartialEq for ElfFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ElfFile {}

/// Offset of the `index`-th entry of a header table, or the truncation
/// error when the arithmetic leaves the file image.
fn table_offset(
    base: u64,
    index: u64,
    entry_size: u64,
    image: &[u8],
    what: &'static str,
) -> ElfResult<u64> {
    index
        .checked_mul(entry_size)
        .and_then(|relative| base.checked_add(relative))
        .ok_or(ElfError::Truncated {
            what,
            offset: base,
            needed: usize::try_from(entry_size).unwrap_or(usize::MAX),
            available: image.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_image64() -> Vec<u8> {
        let mut image = vec![0u8; 64];
        image[0..4].copy_from_slice(&ELF_MAGIC);
        image[ident::EI_CLASS] = 2;
        image[ident::EI_DATA] = 1;
        image[ident::EI_VERSION] = 1;
        image[16] = 3; // ET_DYN
        image[18] = 62; // EM_X86_64
        image[20] = 1;
        image[52..54].copy_from_slice(&64u16.to_le_bytes());
        image
    }

    #[test]
    fn test_minimal_image_decodes() {
        let image = minimal_image64();
        let file = ElfFile::from_image(PathBuf::from("mem"), &image).unwrap();

        assert!(file.is_64bit());
        assert!(file.is_little_endian());
        assert_eq!(file.header().type_string(), "Shared Object");
        assert!(file.sections().is_empty());
        assert!(file.segments().is_empty());
        assert!(file.string_section().is_none());
        assert!(file.dynamic_section().is_none());
        assert_eq!(file.symbol_sections().count(), 0);
        assert_eq!(file.relocation_sections().count(), 0);
        assert_eq!(file.note_sections().count(), 0);
        assert!(file.needed_libraries().is_empty());
        assert_eq!(format!("{file}"), "ELFFile (mem)");
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut image = minimal_image64();
        image[0] = 0x7e;
        assert!(matches!(
            ElfFile::from_image(PathBuf::from("mem"), &image),
            Err(ElfError::BadMagic)
        ));

        // A file shorter than the identification bytes is not an ELF file.
        assert!(matches!(
            ElfFile::from_image(PathBuf::from("mem"), &[0x7f, b'E', b'L', b'F']),
            Err(ElfError::BadMagic)
        ));
    }

    #[test]
    fn test_invalid_class_rejected() {
        let mut image = minimal_image64();
        image[ident::EI_CLASS] = 3;
        assert!(matches!(
            ElfFile::from_image(PathBuf::from("mem"), &image),
            Err(ElfError::InvalidClass(3))
        ));
    }

    #[test]
    fn test_invalid_encoding_rejected() {
        let mut image = minimal_image64();
        image[ident::EI_DATA] = 0;
        assert!(matches!(
            ElfFile::from_image(PathBuf::from("mem"), &image),
            Err(ElfError::InvalidEncoding(0))
        ));
    }

    #[test]
    fn test_section_table_outside_image_rejected() {
        let mut image = minimal_image64();
        // e_shoff far past the end, e_shentsize/e_shnum nonzero
        image[40..48].copy_from_slice(&0xFFFF_0000u64.to_le_bytes());
        image[58..60].copy_from_slice(&64u16.to_le_bytes());
        image[60..62].copy_from_slice(&1u16.to_le_bytes());
        assert!(matches!(
            ElfFile::from_image(PathBuf::from("mem"), &image),
            Err(ElfError::Truncated {
                what: "section header",
                ..
            })
        ));
    }
}
