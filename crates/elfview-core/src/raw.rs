//! Raw on-disk layouts of the ELF structures.
//!
//! These structs mirror the System V gABI `Elf{32,64}_*` records
//! field-for-field. They are passive data: `parse` extracts each field in
//! *native* byte order from exactly [`SIZE`](Elf32Ehdr::SIZE) bytes, and the
//! [`EndianConverter`](crate::endian::EndianConverter) is applied later,
//! when the typed model widens the fields. Invariants are checked only by
//! the typed decoders.
//!
//! The 32- and 64-bit variants of a structure differ in field widths and,
//! for program headers and symbols, in field order. Each layout carries its
//! on-disk size as a `SIZE` constant and a `parse` that extracts the record
//! from the first `SIZE` bytes of a slice, returning `None` on short input.

use crate::EI_NIDENT;

fn ne_u16(d: &[u8], o: usize) -> u16 {
    u16::from_ne_bytes([d[o], d[o + 1]])
}

fn ne_u32(d: &[u8], o: usize) -> u32 {
    u32::from_ne_bytes([d[o], d[o + 1], d[o + 2], d[o + 3]])
}

fn ne_u64(d: &[u8], o: usize) -> u64 {
    u64::from_ne_bytes([
        d[o],
        d[o + 1],
        d[o + 2],
        d[o + 3],
        d[o + 4],
        d[o + 5],
        d[o + 6],
        d[o + 7],
    ])
}

fn ne_i32(d: &[u8], o: usize) -> i32 {
    ne_u32(d, o) as i32
}

fn ne_i64(d: &[u8], o: usize) -> i64 {
    ne_u64(d, o) as i64
}

/// 32-bit file header (`Elf32_Ehdr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32Ehdr {
    pub e_ident: [u8; EI_NIDENT],
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u32,
    pub e_phoff: u32,
    pub e_shoff: u32,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl Elf32Ehdr {
    pub const SIZE: usize = 52;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        let mut e_ident = [0u8; EI_NIDENT];
        e_ident.copy_from_slice(&data[..EI_NIDENT]);
        Some(Self {
            e_ident,
            e_type: ne_u16(data, 16),
            e_machine: ne_u16(data, 18),
            e_version: ne_u32(data, 20),
            e_entry: ne_u32(data, 24),
            e_phoff: ne_u32(data, 28),
            e_shoff: ne_u32(data, 32),
            e_flags: ne_u32(data, 36),
            e_ehsize: ne_u16(data, 40),
            e_phentsize: ne_u16(data, 42),
            e_phnum: ne_u16(data, 44),
            e_shentsize: ne_u16(data, 46),
            e_shnum: ne_u16(data, 48),
            e_shstrndx: ne_u16(data, 50),
        })
    }
}

/// 64-bit file header (`Elf64_Ehdr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Ehdr {
    pub e_ident: [u8; EI_NIDENT],
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl Elf64Ehdr {
    pub const SIZE: usize = 64;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        let mut e_ident = [0u8; EI_NIDENT];
        e_ident.copy_from_slice(&data[..EI_NIDENT]);
        Some(Self {
            e_ident,
            e_type: ne_u16(data, 16),
            e_machine: ne_u16(data, 18),
            e_version: ne_u32(data, 20),
            e_entry: ne_u64(data, 24),
            e_phoff: ne_u64(data, 32),
            e_shoff: ne_u64(data, 40),
            e_flags: ne_u32(data, 48),
            e_ehsize: ne_u16(data, 52),
            e_phentsize: ne_u16(data, 54),
            e_phnum: ne_u16(data, 56),
            e_shentsize: ne_u16(data, 58),
            e_shnum: ne_u16(data, 60),
            e_shstrndx: ne_u16(data, 62),
        })
    }
}

/// 32-bit section header (`Elf32_Shdr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32Shdr {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u32,
    pub sh_addr: u32,
    pub sh_offset: u32,
    pub sh_size: u32,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u32,
    pub sh_entsize: u32,
}

impl Elf32Shdr {
    pub const SIZE: usize = 40;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            sh_name: ne_u32(data, 0),
            sh_type: ne_u32(data, 4),
            sh_flags: ne_u32(data, 8),
            sh_addr: ne_u32(data, 12),
            sh_offset: ne_u32(data, 16),
            sh_size: ne_u32(data, 20),
            sh_link: ne_u32(data, 24),
            sh_info: ne_u32(data, 28),
            sh_addralign: ne_u32(data, 32),
            sh_entsize: ne_u32(data, 36),
        })
    }
}

/// 64-bit section header (`Elf64_Shdr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Shdr {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

impl Elf64Shdr {
    pub const SIZE: usize = 64;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            sh_name: ne_u32(data, 0),
            sh_type: ne_u32(data, 4),
            sh_flags: ne_u64(data, 8),
            sh_addr: ne_u64(data, 16),
            sh_offset: ne_u64(data, 24),
            sh_size: ne_u64(data, 32),
            sh_link: ne_u32(data, 40),
            sh_info: ne_u32(data, 44),
            sh_addralign: ne_u64(data, 48),
            sh_entsize: ne_u64(data, 56),
        })
    }
}

/// 32-bit program header (`Elf32_Phdr`). Note that `p_flags` sits at the
/// end of the record here, but directly after `p_type` in the 64-bit
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32Phdr {
    pub p_type: u32,
    pub p_offset: u32,
    pub p_vaddr: u32,
    pub p_paddr: u32,
    pub p_filesz: u32,
    pub p_memsz: u32,
    pub p_flags: u32,
    pub p_align: u32,
}

impl Elf32Phdr {
    pub const SIZE: usize = 32;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            p_type: ne_u32(data, 0),
            p_offset: ne_u32(data, 4),
            p_vaddr: ne_u32(data, 8),
            p_paddr: ne_u32(data, 12),
            p_filesz: ne_u32(data, 16),
            p_memsz: ne_u32(data, 20),
            p_flags: ne_u32(data, 24),
            p_align: ne_u32(data, 28),
        })
    }
}

/// 64-bit program header (`Elf64_Phdr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Phdr {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl Elf64Phdr {
    pub const SIZE: usize = 56;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            p_type: ne_u32(data, 0),
            p_flags: ne_u32(data, 4),
            p_offset: ne_u64(data, 8),
            p_vaddr: ne_u64(data, 16),
            p_paddr: ne_u64(data, 24),
            p_filesz: ne_u64(data, 32),
            p_memsz: ne_u64(data, 40),
            p_align: ne_u64(data, 48),
        })
    }
}

/// 32-bit dynamic table entry (`Elf32_Dyn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32Dyn {
    pub d_tag: i32,
    pub d_un: u32,
}

impl Elf32Dyn {
    pub const SIZE: usize = 8;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            d_tag: ne_i32(data, 0),
            d_un: ne_u32(data, 4),
        })
    }
}

/// 64-bit dynamic table entry (`Elf64_Dyn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Dyn {
    pub d_tag: i64,
    pub d_un: u64,
}

impl Elf64Dyn {
    pub const SIZE: usize = 16;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            d_tag: ne_i64(data, 0),
            d_un: ne_u64(data, 8),
        })
    }
}

/// 32-bit symbol table entry (`Elf32_Sym`). The field order differs from
/// the 64-bit variant, which moves `st_info`/`st_other`/`st_shndx` ahead of
/// the value and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32Sym {
    pub st_name: u32,
    pub st_value: u32,
    pub st_size: u32,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
}

impl Elf32Sym {
    pub const SIZE: usize = 16;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            st_name: ne_u32(data, 0),
            st_value: ne_u32(data, 4),
            st_size: ne_u32(data, 8),
            st_info: data[12],
            st_other: data[13],
            st_shndx: ne_u16(data, 14),
        })
    }
}

/// 64-bit symbol table entry (`Elf64_Sym`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Sym {
    pub st_name: u32,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
    pub st_value: u64,
    pub st_size: u64,
}

impl Elf64Sym {
    pub const SIZE: usize = 24;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            st_name: ne_u32(data, 0),
            st_info: data[4],
            st_other: data[5],
            st_shndx: ne_u16(data, 6),
            st_value: ne_u64(data, 8),
            st_size: ne_u64(data, 16),
        })
    }
}

/// 32-bit relocation entry without addend (`Elf32_Rel`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32Rel {
    pub r_offset: u32,
    pub r_info: u32,
}

impl Elf32Rel {
    pub const SIZE: usize = 8;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            r_offset: ne_u32(data, 0),
            r_info: ne_u32(data, 4),
        })
    }
}

/// 32-bit relocation entry with addend (`Elf32_Rela`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32Rela {
    pub r_offset: u32,
    pub r_info: u32,
    pub r_addend: i32,
}

impl Elf32Rela {
    pub const SIZE: usize = 12;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            r_offset: ne_u32(data, 0),
            r_info: ne_u32(data, 4),
            r_addend: ne_i32(data, 8),
        })
    }
}

/// 64-bit relocation entry without addend (`Elf64_Rel`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Rel {
    pub r_offset: u64,
    pub r_info: u64,
}

impl Elf64Rel {
    pub const SIZE: usize = 16;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            r_offset: ne_u64(data, 0),
            r_info: ne_u64(data, 8),
        })
    }
}

/// 64-bit relocation entry with addend (`Elf64_Rela`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Rela {
    pub r_offset: u64,
    pub r_info: u64,
    pub r_addend: i64,
}

impl Elf64Rela {
    pub const SIZE: usize = 24;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            r_offset: ne_u64(data, 0),
            r_info: ne_u64(data, 8),
            r_addend: ne_i64(data, 16),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes_match_gabi() {
        assert_eq!(Elf32Ehdr::SIZE, 52);
        assert_eq!(Elf64Ehdr::SIZE, 64);
        assert_eq!(Elf32Shdr::SIZE, 40);
        assert_eq!(Elf64Shdr::SIZE, 64);
        assert_eq!(Elf32Phdr::SIZE, 32);
        assert_eq!(Elf64Phdr::SIZE, 56);
        assert_eq!(Elf32Dyn::SIZE, 8);
        assert_eq!(Elf64Dyn::SIZE, 16);
        assert_eq!(Elf32Sym::SIZE, 16);
        assert_eq!(Elf64Sym::SIZE, 24);
        assert_eq!(Elf32Rel::SIZE, 8);
        assert_eq!(Elf32Rela::SIZE, 12);
        assert_eq!(Elf64Rel::SIZE, 16);
        assert_eq!(Elf64Rela::SIZE, 24);
    }

    #[test]
    fn test_short_input_rejected() {
        assert!(Elf64Ehdr::parse(&[0u8; 63]).is_none());
        assert!(Elf32Shdr::parse(&[0u8; 39]).is_none());
        assert!(Elf64Sym::parse(&[0u8; 23]).is_none());
        assert!(Elf32Dyn::parse(&[]).is_none());
    }

    #[test]
    fn test_symbol_field_order_differs_by_class() {
        // Same prefix bytes decode to different fields in each class.
        let mut data = [0u8; 24];
        data[0] = 0x2a; // st_name = 42
        data[4] = 0x12; // 64-bit: st_info; 32-bit: low byte of st_value

        let sym64 = Elf64Sym::parse(&data).unwrap();
        assert_eq!(sym64.st_name, 42);
        assert_eq!(sym64.st_info, 0x12);

        let sym32 = Elf32Sym::parse(&data).unwrap();
        assert_eq!(sym32.st_name, 42);
        assert_eq!(sym32.st_value, u32::from_ne_bytes([0x12, 0, 0, 0]));
        assert_eq!(sym32.st_info, 0);
    }

    #[test]
    fn test_program_header_flags_position_differs_by_class() {
        let mut data = [0u8; 56];
        data[0] = 1; // p_type = PT_LOAD
        data[4] = 5; // 64-bit: p_flags; 32-bit: low byte of p_offset
        data[24] = 7; // 32-bit: p_flags

        let phdr64 = Elf64Phdr::parse(&data).unwrap();
        assert_eq!(phdr64.p_type, u32::from_ne_bytes([1, 0, 0, 0]));
        assert_eq!(phdr64.p_flags, u32::from_ne_bytes([5, 0, 0, 0]));

        let phdr32 = Elf32Phdr::parse(&data).unwrap();
        assert_eq!(phdr32.p_offset, u32::from_ne_bytes([5, 0, 0, 0]));
        assert_eq!(phdr32.p_flags, u32::from_ne_bytes([7, 0, 0, 0]));
    }
}
