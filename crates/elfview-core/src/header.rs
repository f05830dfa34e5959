//! ELF file header decoding.
//!
//! The file header is the first structure in any ELF file and carries the
//! metadata needed to locate every other table. Both class variants decode
//! into one [`FileHeader`] whose integer fields are widened to 64 bits.

use crate::endian::EndianConverter;
use crate::raw::{Elf32Ehdr, Elf64Ehdr};
use crate::{EI_NIDENT, ElfError, ElfResult};

/// Indices into the `e_ident` array.
pub mod ident {
    pub const EI_CLASS: usize = 4;
    pub const EI_DATA: usize = 5;
    pub const EI_VERSION: usize = 6;
    pub const EI_OSABI: usize = 7;
    pub const EI_ABIVERSION: usize = 8;
}

/// ELF class (32-bit or 64-bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfClass {
    /// 32-bit objects
    Elf32,
    /// 64-bit objects
    Elf64,
}

impl TryFrom<u8> for ElfClass {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Elf32),
            2 => Ok(Self::Elf64),
            other => Err(other),
        }
    }
}

impl ElfClass {
    /// Check if this is the 64-bit class.
    pub fn is_64bit(self) -> bool {
        matches!(self, Self::Elf64)
    }
}

/// ELF data encoding (byte order).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfData {
    /// Little-endian, two's complement
    Lsb,
    /// Big-endian, two's complement
    Msb,
}

impl TryFrom<u8> for ElfData {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Lsb),
            2 => Ok(Self::Msb),
            other => Err(other),
        }
    }
}

impl ElfData {
    /// Check if this is the little-endian encoding.
    pub fn is_little_endian(self) -> bool {
        matches!(self, Self::Lsb)
    }
}

/// ELF object file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfType {
    /// No file type
    None,
    /// Relocatable file
    Rel,
    /// Executable file
    Exec,
    /// Shared object file
    Dyn,
    /// Core file
    Core,
    /// Unknown type
    Unknown(u16),
}

impl From<u16> for ElfType {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Rel,
            2 => Self::Exec,
            3 => Self::Dyn,
            4 => Self::Core,
            other => Self::Unknown(other),
        }
    }
}

impl ElfType {
    /// The printable token for this file type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Rel => "Relocatable Object",
            Self::Exec => "Executable",
            Self::Dyn => "Shared Object",
            Self::Core => "Core File",
            Self::Unknown(_) => "Unknown",
        }
    }
}

/// Canonical name for a machine architecture code (`e_machine`).
pub fn machine_name(machine: u16) -> &'static str {
    match machine {
        0 => "No machine",
        1 => "AT&T WE 32100",
        2 => "Sun SPARC",
        3 => "Intel 80386",
        4 => "Motorola 68000",
        5 => "Motorola 88000",
        7 => "Intel 80860",
        8 => "MIPS R3000 big-endian",
        9 => "IBM System/370",
        10 => "MIPS R3000 little-endian",
        15 => "Hewlett-Packard PA-RISC",
        17 => "Fujitsu VPP500",
        18 => "Sun SPARC v8plus",
        19 => "Intel 80960",
        20 => "PowerPC",
        21 => "PowerPC 64-bit",
        22 => "IBM S390",
        40 => "ARM",
        42 => "Hitachi SH",
        43 => "Sun SPARC v9 64-bit",
        50 => "Intel Itanium IA-64",
        62 => "Advanced Micro Devices X86-64 processor",
        75 => "Digital VAX",
        87 => "NEC v850",
        88 => "Renesas M32R",
        92 => "OpenRISC",
        106 => "Analog Devices Blackfin",
        110 => "Altera Nios II",
        113 => "ARC International ARCompact",
        140 => "Texas Instruments TMS320C6000",
        164 => "Qualcomm Hexagon",
        183 => "ARM AArch64",
        189 => "Xilinx MicroBlaze",
        190 => "NVIDIA CUDA",
        224 => "AMD GPU",
        243 => "RISC-V",
        247 => "Linux BPF",
        258 => "LoongArch",
        _ => "Unknown",
    }
}

/// Canonical name for an OS/ABI identification code (`EI_OSABI`).
pub fn abi_name(abi: u8) -> &'static str {
    match abi {
        0 => "UNIX System V ABI",
        1 => "HP-UX",
        2 => "NetBSD",
        3 => "Object uses GNU ELF extensions",
        6 => "Sun Solaris",
        7 => "IBM AIX",
        8 => "SGI Irix",
        9 => "FreeBSD",
        10 => "Compaq TRU64 UNIX",
        11 => "Novell Modesto",
        12 => "OpenBSD",
        64 => "ARM EABI",
        97 => "ARM",
        255 => "Standalone (embedded) application",
        _ => "Unknown",
    }
}

/// Decoded ELF file header, class-independent.
///
/// Immutable after load. A zero program-header or section-header count
/// means the file has no such table; a string-table index equal to the
/// undefined-section sentinel (0) means no section-name string table.
#[derive(Debug, Clone)]
pub struct FileHeader {
    ident: [u8; EI_NIDENT],
    class: ElfClass,
    data: ElfData,
    elf_type: ElfType,
    machine: u16,
    version: u32,
    entry: u64,
    phoff: u64,
    shoff: u64,
    flags: u32,
    ehsize: u16,
    phentsize: u16,
    phnum: u16,
    shentsize: u16,
    shnum: u16,
    shstrndx: u16,
}

impl FileHeader {
    /// Decodes the file header at the start of `data` using the
    /// already-validated `class` and the file's byte-order converter.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Truncated`] if `data` is shorter than the
    /// class-specific header size.
    pub fn parse(data: &[u8], class: ElfClass, conv: &EndianConverter) -> ElfResult<Self> {
        match class {
            ElfClass::Elf32 => {
                let raw = Elf32Ehdr::parse(data).ok_or(ElfError::Truncated {
                    what: "file header",
                    offset: 0,
                    needed: Elf32Ehdr::SIZE,
                    available: data.len(),
                })?;
                Ok(Self::from_raw32(&raw, class, conv))
            }
            ElfClass::Elf64 => {
                let raw = Elf64Ehdr::parse(data).ok_or(ElfError::Truncated {
                    what: "file header",
                    offset: 0,
                    needed: Elf64Ehdr::SIZE,
                    available: data.len(),
                })?;
                Ok(Self::from_raw64(&raw, class, conv))
            }
        }
    }

    fn from_raw32(raw: &Elf32Ehdr, class: ElfClass, conv: &EndianConverter) -> Self {
        Self {
            ident: raw.e_ident,
            class,
            data: data_encoding(&raw.e_ident),
            elf_type: ElfType::from(conv.u16(raw.e_type)),
            machine: conv.u16(raw.e_machine),
            version: conv.u32(raw.e_version),
            entry: u64::from(conv.u32(raw.e_entry)),
            phoff: u64::from(conv.u32(raw.e_phoff)),
            shoff: u64::from(conv.u32(raw.e_shoff)),
            flags: conv.u32(raw.e_flags),
            ehsize: conv.u16(raw.e_ehsize),
            phentsize: conv.u16(raw.e_phentsize),
            phnum: conv.u16(raw.e_phnum),
            shentsize: conv.u16(raw.e_shentsize),
            shnum: conv.u16(raw.e_shnum),
            shstrndx: conv.u16(raw.e_shstrndx),
        }
    }

    fn from_raw64(raw: &Elf64Ehdr, class: ElfClass, conv: &EndianConverter) -> Self {
        Self {
            ident: raw.e_ident,
            class,
            data: data_encoding(&raw.e_ident),
            elf_type: ElfType::from(conv.u16(raw.e_type)),
            machine: conv.u16(raw.e_machine),
            version: conv.u32(raw.e_version),
            entry: conv.u64(raw.e_entry),
            phoff: conv.u64(raw.e_phoff),
            shoff: conv.u64(raw.e_shoff),
            flags: conv.u32(raw.e_flags),
            ehsize: conv.u16(raw.e_ehsize),
            phentsize: conv.u16(raw.e_phentsize),
            phnum: conv.u16(raw.e_phnum),
            shentsize: conv.u16(raw.e_shentsize),
            shnum: conv.u16(raw.e_shnum),
            shstrndx: conv.u16(raw.e_shstrndx),
        }
    }

    /// The raw identification bytes.
    pub fn ident(&self) -> &[u8; EI_NIDENT] {
        &self.ident
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
        self.data
    }

    /// Check if the file is little-endian.
    pub fn is_little_endian(&self) -> bool {
        self.data.is_little_endian()
    }

    /// The file format version (`e_version`).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The OS/ABI identification code.
    pub fn abi(&self) -> u8 {
        self.ident[ident::EI_OSABI]
    }

    /// The OS/ABI identification as a printable name.
    pub fn abi_string(&self) -> &'static str {
        abi_name(self.abi())
    }

    /// The ABI version byte.
    pub fn abi_version(&self) -> u8 {
        self.ident[ident::EI_ABIVERSION]
    }

    /// The object file type.
    pub fn elf_type(&self) -> ElfType {
        self.elf_type
    }

    /// The object file type as a printable token.
    pub fn type_string(&self) -> &'static str {
        self.elf_type.as_str()
    }

    /// The machine architecture code.
    pub fn machine(&self) -> u16 {
        self.machine
    }

    /// The machine architecture as a printable name.
    pub fn machine_string(&self) -> &'static str {
        machine_name(self.machine)
    }

    /// The entry point virtual address.
    pub fn entry_point(&self) -> u64 {
        self.entry
    }

    /// File offset of the program header table.
    pub fn program_header_offset(&self) -> u64 {
        self.phoff
    }

    /// Size in bytes of one program header table entry.
    pub fn program_header_size(&self) -> u16 {
        self.phentsize
    }

    /// Number of program header table entries.
    pub fn program_header_count(&self) -> u16 {
        self.phnum
    }

    /// File offset of the section header table.
    pub fn section_header_offset(&self) -> u64 {
        self.shoff
    }

    /// Size in bytes of one section header table entry.
    pub fn section_header_size(&self) -> u16 {
        self.shentsize
    }

    /// Number of section header table entries.
    pub fn section_header_count(&self) -> u16 {
        self.shnum
    }

    /// The processor-specific flags word.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Size of this header in bytes as recorded in the file.
    pub fn header_size(&self) -> u16 {
        self.ehsize
    }

    /// Index of the section holding the section-name string table, or the
    /// undefined-section sentinel (0) if there is none.
    pub fn section_header_string_table_index(&self) -> u16 {
        self.shstrndx
    }
}

fn data_encoding(ident_bytes: &[u8; EI_NIDENT]) -> ElfData {
    // The encoding byte was validated before header decoding starts.
    match ElfData::try_from(ident_bytes[ident::EI_DATA]) {
        Ok(data) => data,
        Err(_) => ElfData::Lsb,
    }
}
