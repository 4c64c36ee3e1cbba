//! Cartridge and mapper support
//!
//! This module parses iNES images. Only NROM (mapper 0) boards are wired up; anything
//! else is rejected at load time rather than running with the wrong banking.

use thiserror::Error;

/// iNES header size
pub const HEADER_SIZE: usize = 16;
/// Trainer block that may sit between the header and PRG ROM
pub const TRAINER_SIZE: usize = 512;
/// PRG ROM bank size (16KB)
pub const PRG_BANK_SIZE: usize = 16 * 1024;
/// CHR ROM bank size (8KB)
pub const CHR_BANK_SIZE: usize = 8 * 1024;

const MAGIC: [u8; 4] = *b"NES\x1A";

/// Nametable arrangement wired on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

/// iNES header structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InesHeader {
    /// PRG ROM size in 16KB units
    pub prg_rom_banks: u8,
    /// CHR ROM size in 8KB units (0 means the board carries CHR RAM)
    pub chr_rom_banks: u8,
    /// Flags 6
    pub flags_6: u8,
    /// Flags 7
    pub flags_7: u8,
}

impl InesHeader {
    /// Parse an iNES header from bytes
    pub fn parse(bytes: &[u8]) -> Result<Self, CartridgeError> {
        let header = bytes.get(..HEADER_SIZE).ok_or(CartridgeError::Truncated {
            expected: HEADER_SIZE,
            actual: bytes.len(),
        })?;
        if header[..4] != MAGIC {
            return Err(CartridgeError::BadMagic);
        }
        if header[4] == 0 {
            return Err(CartridgeError::NoPrgRom);
        }

        Ok(Self {
            prg_rom_banks: header[4],
            chr_rom_banks: header[5],
            flags_6: header[6],
            flags_7: header[7],
        })
    }

    pub fn mapper_number(&self) -> u8 {
        (self.flags_6 >> 4) | (self.flags_7 & 0xF0)
    }

    pub fn has_trainer(&self) -> bool {
        self.flags_6 & 0x04 != 0
    }

    pub fn mirroring(&self) -> Mirroring {
        if self.flags_6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if self.flags_6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }

    pub fn prg_rom_len(&self) -> usize {
        self.prg_rom_banks as usize * PRG_BANK_SIZE
    }

    pub fn chr_rom_len(&self) -> usize {
        self.chr_rom_banks as usize * CHR_BANK_SIZE
    }
}

/// A parsed NROM cartridge
#[derive(Debug, Clone)]
pub struct Cartridge {
    header: InesHeader,
    prg_rom: Vec<u8>,
    /// Pattern memory: CHR ROM, or 8KB of CHR RAM when the image has none
    chr: Vec<u8>,
    chr_is_ram: bool,
}

impl Cartridge {
    /// Create a new cartridge from iNES ROM data
    pub fn from_rom(rom_data: &[u8]) -> Result<Self, CartridgeError> {
        let header = InesHeader::parse(rom_data)?;

        let mapper = header.mapper_number();
        if mapper != 0 {
            return Err(CartridgeError::UnsupportedMapper(mapper));
        }

        let prg_start = HEADER_SIZE + if header.has_trainer() { TRAINER_SIZE } else { 0 };
        let chr_start = prg_start + header.prg_rom_len();
        let chr_end = chr_start + header.chr_rom_len();
        if rom_data.len() < chr_end {
            return Err(CartridgeError::Truncated {
                expected: chr_end,
                actual: rom_data.len(),
            });
        }

        let prg_rom = rom_data[prg_start..chr_start].to_vec();
        let chr_is_ram = header.chr_rom_banks == 0;
        let chr = if chr_is_ram {
            vec![0; CHR_BANK_SIZE]
        } else {
            rom_data[chr_start..chr_end].to_vec()
        };

        Ok(Self {
            header,
            prg_rom,
            chr,
            chr_is_ram,
        })
    }

    pub fn header(&self) -> &InesHeader {
        &self.header
    }

    pub fn mirroring(&self) -> Mirroring {
        self.header.mirroring()
    }

    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }

    pub fn chr(&self) -> &[u8] {
        &self.chr
    }

    pub fn chr_is_ram(&self) -> bool {
        self.chr_is_ram
    }

    /// Split into the CPU-side PRG ROM and the PPU-side pattern memory.
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>, bool, Mirroring) {
        let mirroring = self.mirroring();
        (self.prg_rom, self.chr, self.chr_is_ram, mirroring)
    }
}

/// Cartridge error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartridgeError {
    #[error("invalid iNES header: missing NES<EOF> magic")]
    BadMagic,
    #[error("invalid iNES header: no PRG ROM banks")]
    NoPrgRom,
    #[error("truncated image: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("mapper {0} is not supported")]
    UnsupportedMapper(u8),
}
