//! Helpers for building tiny NROM images in tests

#![allow(dead_code)]

use nes_core::cartridge::{CHR_BANK_SIZE, HEADER_SIZE, PRG_BANK_SIZE};

/// A 16KB NROM image with `code` placed at each `(cpu address, bytes)` pair.
///
/// The reset vector points at $8000 and the NMI vector at `nmi`.
pub fn nrom(code: &[(u16, &[u8])], nmi: u16) -> Vec<u8> {
    let mut rom = vec![0u8; HEADER_SIZE + PRG_BANK_SIZE + CHR_BANK_SIZE];
    rom[..4].copy_from_slice(b"NES\x1A");
    rom[4] = 1;
    rom[5] = 1;

    let prg = &mut rom[HEADER_SIZE..HEADER_SIZE + PRG_BANK_SIZE];
    for (address, bytes) in code {
        let start = (*address as usize - 0x8000) % PRG_BANK_SIZE;
        prg[start..start + bytes.len()].copy_from_slice(bytes);
    }
    prg[0x3FFA..0x3FFC].copy_from_slice(&nmi.to_le_bytes());
    prg[0x3FFC..0x3FFE].copy_from_slice(&0x8000u16.to_le_bytes());
    rom
}

/// `JMP $addr` to itself, used to park the CPU.
pub fn spin(address: u16) -> [u8; 3] {
    let [lo, hi] = address.to_le_bytes();
    [0x4C, lo, hi]
}
