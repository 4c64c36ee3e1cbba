//! 2C02 master palette.
//!
//! Palette RAM holds 6-bit indices into this table; the PPU never outputs anything else.

use crate::emulator::Color;

const fn c(rgb: u32) -> Color {
    Color::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

pub const MASTER_PALETTE: [Color; 64] = [
    c(0x666666), c(0x002A88), c(0x1412A7), c(0x3B00A4), c(0x5C007E), c(0x6E0040), c(0x6C0600), c(0x561D00),
    c(0x333500), c(0x0B4800), c(0x005200), c(0x004F08), c(0x00404D), c(0x000000), c(0x000000), c(0x000000),
    c(0xADADAD), c(0x155FD9), c(0x4240FF), c(0x7527FE), c(0xA01ACC), c(0xB71E7B), c(0xB53120), c(0x994E00),
    c(0x6B6D00), c(0x388700), c(0x0C9300), c(0x008F32), c(0x007C8D), c(0x000000), c(0x000000), c(0x000000),
    c(0xFFFEFF), c(0x64B0FF), c(0x9290FF), c(0xC676FF), c(0xF36AFF), c(0xFE6ECC), c(0xFE8170), c(0xEA9E22),
    c(0xBCBE00), c(0x88D800), c(0x5CE430), c(0x45E082), c(0x48CDDE), c(0x4F4F4F), c(0x000000), c(0x000000),
    c(0xFFFEFF), c(0xC0DFFF), c(0xD3D2FF), c(0xE8C8FF), c(0xFBC2FF), c(0xFEC4EA), c(0xFECCC5), c(0xF7D8A5),
    c(0xE4E594), c(0xCFEF96), c(0xBDF4AB), c(0xB3F3CC), c(0xB5EBF2), c(0xB8B8B8), c(0x000000), c(0x000000),
];

/// Look up a palette RAM entry, ignoring the two unused high bits.
pub fn color(index: u8) -> Color {
    MASTER_PALETTE[(index & 0x3F) as usize]
}
