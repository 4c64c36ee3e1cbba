//! PPU (Picture Processing Unit) implementation
//!
//! Rendering is done a whole scanline at a time rather than dot by dot. Scrolling uses
//! the usual v/t/x/w register model, so mid-frame writes to $2005/$2006 take effect on
//! the next line, which is enough for status-bar splits.
//!
//! The framebuffer stores 6-bit palette indices; [`Ppu::pixel`] turns them into colors.

use crate::cartridge::Mirroring;
use crate::emulator::Color;
use crate::palette;
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Nametable RAM. 2KB on the console; four-screen boards add another 2KB.
pub const VRAM_SIZE: usize = 0x1000;
pub const PALETTE_SIZE: usize = 32;
pub const OAM_SIZE: usize = 256;

const MAX_SPRITES_PER_LINE: usize = 8;

/// PPUCTRL ($2000)
#[derive(Debug, Clone, Copy, Default)]
pub struct PpuCtrl(u8);

impl PpuCtrl {
    pub const NMI_ENABLE: u8 = 0b1000_0000;
    pub const SPRITE_SIZE: u8 = 0b0010_0000;
    pub const BG_PATTERN_TABLE: u8 = 0b0001_0000;
    pub const SPR_PATTERN_TABLE: u8 = 0b0000_1000;
    pub const VRAM_INC: u8 = 0b0000_0100;

    pub fn nmi_enable(&self) -> bool {
        self.0 & Self::NMI_ENABLE != 0
    }

    pub fn sprite_height(&self) -> usize {
        if self.0 & Self::SPRITE_SIZE != 0 {
            16
        } else {
            8
        }
    }

    pub fn background_table(&self) -> u16 {
        if self.0 & Self::BG_PATTERN_TABLE != 0 {
            0x1000
        } else {
            0
        }
    }

    pub fn sprite_table(&self) -> u16 {
        if self.0 & Self::SPR_PATTERN_TABLE != 0 {
            0x1000
        } else {
            0
        }
    }

    pub fn vram_increment(&self) -> u16 {
        if self.0 & Self::VRAM_INC != 0 {
            32
        } else {
            1
        }
    }
}

/// PPUMASK ($2001)
#[derive(Debug, Clone, Copy, Default)]
pub struct PpuMask(u8);

impl PpuMask {
    pub const GREYSCALE: u8 = 0b0000_0001;
    pub const BG_LEFT: u8 = 0b0000_0010;
    pub const SPR_LEFT: u8 = 0b0000_0100;
    pub const RENDER_BG: u8 = 0b0000_1000;
    pub const RENDER_SPR: u8 = 0b0001_0000;

    pub fn greyscale(&self) -> bool {
        self.0 & Self::GREYSCALE != 0
    }

    pub fn render_background(&self) -> bool {
        self.0 & Self::RENDER_BG != 0
    }

    pub fn render_sprites(&self) -> bool {
        self.0 & Self::RENDER_SPR != 0
    }

    pub fn rendering(&self) -> bool {
        self.render_background() || self.render_sprites()
    }

    fn show_background_at(&self, x: usize) -> bool {
        self.render_background() && (x >= 8 || self.0 & Self::BG_LEFT != 0)
    }

    fn show_sprites_at(&self, x: usize) -> bool {
        self.render_sprites() && (x >= 8 || self.0 & Self::SPR_LEFT != 0)
    }
}

/// PPUSTATUS ($2002)
#[derive(Debug, Clone, Copy, Default)]
pub struct PpuStatus(u8);

impl PpuStatus {
    pub const VBLANK: u8 = 0b1000_0000;
    pub const SPRITE_ZERO_HIT: u8 = 0b0100_0000;
    pub const SPRITE_OVERFLOW: u8 = 0b0010_0000;

    pub fn vblank(&self) -> bool {
        self.0 & Self::VBLANK != 0
    }

    pub fn sprite_zero_hit(&self) -> bool {
        self.0 & Self::SPRITE_ZERO_HIT != 0
    }

    pub fn sprite_overflow(&self) -> bool {
        self.0 & Self::SPRITE_OVERFLOW != 0
    }

    fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

/// Sprite pixels gathered for one scanline
struct SpriteLine {
    /// `palette << 2 | value`; 0 where no sprite is opaque
    color: [u8; SCREEN_WIDTH],
    behind_background: [bool; SCREEN_WIDTH],
    from_sprite_zero: [bool; SCREEN_WIDTH],
}

/// PPU internal state
#[derive(Debug, Clone)]
pub struct Ppu {
    chr: Vec<u8>,
    chr_is_ram: bool,
    mirroring: Mirroring,
    vram: [u8; VRAM_SIZE],
    palette: [u8; PALETTE_SIZE],
    oam: [u8; OAM_SIZE],
    control: PpuCtrl,
    mask: PpuMask,
    status: PpuStatus,
    oam_addr: u8,
    /// Current VRAM address (v)
    v: u16,
    /// Temporary VRAM address (t)
    t: u16,
    /// Fine X scroll (x)
    fine_x: u8,
    /// First/second write toggle (w)
    write_toggle: bool,
    read_buffer: u8,
    nmi_pending: bool,
    frame: Vec<u8>,
}

impl Ppu {
    /// Create a PPU attached to the given pattern memory.
    pub fn new(chr: Vec<u8>, chr_is_ram: bool, mirroring: Mirroring) -> Self {
        Self {
            chr,
            chr_is_ram,
            mirroring,
            vram: [0; VRAM_SIZE],
            palette: [0; PALETTE_SIZE],
            oam: [0; OAM_SIZE],
            control: PpuCtrl::default(),
            mask: PpuMask::default(),
            status: PpuStatus::default(),
            oam_addr: 0,
            v: 0,
            t: 0,
            fine_x: 0,
            write_toggle: false,
            read_buffer: 0,
            nmi_pending: false,
            frame: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    pub fn status(&self) -> PpuStatus {
        self.status
    }

    pub fn control(&self) -> PpuCtrl {
        self.control
    }

    pub fn mask(&self) -> PpuMask {
        self.mask
    }

    /// Palette index of a pixel in the last rendered frame
    pub fn pixel_index(&self, x: usize, y: usize) -> Option<u8> {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return None;
        }
        Some(self.frame[y * SCREEN_WIDTH + x])
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color {
        self.pixel_index(x, y).map_or(Color::BLACK, palette::color)
    }

    /// True once per NMI edge; clears the request.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    /// CPU read of $2000-$2007 (already reduced to 0-7).
    pub fn read_register(&mut self, register: u16) -> u8 {
        match register & 0x07 {
            2 => {
                let value = (self.status.0 & 0xE0) | (self.read_buffer & 0x1F);
                self.status.set(PpuStatus::VBLANK, false);
                self.write_toggle = false;
                value
            }
            4 => self.oam[self.oam_addr as usize],
            7 => {
                let address = self.v & 0x3FFF;
                let value = if address >= 0x3F00 {
                    // Palette reads are immediate; the buffer picks up the nametable underneath.
                    self.read_buffer = self.read_memory(address - 0x1000);
                    self.read_memory(address)
                } else {
                    let buffered = self.read_buffer;
                    self.read_buffer = self.read_memory(address);
                    buffered
                };
                self.v = self.v.wrapping_add(self.control.vram_increment());
                value
            }
            _ => self.read_buffer,
        }
    }

    /// CPU write of $2000-$2007 (already reduced to 0-7).
    pub fn write_register(&mut self, register: u16, value: u8) {
        match register & 0x07 {
            0 => {
                let was_enabled = self.control.nmi_enable();
                self.control = PpuCtrl(value);
                self.t = (self.t & !0x0C00) | (u16::from(value & 0x03) << 10);
                if !was_enabled && self.control.nmi_enable() && self.status.vblank() {
                    self.nmi_pending = true;
                }
            }
            1 => self.mask = PpuMask(value),
            3 => self.oam_addr = value,
            4 => self.write_oam_dma(value),
            5 => {
                if self.write_toggle {
                    self.t = (self.t & !0x73E0)
                        | (u16::from(value & 0x07) << 12)
                        | (u16::from(value & 0xF8) << 2);
                } else {
                    self.t = (self.t & !0x001F) | u16::from(value >> 3);
                    self.fine_x = value & 0x07;
                }
                self.write_toggle = !self.write_toggle;
            }
            6 => {
                if self.write_toggle {
                    self.t = (self.t & 0xFF00) | u16::from(value);
                    self.v = self.t;
                } else {
                    self.t = (self.t & 0x00FF) | (u16::from(value & 0x3F) << 8);
                }
                self.write_toggle = !self.write_toggle;
            }
            7 => {
                self.write_memory(self.v & 0x3FFF, value);
                self.v = self.v.wrapping_add(self.control.vram_increment());
            }
            _ => {}
        }
    }

    /// One byte of an OAM DMA transfer (also used by $2004 writes).
    pub fn write_oam_dma(&mut self, value: u8) {
        self.oam[self.oam_addr as usize] = value;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    /// Start of scanline 241.
    pub fn begin_vblank(&mut self) {
        self.status.set(PpuStatus::VBLANK, true);
        if self.control.nmi_enable() {
            self.nmi_pending = true;
        }
    }

    /// Pre-render scanline: flags drop and the scroll position reloads from t.
    pub fn end_vblank(&mut self) {
        self.status.set(PpuStatus::VBLANK, false);
        self.status.set(PpuStatus::SPRITE_ZERO_HIT, false);
        self.status.set(PpuStatus::SPRITE_OVERFLOW, false);
        if self.mask.rendering() {
            self.copy_vertical();
            self.copy_horizontal();
        }
    }

    /// Draw visible scanline `y` from the current register state.
    pub fn render_scanline(&mut self, y: usize) {
        let row = y * SCREEN_WIDTH;
        if !self.mask.rendering() {
            let backdrop = self.palette_entry(0);
            self.frame[row..row + SCREEN_WIDTH].fill(backdrop);
            return;
        }

        let background = self.background_line();
        let sprites = self.sprite_line(y);

        for x in 0..SCREEN_WIDTH {
            let bg = if self.mask.show_background_at(x) { background[x] } else { 0 };
            let sprite = if self.mask.show_sprites_at(x) { sprites.color[x] } else { 0 };

            if bg != 0 && sprite != 0 && sprites.from_sprite_zero[x] && x != 255 {
                self.status.set(PpuStatus::SPRITE_ZERO_HIT, true);
            }

            let entry = if sprite != 0 && (bg == 0 || !sprites.behind_background[x]) {
                0x10 | sprite
            } else {
                bg
            };
            self.frame[row + x] = self.palette_entry(entry);
        }

        self.increment_vertical();
        self.copy_horizontal();
    }

    fn palette_entry(&self, entry: u8) -> u8 {
        let index = self.palette[palette_index(u16::from(entry))];
        if self.mask.greyscale() {
            index & 0x30
        } else {
            index & 0x3F
        }
    }

    /// Background pixels for the line at v, as `palette << 2 | value` (0 = transparent).
    fn background_line(&self) -> [u8; SCREEN_WIDTH] {
        let mut line = [0u8; SCREEN_WIDTH];
        let fine_y = (self.v >> 12) & 0x07;
        let coarse_y = (self.v >> 5) & 0x1F;
        let nametable_y = (self.v >> 11) & 0x01;
        let nametable_x = (self.v >> 10) & 0x01;
        let start = usize::from(self.v & 0x1F) * 8 + usize::from(self.fine_x);
        let pattern_base = self.control.background_table();

        for (px, out) in line.iter_mut().enumerate() {
            let world_x = start + px;
            let column = ((world_x / 8) % 32) as u16;
            let nametable = 0x2000
                | (nametable_y << 11)
                | ((nametable_x ^ ((world_x / 256) as u16 & 0x01)) << 10);

            let tile = self.read_memory(nametable | (coarse_y << 5) | column);
            let attribute =
                self.read_memory(nametable | 0x03C0 | ((coarse_y >> 2) << 3) | (column >> 2));
            let shift = ((coarse_y & 0x02) << 1) | (column & 0x02);
            let palette = (attribute >> shift) & 0x03;

            let pattern = pattern_base + u16::from(tile) * 16 + fine_y;
            let bit = 7 - (world_x % 8);
            let value = pattern_bit(self.read_memory(pattern), self.read_memory(pattern + 8), bit);
            if value != 0 {
                *out = (palette << 2) | value;
            }
        }
        line
    }

    /// Evaluate OAM for line `y` and rasterize the first eight sprites found.
    fn sprite_line(&mut self, y: usize) -> SpriteLine {
        let mut line = SpriteLine {
            color: [0; SCREEN_WIDTH],
            behind_background: [false; SCREEN_WIDTH],
            from_sprite_zero: [false; SCREEN_WIDTH],
        };
        if !self.mask.render_sprites() {
            return line;
        }

        let height = self.control.sprite_height();
        let mut found = 0;
        for index in 0..OAM_SIZE / 4 {
            let base = index * 4;
            let top = usize::from(self.oam[base]) + 1;
            if y < top || y >= top + height {
                continue;
            }
            if found == MAX_SPRITES_PER_LINE {
                self.status.set(PpuStatus::SPRITE_OVERFLOW, true);
                break;
            }
            found += 1;

            let tile = self.oam[base + 1];
            let attributes = self.oam[base + 2];
            let left = usize::from(self.oam[base + 3]);

            let mut row = (y - top) as u16;
            if attributes & 0x80 != 0 {
                row = height as u16 - 1 - row;
            }
            let address = if height == 16 {
                let table = u16::from(tile & 0x01) * 0x1000;
                let tile = u16::from(tile & 0xFE) + row / 8;
                table + tile * 16 + row % 8
            } else {
                self.control.sprite_table() + u16::from(tile) * 16 + row
            };
            let lo = self.read_memory(address);
            let hi = self.read_memory(address + 8);

            for column in 0..8 {
                let x = left + column;
                if x >= SCREEN_WIDTH {
                    break;
                }
                // Lower OAM index wins, even when it ends up behind the background.
                if line.color[x] != 0 {
                    continue;
                }
                let bit = if attributes & 0x40 != 0 { column } else { 7 - column };
                let value = pattern_bit(lo, hi, bit);
                if value == 0 {
                    continue;
                }
                line.color[x] = ((attributes & 0x03) << 2) | value;
                line.behind_background[x] = attributes & 0x20 != 0;
                line.from_sprite_zero[x] = index == 0;
            }
        }
        line
    }

    fn increment_vertical(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
            return;
        }
        self.v &= !0x7000;
        let mut coarse_y = (self.v & 0x03E0) >> 5;
        if coarse_y == 29 {
            coarse_y = 0;
            self.v ^= 0x0800;
        } else if coarse_y == 31 {
            coarse_y = 0;
        } else {
            coarse_y += 1;
        }
        self.v = (self.v & !0x03E0) | (coarse_y << 5);
    }

    fn copy_horizontal(&mut self) {
        self.v = (self.v & !0x041F) | (self.t & 0x041F);
    }

    fn copy_vertical(&mut self) {
        self.v = (self.v & !0x7BE0) | (self.t & 0x7BE0);
    }

    /// Read from the PPU address space ($0000-$3FFF)
    pub fn read_memory(&self, address: u16) -> u8 {
        let address = address & 0x3FFF;
        match address {
            0x0000..=0x1FFF => self.chr.get(address as usize).copied().unwrap_or(0),
            0x2000..=0x3EFF => self.vram[self.nametable_index(address)],
            _ => self.palette[palette_index(address)],
        }
    }

    fn write_memory(&mut self, address: u16, value: u8) {
        let address = address & 0x3FFF;
        match address {
            0x0000..=0x1FFF => {
                if self.chr_is_ram {
                    if let Some(byte) = self.chr.get_mut(address as usize) {
                        *byte = value;
                    }
                }
            }
            0x2000..=0x3EFF => {
                let index = self.nametable_index(address);
                self.vram[index] = value;
            }
            _ => self.palette[palette_index(address)] = value & 0x3F,
        }
    }

    fn nametable_index(&self, address: u16) -> usize {
        let offset = usize::from(address.wrapping_sub(0x2000) & 0x0FFF);
        let table = offset / 0x400;
        let physical = match self.mirroring {
            Mirroring::Horizontal => table / 2,
            Mirroring::Vertical => table % 2,
            Mirroring::FourScreen => table,
        };
        physical * 0x400 + offset % 0x400
    }
}

/// $3F10/$3F14/$3F18/$3F1C mirror the background entries below them.
fn palette_index(address: u16) -> usize {
    let index = usize::from(address & 0x1F);
    if index >= 0x10 && index % 4 == 0 {
        index - 0x10
    } else {
        index
    }
}

fn pattern_bit(lo: u8, hi: u8, bit: usize) -> u8 {
    ((lo >> bit) & 0x01) | (((hi >> bit) & 0x01) << 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ppu() -> Ppu {
        Ppu::new(vec![0; 0x2000], true, Mirroring::Vertical)
    }

    fn set_address(ppu: &mut Ppu, address: u16) {
        ppu.write_register(6, (address >> 8) as u8);
        ppu.write_register(6, address as u8);
    }

    #[test]
    fn data_reads_are_buffered_below_palette() {
        let mut ppu = ppu();
        set_address(&mut ppu, 0x2000);
        ppu.write_register(7, 0xAB);
        set_address(&mut ppu, 0x2000);
        assert_eq!(ppu.read_register(7), 0x00);
        assert_eq!(ppu.read_register(7), 0xAB);
    }

    #[test]
    fn palette_mirrors_backdrop() {
        let mut ppu = ppu();
        set_address(&mut ppu, 0x3F10);
        ppu.write_register(7, 0x21);
        assert_eq!(ppu.read_memory(0x3F00), 0x21);
        set_address(&mut ppu, 0x3F00);
        assert_eq!(ppu.read_register(7), 0x21);
    }

    #[test]
    fn vertical_mirroring_pairs_left_and_right() {
        let mut ppu = ppu();
        set_address(&mut ppu, 0x2005);
        ppu.write_register(7, 0x42);
        assert_eq!(ppu.read_memory(0x2805), 0x42);
        assert_eq!(ppu.read_memory(0x2405), 0x00);
    }

    #[test]
    fn status_read_clears_vblank_and_toggle() {
        let mut ppu = ppu();
        ppu.begin_vblank();
        ppu.write_register(5, 0x10);
        assert_eq!(ppu.read_register(2) & 0x80, 0x80);
        assert!(!ppu.status().vblank());
        assert!(!ppu.write_toggle);
    }

    #[test]
    fn nmi_requested_when_enabled_during_vblank() {
        let mut ppu = ppu();
        ppu.begin_vblank();
        assert!(!ppu.take_nmi());
        ppu.write_register(0, PpuCtrl::NMI_ENABLE);
        assert!(ppu.take_nmi());
        assert!(!ppu.take_nmi());
    }

    #[test]
    fn disabled_rendering_shows_backdrop() {
        let mut ppu = ppu();
        set_address(&mut ppu, 0x3F00);
        ppu.write_register(7, 0x16);
        ppu.render_scanline(10);
        assert_eq!(ppu.pixel_index(0, 10), Some(0x16));
        assert_eq!(ppu.pixel_index(255, 10), Some(0x16));
        assert_eq!(ppu.pixel(3, 10), palette::color(0x16));
    }

    #[test]
    fn sprite_zero_hit_over_opaque_background() {
        let mut ppu = ppu();
        // Tile 1: solid color 1.
        set_address(&mut ppu, 0x0010);
        for _ in 0..8 {
            ppu.write_register(7, 0xFF);
        }
        // Whole first nametable uses tile 1.
        set_address(&mut ppu, 0x2000);
        for _ in 0..960 {
            ppu.write_register(7, 0x01);
        }
        // Sprite 0 at (20, 30) with tile 1.
        ppu.write_register(3, 0);
        for byte in [29, 1, 0, 20] {
            ppu.write_register(4, byte);
        }
        ppu.write_register(1, PpuMask::RENDER_BG | PpuMask::RENDER_SPR);
        ppu.end_vblank();

        for y in 0..30 {
            ppu.render_scanline(y);
        }
        assert!(!ppu.status().sprite_zero_hit());
        ppu.render_scanline(30);
        assert!(ppu.status().sprite_zero_hit());
    }
}
