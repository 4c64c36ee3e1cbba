//! Memory bus and mapping
//!
//! The NES memory map:
//! $0000-$07FF - 2KB Internal RAM
//! $0800-$1FFF - RAM mirroring (repeats every $0800 bytes)
//! $2000-$3FFF - PPU registers (mirrored every $08 bytes)
//! $4000-$4017 - APU and I/O registers
//! $4020-$5FFF - Cartridge expansion (unused on NROM)
//! $6000-$7FFF - Cartridge PRG RAM
//! $8000-$FFFF - Cartridge PRG ROM (a single 16KB bank is mirrored)

use crate::cartridge::Cartridge;
use crate::controller::StandardController;
use crate::cpu::Bus as CpuBus;
use crate::ppu::Ppu;

/// RAM size in bytes
pub const RAM_SIZE: usize = 2048; // 2KB

/// PRG RAM size in bytes
pub const PRG_RAM_SIZE: usize = 8192;

/// CPU cycles the CPU is halted for during OAM DMA
pub const OAM_DMA_CYCLES: u32 = 513;

/// Memory bus structure
#[derive(Debug, Clone)]
pub struct Bus {
    /// 2KB internal RAM (with mirroring)
    ram: [u8; RAM_SIZE],
    prg_ram: Vec<u8>,
    prg_rom: Vec<u8>,
    ppu: Ppu,
    pads: [StandardController; 2],
    /// Cycles owed to DMA, collected by the frame loop
    stall_cycles: u32,
}

impl Bus {
    /// Wire a cartridge into a fresh console.
    pub fn new(cartridge: Cartridge) -> Self {
        let (prg_rom, chr, chr_is_ram, mirroring) = cartridge.into_parts();
        Self {
            ram: [0; RAM_SIZE],
            prg_ram: vec![0; PRG_RAM_SIZE],
            prg_rom,
            ppu: Ppu::new(chr, chr_is_ram, mirroring),
            pads: [StandardController::new(), StandardController::new()],
            stall_cycles: 0,
        }
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    /// Internal RAM contents
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// Set the buttons held on controller port `port` (0 or 1).
    pub fn set_buttons(&mut self, port: usize, buttons: u8) {
        if let Some(pad) = self.pads.get_mut(port) {
            pad.set_buttons(buttons);
        }
    }

    pub fn take_stall_cycles(&mut self) -> u32 {
        std::mem::take(&mut self.stall_cycles)
    }

    fn oam_dma(&mut self, page: u8) {
        let base = u16::from(page) << 8;
        for offset in 0..=0xFF {
            let value = self.read(base | offset);
            self.ppu.write_oam_dma(value);
        }
        self.stall_cycles += OAM_DMA_CYCLES;
    }
}

impl CpuBus for Bus {
    fn read(&mut self, address: u16) -> u8 {
        match address {
            0x0000..=0x1FFF => self.ram[(address & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.read_register(address & 0x07),
            0x4016 => self.pads[0].read(),
            0x4017 => self.pads[1].read(),
            0x6000..=0x7FFF => self.prg_ram[(address - 0x6000) as usize],
            0x8000..=0xFFFF => {
                let offset = (address - 0x8000) as usize % self.prg_rom.len();
                self.prg_rom[offset]
            }
            _ => 0,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            0x0000..=0x1FFF => self.ram[(address & 0x07FF) as usize] = value,
            0x2000..=0x3FFF => self.ppu.write_register(address & 0x07, value),
            0x4014 => self.oam_dma(value),
            0x4016 => {
                for pad in &mut self.pads {
                    pad.strobe_write(value);
                }
            }
            0x6000..=0x7FFF => self.prg_ram[(address - 0x6000) as usize] = value,
            // APU registers and ROM writes are ignored.
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{CHR_BANK_SIZE, HEADER_SIZE, PRG_BANK_SIZE};

    fn bus() -> Bus {
        let mut rom = vec![0u8; HEADER_SIZE + PRG_BANK_SIZE + CHR_BANK_SIZE];
        rom[..4].copy_from_slice(b"NES\x1A");
        rom[4] = 1;
        rom[5] = 1;
        rom[HEADER_SIZE] = 0xA9;
        rom[HEADER_SIZE + PRG_BANK_SIZE - 1] = 0x80;
        Bus::new(Cartridge::from_rom(&rom).unwrap())
    }

    #[test]
    fn test_ram_mirroring() {
        let mut bus = bus();
        bus.write(0x0001, 0x42);
        assert_eq!(bus.read(0x0801), 0x42);
        assert_eq!(bus.read(0x1801), 0x42);
    }

    #[test]
    fn single_prg_bank_is_mirrored() {
        let mut bus = bus();
        assert_eq!(bus.read(0x8000), 0xA9);
        assert_eq!(bus.read(0xC000), 0xA9);
        assert_eq!(bus.read(0xFFFF), 0x80);
    }

    #[test]
    fn prg_rom_is_read_only() {
        let mut bus = bus();
        bus.write(0x8000, 0x00);
        assert_eq!(bus.read(0x8000), 0xA9);
    }

    #[test]
    fn oam_dma_copies_page_and_stalls() {
        let mut bus = bus();
        bus.write(0x0200, 0x11);
        bus.write(0x02FF, 0x22);
        bus.write(0x4014, 0x02);
        assert_eq!(bus.take_stall_cycles(), OAM_DMA_CYCLES);
        assert_eq!(bus.take_stall_cycles(), 0);

        bus.write(0x2003, 0x00);
        assert_eq!(bus.read(0x2004), 0x11);
        bus.write(0x2003, 0xFF);
        assert_eq!(bus.read(0x2004), 0x22);
    }

    #[test]
    fn controller_strobe_reaches_both_ports() {
        let mut bus = bus();
        bus.set_buttons(0, 0b0000_0001);
        bus.set_buttons(1, 0b0000_0010);
        bus.write(0x4016, 1);
        bus.write(0x4016, 0);
        assert_eq!(bus.read(0x4016) & 1, 1);
        assert_eq!(bus.read(0x4017) & 1, 0);
        assert_eq!(bus.read(0x4017) & 1, 1);
    }
}
