//! NES System Integration
//!
//! Ties the CPU, bus and PPU together and runs them one frame at a time. Timing is
//! scanline granular: each of the 262 lines gives the CPU 341 PPU dots worth of
//! cycles (three dots per CPU cycle), and overshoot carries into the next line.

use thiserror::Error;
use tracing::debug;

use crate::bus::Bus;
use crate::cartridge::{Cartridge, CartridgeError};
use crate::cpu::{Cpu, CpuError};
use crate::emulator::{Color, ControllerInput, Emulator};
use crate::SCREEN_HEIGHT;

/// Scanlines in one NTSC frame, including vblank and pre-render
pub const SCANLINES_PER_FRAME: usize = 262;
/// PPU dots per scanline
pub const DOTS_PER_SCANLINE: i64 = 341;
/// PPU dots per CPU cycle
pub const DOTS_PER_CPU_CYCLE: i64 = 3;
/// Scanline on which vblank begins
pub const VBLANK_LINE: usize = 241;
/// Last scanline of the frame; vblank flags drop here
pub const PRE_RENDER_LINE: usize = 261;

/// Engine failures surfaced through [`Emulator`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("no cartridge loaded")]
    NotLoaded,
    #[error("cartridge rejected: {0}")]
    Cartridge(#[from] CartridgeError),
    #[error("CPU halted: {0}")]
    Cpu(#[from] CpuError),
}

/// NES System - integrates all components
#[derive(Debug, Clone)]
pub struct Nes {
    cpu: Cpu,
    bus: Option<Bus>,
    /// Frame counter
    frame_count: u64,
    /// PPU dots the CPU still has to cover on the current line (negative after overshoot)
    dot_budget: i64,
}

impl Default for Nes {
    fn default() -> Self {
        Self {
            cpu: Cpu::new(),
            bus: None,
            frame_count: 0,
            dot_budget: 0,
        }
    }
}

impl Nes {
    /// Frames completed since the cartridge was loaded
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn is_loaded(&self) -> bool {
        self.bus.is_some()
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn bus(&self) -> Option<&Bus> {
        self.bus.as_ref()
    }
}

/// Run the CPU for one scanline's worth of dots, servicing NMI and DMA stalls.
fn run_scanline(cpu: &mut Cpu, bus: &mut Bus, budget: &mut i64) -> Result<(), CpuError> {
    *budget += DOTS_PER_SCANLINE;
    while *budget > 0 {
        let mut cycles = cpu.step(bus)?;
        cycles += bus.take_stall_cycles();
        if bus.ppu_mut().take_nmi() {
            cycles += cpu.nmi(bus);
        }
        *budget -= i64::from(cycles) * DOTS_PER_CPU_CYCLE;
    }
    Ok(())
}

impl Emulator for Nes {
    type Error = EngineError;

    fn new() -> Result<Self, Self::Error> {
        Ok(Self::default())
    }

    fn load(&mut self, rom: &[u8]) -> Result<(), Self::Error> {
        let cartridge = Cartridge::from_rom(rom)?;
        debug!(
            prg_rom = cartridge.prg_rom().len(),
            chr = cartridge.chr().len(),
            chr_ram = cartridge.chr_is_ram(),
            mirroring = ?cartridge.mirroring(),
            "cartridge parsed"
        );

        let mut bus = Bus::new(cartridge);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        debug!("cpu reset, pc = ${:04X}", cpu.registers().pc);

        self.cpu = cpu;
        self.bus = Some(bus);
        self.frame_count = 0;
        self.dot_budget = 0;
        Ok(())
    }

    fn set_input(&mut self, one: ControllerInput, two: Option<ControllerInput>) {
        if let Some(bus) = self.bus.as_mut() {
            bus.set_buttons(0, one.bits());
            bus.set_buttons(1, two.map_or(0, |pad| pad.bits()));
        }
    }

    fn step_frame(&mut self) -> Result<(), Self::Error> {
        let bus = self.bus.as_mut().ok_or(EngineError::NotLoaded)?;
        let cpu = &mut self.cpu;

        for line in 0..SCANLINES_PER_FRAME {
            match line {
                visible if visible < SCREEN_HEIGHT => bus.ppu_mut().render_scanline(visible),
                VBLANK_LINE => bus.ppu_mut().begin_vblank(),
                PRE_RENDER_LINE => bus.ppu_mut().end_vblank(),
                _ => {}
            }
            run_scanline(cpu, bus, &mut self.dot_budget)?;
        }

        self.frame_count += 1;
        Ok(())
    }

    fn pixel(&self, x: usize, y: usize) -> Color {
        self.bus
            .as_ref()
            .map_or(Color::BLACK, |bus| bus.ppu().pixel(x, y))
    }
}
