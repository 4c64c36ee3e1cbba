//! NES Core - Pure Rust NES emulator library
//!
//! This crate provides the emulation engine consumed by the front-ends. Hosts only ever
//! talk to it through the [`Emulator`] trait: construct, load a cartridge, feed
//! controller input, step one frame and read back pixels.
//! It contains no windowing, WASM or web dependencies.

#![forbid(unsafe_code)]

/// Engine contract shared with the front-ends
pub mod emulator;
/// CPU module containing the 2A03 (6502 variant) implementation
pub mod cpu;
/// Memory bus and mapping
pub mod bus;
/// PPU (Picture Processing Unit) implementation
pub mod ppu;
/// Cartridge loading (iNES)
pub mod cartridge;
/// Standard controller shift register
pub mod controller;
/// 2C02 master palette
pub mod palette;
/// Integration module for complete NES system
pub mod system;

pub use emulator::{Color, ControllerInput, Emulator};
pub use system::{EngineError, Nes};

/// Width of the visible picture in pixels.
pub const SCREEN_WIDTH: usize = 256;
/// Height of the visible picture in pixels.
pub const SCREEN_HEIGHT: usize = 240;
