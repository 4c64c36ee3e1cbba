//! NES Frontend - host-independent half of the emulator front-ends
//!
//! Everything a host needs between its event loop and an [`Emulator`]: a key-state table
//! fed by keyboard events, the mapping from keys to controller buttons, conversion of the
//! engine framebuffer into packed pixels, cartridge loading, and the [`Driver`] that steps
//! one frame per host tick. Hosts supply a [`Surface`] (and optionally a [`Picker`]).

pub mod driver;
pub mod error;
pub mod input;
pub mod key;
pub mod present;
pub mod rom;

pub use driver::{Driver, DriverConfig, State, Stop, Tick};
pub use error::{ErrorKind, FrontendError};
pub use input::Bindings;
pub use key::{Key, KeySnapshot, KeyState};
pub use nes_core::{Color, ControllerInput, Emulator, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use present::{pack, PixelBuffer, Presenter, Surface};
pub use rom::{Picker, Rom, RomError, RomSource};
