//! NES WASM - browser front-end for the NES emulator
//!
//! The page owns the canvas and the animation loop. It forwards `keydown`/`keyup`
//! events to [`Frontend::key_event`], calls [`Frontend::tick`] from
//! `requestAnimationFrame` for as long as it returns `true`, and paints
//! [`Frontend::frame`] into an `ImageData` of [`width`] x [`height`] after every tick.

use std::convert::Infallible;

use js_sys::Uint8ClampedArray;
use tracing::debug;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::JsError;

use nes_core::Nes;
use nes_frontend::rom::{PICK_PROMPT, ROM_EXTENSION};
use nes_frontend::{Driver, DriverConfig, Key, KeyState, Rom, RomError, Surface, Tick};

/// Frames stay in the driver until the page asks for them.
struct Canvas;

impl Surface for Canvas {
    type Error = Infallible;

    fn submit(&mut self, _pixels: &[u32]) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// NES front-end bound to one cartridge
#[wasm_bindgen]
pub struct Frontend {
    driver: Driver<Nes, Canvas>,
    keys: KeyState,
}

#[wasm_bindgen]
impl Frontend {
    /// Start a cartridge the page already has the bytes of.
    #[wasm_bindgen(constructor)]
    pub fn new(name: String, bytes: Vec<u8>) -> Result<Frontend, JsError> {
        let rom = Rom::from_bytes(name, bytes)?;
        let driver = Driver::start(rom, Canvas, DriverConfig::default())?;
        Ok(Self {
            driver,
            keys: KeyState::new(),
        })
    }

    /// Open the browser file chooser and start the picked cartridge.
    /// Must be called from a user gesture, e.g. a click on the [`prompt`] text.
    pub async fn pick() -> Result<Frontend, JsError> {
        let file = rfd::AsyncFileDialog::new()
            .add_filter("NES ROM", &[ROM_EXTENSION])
            .pick_file()
            .await
            .ok_or(RomError::Cancelled)?;
        let name = file.file_name();
        debug!(name = %name, "file picked");
        Self::new(name, file.read().await)
    }

    /// Record a key event by `KeyboardEvent.code`. Returns whether the page should
    /// call `preventDefault`.
    pub fn key_event(&self, pressed: bool, code: &str) -> bool {
        match Key::from_code(code) {
            Some(key) => self.keys.handle_event(pressed, key),
            None => false,
        }
    }

    /// Run one frame. `false` means stop scheduling ticks.
    pub fn tick(&mut self) -> Result<bool, JsError> {
        match self.driver.tick(&self.keys)? {
            Tick::Continue => Ok(true),
            Tick::Stopped(_) => Ok(false),
        }
    }

    /// Stop the driver, e.g. when the page is being hidden.
    pub fn terminate(&mut self) {
        self.driver.terminate();
    }

    /// Last presented frame as RGBA bytes.
    pub fn frame(&self) -> Uint8ClampedArray {
        Uint8ClampedArray::from(self.driver.last_frame().to_rgba_bytes().as_slice())
    }

    /// Frames run so far, saturating at `u32::MAX`
    #[wasm_bindgen(getter)]
    pub fn frames(&self) -> u32 {
        frame_count_u32(self.driver.frames())
    }

    #[wasm_bindgen(getter)]
    pub fn rom_name(&self) -> String {
        self.driver.rom_name().to_owned()
    }
}

/// Text to show where the user clicks to pick a cartridge.
#[wasm_bindgen]
pub fn prompt() -> String {
    PICK_PROMPT.to_string()
}

#[wasm_bindgen]
pub fn width() -> u32 {
    nes_frontend::SCREEN_WIDTH as u32
}

#[wasm_bindgen]
pub fn height() -> u32 {
    nes_frontend::SCREEN_HEIGHT as u32
}

#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn frame_count_u32(frames: u64) -> u32 {
    u32::try_from(frames).unwrap_or(u32::MAX)
}
