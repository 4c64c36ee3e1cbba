//! The desktop window: frame sink, key source and file picker in one.

use std::fs;

use minifb::{KeyRepeat, Window, WindowOptions};
use thiserror::Error;
use tracing::{debug, trace};

use nes_frontend::rom::RomError;
use nes_frontend::{KeyState, Picker, Surface, SCREEN_HEIGHT, SCREEN_WIDTH};

use crate::keymap;

pub const TITLE: &str = "NES Emulator";

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window: cannot open: {0}")]
    Open(String),
    #[error("window: cannot draw: {0}")]
    Update(String),
}

pub struct WindowSurface {
    window: Window,
    /// Frame re-packed as 0RGB, the layout minifb draws
    scratch: Vec<u32>,
}

impl WindowSurface {
    pub fn open(scale: usize) -> Result<Self, WindowError> {
        let mut window = Window::new(
            TITLE,
            SCREEN_WIDTH * scale,
            SCREEN_HEIGHT * scale,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|error| WindowError::Open(error.to_string()))?;
        window.set_target_fps(60);

        Ok(Self {
            window,
            scratch: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Feed key transitions seen by the last window update into `keys`.
    pub fn pump_keys(&mut self, keys: &KeyState) {
        if !self.window.is_active() {
            keys.release_all();
            return;
        }
        let released = self.window.get_keys_released().into_iter().map(|key| (false, key));
        let pressed = self
            .window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .map(|key| (true, key));
        for (down, key) in released.chain(pressed) {
            match keymap::translate(key) {
                Some(key) => {
                    keys.handle_event(down, key);
                }
                None => trace!(?key, "unmapped key"),
            }
        }
    }
}

/// `0xAABBGGRR` to `0x00RRGGBB`
fn to_0rgb(pixel: u32) -> u32 {
    (pixel & 0xFF) << 16 | (pixel & 0xFF00) | (pixel >> 16) & 0xFF
}

impl Surface for WindowSurface {
    type Error = WindowError;

    fn submit(&mut self, pixels: &[u32]) -> Result<(), Self::Error> {
        for (out, &pixel) in self.scratch.iter_mut().zip(pixels) {
            *out = to_0rgb(pixel);
        }
        self.window
            .update_with_buffer(&self.scratch, SCREEN_WIDTH, SCREEN_HEIGHT)
            .map_err(|error| WindowError::Update(error.to_string()))
    }
}

impl Picker for WindowSurface {
    fn prompt(&mut self, message: &str) {
        self.window.set_title(message);
        self.window.update();
    }

    fn pick(&mut self, extension: &str) -> Result<Option<(String, Vec<u8>)>, RomError> {
        let picked = rfd::FileDialog::new()
            .add_filter("NES ROM", &[extension])
            .pick_file();
        self.window.set_title(TITLE);

        let Some(path) = picked else {
            return Ok(None);
        };
        debug!(path = %path.display(), "file picked");
        let bytes = fs::read(&path).map_err(|source| RomError::Io {
            path: path.clone(),
            source,
        })?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
        Ok(Some((name, bytes)))
    }
}
