//! Framebuffer conversion and hand-off to the host surface

use nes_core::{Color, Emulator, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Pack a color as `0xAABBGGRR`, i.e. RGBA bytes when stored little-endian.
pub const fn pack(color: Color) -> u32 {
    (color.a as u32) << 24 | (color.b as u32) << 16 | (color.g as u32) << 8 | color.r as u32
}

/// One full frame of packed pixels, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<u32>,
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self {
            pixels: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }
}

impl PixelBuffer {
    pub fn as_slice(&self) -> &[u32] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= SCREEN_WIDTH {
            return None;
        }
        self.pixels.get(y * SCREEN_WIDTH + x).copied()
    }

    /// Bytes in `r, g, b, a` order, as canvas `ImageData` and PNG expect.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|pixel| pixel.to_le_bytes()).collect()
    }
}

/// Where finished frames go
pub trait Surface {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Show one frame of [`SCREEN_WIDTH`] x [`SCREEN_HEIGHT`] packed pixels.
    fn submit(&mut self, pixels: &[u32]) -> Result<(), Self::Error>;
}

/// Owns the pixel buffer that every frame is converted into
#[derive(Debug, Clone, Default)]
pub struct Presenter {
    buffer: PixelBuffer,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the whole buffer from the engine's current frame.
    pub fn convert(&mut self, engine: &impl Emulator) -> &PixelBuffer {
        for (index, pixel) in self.buffer.pixels.iter_mut().enumerate() {
            *pixel = pack(engine.pixel(index % SCREEN_WIDTH, index / SCREEN_WIDTH));
        }
        &self.buffer
    }

    pub fn present<E: Emulator, S: Surface>(
        &mut self,
        engine: &E,
        surface: &mut S,
    ) -> Result<(), S::Error> {
        let buffer = self.convert(engine);
        surface.submit(buffer.as_slice())
    }

    /// The most recently converted frame.
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }
}
