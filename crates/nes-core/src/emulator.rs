//! The narrow surface a front-end uses to drive an engine.

/// One RGBA sample of the engine framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    /// Opaque color from its three channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }
}

/// Logical state of one standard pad for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerInput {
    pub a: bool,
    pub b: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub select: bool,
    pub start: bool,
}

impl ControllerInput {
    /// Pack the buttons in the order the pad shifts them out:
    /// bit 0 = A, 1 = B, 2 = Select, 3 = Start, 4 = Up, 5 = Down, 6 = Left, 7 = Right.
    pub fn bits(&self) -> u8 {
        [
            self.a,
            self.b,
            self.select,
            self.start,
            self.up,
            self.down,
            self.left,
            self.right,
        ]
        .iter()
        .enumerate()
        .fold(0, |acc, (bit, &pressed)| acc | (u8::from(pressed) << bit))
    }

    /// True when no button is held.
    pub fn is_idle(&self) -> bool {
        self.bits() == 0
    }
}

/// An emulation engine driven one displayed frame at a time.
///
/// Dropping the value releases everything the engine holds.
pub trait Emulator: Sized {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct an engine with no cartridge inserted.
    fn new() -> Result<Self, Self::Error>;

    /// Insert a cartridge image and reset the console.
    fn load(&mut self, rom: &[u8]) -> Result<(), Self::Error>;

    /// Latch the pad state sampled by the next frame.
    fn set_input(&mut self, one: ControllerInput, two: Option<ControllerInput>);

    /// Run the console until the next complete picture is available.
    fn step_frame(&mut self) -> Result<(), Self::Error>;

    /// Color of the pixel at (`x`, `y`) of the most recently completed frame.
    fn pixel(&self, x: usize, y: usize) -> Color;
}
