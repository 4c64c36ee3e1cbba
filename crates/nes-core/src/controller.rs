//! Controller input handling
//!
//! Writing 1 then 0 to $4016 latches the pad; each following read shifts out one
//! button, A first. After eight reads an official pad keeps returning 1.

/// Standard NES controller
#[derive(Debug, Clone, Default)]
pub struct StandardController {
    buttons: u8,
    shift: u8,
    strobe: bool,
}

impl StandardController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held buttons (bit layout of `ControllerInput::bits`).
    pub fn set_buttons(&mut self, buttons: u8) {
        self.buttons = buttons;
        if self.strobe {
            self.shift = buttons;
        }
    }

    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    pub fn strobe_write(&mut self, value: u8) {
        self.strobe = value & 0x01 != 0;
        if self.strobe {
            self.shift = self.buttons;
        }
    }

    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return (self.buttons & 1) | 0x40;
        }
        let bit = self.shift & 1;
        self.shift = (self.shift >> 1) | 0x80;
        bit | 0x40
    }
}
