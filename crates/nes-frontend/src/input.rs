//! Key-to-button mapping

use nes_core::ControllerInput;

use crate::key::{Key, KeySnapshot};

/// Which key drives each button of controller one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    pub a: Key,
    pub b: Key,
    pub up: Key,
    pub down: Key,
    pub left: Key,
    pub right: Key,
    pub select: Key,
    pub start: Key,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            a: Key::Z,
            b: Key::X,
            up: Key::Up,
            down: Key::Down,
            left: Key::Left,
            right: Key::Right,
            select: Key::RightShift,
            start: Key::Enter,
        }
    }
}

impl Bindings {
    /// Derive controller state from the held keys. Unbound keys are ignored.
    pub fn map(&self, keys: &KeySnapshot) -> ControllerInput {
        ControllerInput {
            a: keys.is_pressed(self.a),
            b: keys.is_pressed(self.b),
            up: keys.is_pressed(self.up),
            down: keys.is_pressed(self.down),
            left: keys.is_pressed(self.left),
            right: keys.is_pressed(self.right),
            select: keys.is_pressed(self.select),
            start: keys.is_pressed(self.start),
        }
    }

    /// The bound keys in A, B, Up, Down, Left, Right, Select, Start order.
    pub fn keys(&self) -> [Key; 8] {
        [
            self.a,
            self.b,
            self.up,
            self.down,
            self.left,
            self.right,
            self.select,
            self.start,
        ]
    }

    pub fn is_bound(&self, key: Key) -> bool {
        self.keys().contains(&key)
    }
}
