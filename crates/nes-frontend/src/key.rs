//! Physical keys and the pressed/released table hosts write into.
//!
//! Keys are named after the `KeyboardEvent.code` values browsers report, which is also
//! what the command line accepts. The table is a fixed array of atomic flags so an event
//! callback and the frame tick can share it through a plain `&KeyState`.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

macro_rules! keys {
    ($($key:ident => $code:literal,)*) => {
        /// A physical key the front-ends know about
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Key {
            $($key,)*
        }

        impl Key {
            /// Every key, in table order.
            pub const ALL: &'static [Key] = &[$(Key::$key,)*];

            /// The `KeyboardEvent.code` name of this key.
            pub fn code(self) -> &'static str {
                match self {
                    $(Key::$key => $code,)*
                }
            }

            /// Look a key up by its `KeyboardEvent.code` name.
            pub fn from_code(code: &str) -> Option<Key> {
                match code {
                    $($code => Some(Key::$key),)*
                    _ => None,
                }
            }
        }
    };
}

keys! {
    A => "KeyA", B => "KeyB", C => "KeyC", D => "KeyD", E => "KeyE", F => "KeyF",
    G => "KeyG", H => "KeyH", I => "KeyI", J => "KeyJ", K => "KeyK", L => "KeyL",
    M => "KeyM", N => "KeyN", O => "KeyO", P => "KeyP", Q => "KeyQ", R => "KeyR",
    S => "KeyS", T => "KeyT", U => "KeyU", V => "KeyV", W => "KeyW", X => "KeyX",
    Y => "KeyY", Z => "KeyZ",
    Key0 => "Digit0", Key1 => "Digit1", Key2 => "Digit2", Key3 => "Digit3", Key4 => "Digit4",
    Key5 => "Digit5", Key6 => "Digit6", Key7 => "Digit7", Key8 => "Digit8", Key9 => "Digit9",
    Up => "ArrowUp", Down => "ArrowDown", Left => "ArrowLeft", Right => "ArrowRight",
    Enter => "Enter", Escape => "Escape", Space => "Space", Tab => "Tab", Backspace => "Backspace",
    LeftShift => "ShiftLeft", RightShift => "ShiftRight",
    LeftCtrl => "ControlLeft", RightCtrl => "ControlRight",
    LeftAlt => "AltLeft", RightAlt => "AltRight",
    F1 => "F1", F2 => "F2", F3 => "F3", F4 => "F4", F5 => "F5", F6 => "F6",
    F7 => "F7", F8 => "F8", F9 => "F9", F10 => "F10", F11 => "F11", F12 => "F12",
}

impl Key {
    /// Number of keys in the table.
    pub const COUNT: usize = Key::ALL.len();

    fn index(self) -> usize {
        self as usize
    }
}

/// Live pressed flags, one per [`Key`]
#[derive(Debug)]
pub struct KeyState {
    pressed: [AtomicBool; Key::COUNT],
}

impl Default for KeyState {
    fn default() -> Self {
        Self {
            pressed: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: Key, pressed: bool) {
        self.pressed[key.index()].store(pressed, Ordering::Relaxed);
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed[key.index()].load(Ordering::Relaxed)
    }

    /// Forget every held key, e.g. when the window loses focus.
    pub fn release_all(&self) {
        for flag in &self.pressed {
            flag.store(false, Ordering::Relaxed);
        }
    }

    /// Record a key event. Returns whether the host should treat it as handled;
    /// F12 is always passed through so browser developer tools keep working.
    pub fn handle_event(&self, pressed: bool, key: Key) -> bool {
        self.set(key, pressed);
        if key == Key::F12 {
            trace!(pressed, "passing F12 through to the host");
            return false;
        }
        true
    }

    /// Copy the table as it stands right now.
    pub fn snapshot(&self) -> KeySnapshot {
        let mut pressed = [false; Key::COUNT];
        for (slot, flag) in pressed.iter_mut().zip(&self.pressed) {
            *slot = flag.load(Ordering::Relaxed);
        }
        KeySnapshot { pressed }
    }
}

/// Pressed flags frozen at the start of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySnapshot {
    pressed: [bool; Key::COUNT],
}

impl Default for KeySnapshot {
    fn default() -> Self {
        Self {
            pressed: [false; Key::COUNT],
        }
    }
}

impl KeySnapshot {
    /// A snapshot with exactly `keys` held.
    pub fn with_pressed(keys: &[Key]) -> Self {
        let mut snapshot = Self::default();
        for &key in keys {
            snapshot.pressed[key.index()] = true;
        }
        snapshot
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed[key.index()]
    }

    /// Keys held in this snapshot, in table order.
    pub fn pressed(&self) -> impl Iterator<Item = Key> + '_ {
        Key::ALL.iter().copied().filter(|&key| self.is_pressed(key))
    }
}
