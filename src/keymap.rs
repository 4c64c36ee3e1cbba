//! minifb key codes to front-end keys

use minifb::Key as WindowKey;
use nes_frontend::Key;

macro_rules! same_names {
    ($key:expr, $($name:ident),* $(,)?) => {
        match $key {
            $(WindowKey::$name => Some(Key::$name),)*
            _ => None,
        }
    };
}

/// Translate a window key. Keys the front-end has no name for are dropped.
pub fn translate(key: WindowKey) -> Option<Key> {
    same_names!(
        key,
        A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
        Key0, Key1, Key2, Key3, Key4, Key5, Key6, Key7, Key8, Key9,
        Up, Down, Left, Right, Enter, Escape, Space, Tab, Backspace,
        LeftShift, RightShift, LeftCtrl, RightCtrl, LeftAlt, RightAlt,
        F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    )
}
