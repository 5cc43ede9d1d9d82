use strum_macros::{AsRefStr, Display, EnumString};

/// The type of a normalized key event sent downstream.
///
/// Repeats are not modeled: a second down for a key that is still recorded
/// as pressed is treated as a ghost signal by the responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[repr(i32)]
pub enum KeyEventType {
    Up = 0,
    Down = 1,
}

impl KeyEventType {
    /// Pick the type matching a native press/release flag
    pub fn from_press(is_press: bool) -> Self {
        if is_press {
            KeyEventType::Down
        } else {
            KeyEventType::Up
        }
    }

    /// Returns true if this is a DOWN event
    pub fn is_down(self) -> bool {
        matches!(self, KeyEventType::Down)
    }

    /// Returns true if this is an UP event
    pub fn is_up(self) -> bool {
        matches!(self, KeyEventType::Up)
    }

    /// Create KeyEventType from its i32 value
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyEventType::Up),
            1 => Some(KeyEventType::Down),
            _ => None,
        }
    }

    /// Convert KeyEventType to its i32 representation
    pub fn to_i32(self) -> i32 {
        self as i32
    }
}
