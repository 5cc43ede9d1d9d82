// Keysync Input Layer - Native Key Events
// The raw event record delivered by the platform

/// GDK event type code for a key press
pub const KEY_PRESS_TYPE: u64 = 8;
/// GDK event type code for a key release
pub const KEY_RELEASE_TYPE: u64 = 9;

/// A raw key event as delivered by the native windowing system.
///
/// The modifier/lock bitmask is a snapshot taken by the platform, and the
/// platform decides whether it describes the state before or after the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeKeyEvent {
    /// Native physical code (the XKB keycode on GTK)
    pub native_code: u32,
    /// Native logical value (the keyval on GTK)
    pub native_value: u32,
    /// Modifier and lock bitmask snapshot
    pub state: u32,
    /// True for a press, false for a release
    pub is_press: bool,
    /// Timestamp in native units (milliseconds on GTK)
    pub time: u32,
}

impl NativeKeyEvent {
    /// Create a press event with an empty state and a zero timestamp
    pub fn press(native_code: u32, native_value: u32) -> Self {
        Self {
            native_code,
            native_value,
            state: 0,
            is_press: true,
            time: 0,
        }
    }

    /// Create a release event with an empty state and a zero timestamp
    pub fn release(native_code: u32, native_value: u32) -> Self {
        Self {
            is_press: false,
            ..Self::press(native_code, native_value)
        }
    }

    /// Replace the modifier/lock bitmask
    pub fn with_state(mut self, state: u32) -> Self {
        self.state = state;
        self
    }

    /// Replace the timestamp
    pub fn at(mut self, time: u32) -> Self {
        self.time = time;
        self
    }

    /// Identity hash derived only from the event data.
    ///
    /// Used to recognize an event the host redispatched back to us.
    pub fn identity_hash(&self) -> u64 {
        let event_type = if self.is_press {
            KEY_PRESS_TYPE
        } else {
            KEY_RELEASE_TYPE
        };
        let code = u64::from(self.native_code);
        (u64::from(self.time) & 0xffff_ffff) | ((event_type & 0xffff) << 32) | ((code & 0xffff) << 48)
    }
}
