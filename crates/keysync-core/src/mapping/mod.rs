// Keysync Key Normalizer
// Native codes and values to stable physical and logical key ids

pub mod gtk;

use std::collections::HashMap;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::input::NativeKeyEvent;
use crate::key::{plane, to_lower, LogicalKey, PhysicalKey};

/// Microseconds per millisecond, the native time unit on GTK
pub const MICROS_PER_MILLI: u64 = 1000;

/// Platforms with built-in lookup tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    /// XKB keycodes, GDK keyvals and keysym text conversion
    Gtk,
    /// Empty tables; native values are Unicode scalar values
    Generic,
}

impl Platform {
    /// The plane that unknown native codes are generated into
    pub fn plane(self) -> u64 {
        match self {
            Platform::Gtk => plane::GTK,
            Platform::Generic => plane::GENERIC,
        }
    }
}

/// Maps native codes to key ids.
///
/// The lookup tables are built once and only read afterwards. A miss never
/// drops an event: physical keys fall back to the native code placed in the
/// platform plane, logical keys fall back to the lower-cased value in the
/// Unicode plane when it is EASCII, and to the platform plane otherwise.
#[derive(Debug, Clone)]
pub struct KeyMapping {
    platform: Platform,
    platform_plane: u64,
    physical: HashMap<u32, PhysicalKey>,
    logical: HashMap<u32, LogicalKey>,
    time_scale: u64,
}

impl KeyMapping {
    /// Create a mapping with empty tables
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            platform_plane: platform.plane(),
            physical: HashMap::new(),
            logical: HashMap::new(),
            time_scale: MICROS_PER_MILLI,
        }
    }

    /// Create a mapping preloaded with the built-in tables of `platform`
    pub fn for_platform(platform: Platform) -> Self {
        let mut mapping = Self::new(platform);
        if platform == Platform::Gtk {
            mapping.physical = gtk::physical_keys().clone();
            mapping.logical = gtk::logical_keys().clone();
        }
        mapping
    }

    /// The built-in GTK mapping
    pub fn gtk() -> Self {
        Self::for_platform(Platform::Gtk)
    }

    /// Override the plane used for generated ids
    pub fn with_plane(mut self, platform_plane: u64) -> Self {
        self.platform_plane = platform_plane;
        self
    }

    /// Override the number of microseconds per native time unit
    pub fn with_time_scale(mut self, time_scale: u64) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Add or replace a native code to physical key entry
    pub fn insert_physical(&mut self, native_code: u32, key: PhysicalKey) {
        self.physical.insert(native_code, key);
    }

    /// Add or replace a native value to logical key entry
    pub fn insert_logical(&mut self, native_value: u32, key: LogicalKey) {
        self.logical.insert(native_value, key);
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn platform_plane(&self) -> u64 {
        self.platform_plane
    }

    pub fn time_scale(&self) -> u64 {
        self.time_scale
    }

    /// Physical key of a native code
    pub fn physical_key(&self, native_code: u32) -> PhysicalKey {
        match self.physical.get(&native_code) {
            Some(&key) => key,
            None => PhysicalKey::with_plane(u64::from(native_code), self.platform_plane),
        }
    }

    /// Logical key of a native value
    pub fn logical_key(&self, native_value: u32) -> LogicalKey {
        if let Some(&key) = self.logical.get(&native_value) {
            return key;
        }
        let value = u64::from(native_value);
        // EASCII range
        if value < 256 {
            return LogicalKey::with_plane(to_lower(value), plane::UNICODE);
        }
        LogicalKey::with_plane(value, self.platform_plane)
    }

    /// Event timestamp in microseconds
    pub fn timestamp(&self, event: &NativeKeyEvent) -> u64 {
        u64::from(event.time).saturating_mul(self.time_scale)
    }

    /// The text a native value types, if any
    pub fn character(&self, native_value: u32) -> Option<String> {
        let ch = match self.platform {
            Platform::Gtk => gtk::keyval_to_char(native_value),
            Platform::Generic => char::from_u32(native_value),
        }?;
        if ch == '\0' {
            return None;
        }
        Some(ch.to_string())
    }
}

impl Default for KeyMapping {
    fn default() -> Self {
        Self::gtk()
    }
}
