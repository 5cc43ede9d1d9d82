// Keysync Key Identifiers
// Platform independent physical and logical key ids

use std::fmt;

/// Id planes.
///
/// The high bits of a key id tell where the id came from, the low 32 bits
/// carry the value. Ids that come from a known mapping live in the shared
/// planes; everything else is generated into a platform plane so that two
/// platforms can never produce colliding ids.
pub mod plane {
    /// Mask for the 32-bit value portion of a key id
    pub const VALUE_MASK: u64 = 0x000_ffff_ffff;
    /// Keys that have a Unicode representation
    pub const UNICODE: u64 = 0x000_0000_0000;
    /// Non printable keys shared by every platform
    pub const UNPRINTABLE: u64 = 0x001_0000_0000;
    /// Keys that only make sense to the framework (sided modifiers)
    pub const FRAMEWORK: u64 = 0x002_0000_0000;
    /// Keys generated from unknown GTK key codes and keyvals
    pub const GTK: u64 = 0x015_0000_0000;
    /// Keys generated from unknown Windows key codes and scan codes
    pub const WINDOWS: u64 = 0x016_0000_0000;
    /// Keys generated by an embedder without built-in tables
    pub const GENERIC: u64 = 0x01f_0000_0000;

    /// Replace the plane of `id` with `plane`, keeping its value bits
    pub fn apply(id: u64, plane: u64) -> u64 {
        (id & VALUE_MASK) | plane
    }

    /// The plane bits of `id`
    pub fn of(id: u64) -> u64 {
        id & !VALUE_MASK
    }
}

/// Identifier of a keyboard location, independent of layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PhysicalKey(pub u64);

/// Identifier of the meaning a key currently produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct LogicalKey(pub u64);

macro_rules! key_id_impls {
    ($ty:ident) => {
        impl $ty {
            /// Build an id from a raw value placed into `plane`
            pub fn with_plane(value: u64, plane: u64) -> Self {
                $ty(plane::apply(value, plane))
            }

            /// Get the raw 64-bit id
            pub fn id(self) -> u64 {
                self.0
            }

            /// Get the 32-bit value payload
            pub fn value(self) -> u64 {
                self.0 & plane::VALUE_MASK
            }

            /// Get the plane bits
            pub fn plane(self) -> u64 {
                plane::of(self.0)
            }
        }

        impl From<u64> for $ty {
            fn from(id: u64) -> Self {
                $ty(id)
            }
        }

        impl From<$ty> for u64 {
            fn from(key: $ty) -> Self {
                key.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{:011x}", self.0)
            }
        }
    };
}

key_id_impls!(PhysicalKey);
key_id_impls!(LogicalKey);

/// Fold upper case letters of the ASCII and extended ASCII ranges to lower
/// case. Anything else is returned as-is. Independent of locale.
pub fn to_lower(n: u64) -> u64 {
    const LOWER_A: u64 = 0x61;
    const UPPER_A: u64 = 0x41;
    const UPPER_Z: u64 = 0x5a;

    const LOWER_A_GRAVE: u64 = 0xe0;
    const UPPER_A_GRAVE: u64 = 0xc0;
    const UPPER_THORN: u64 = 0xde;
    const DIVISION: u64 = 0xf7;

    if (UPPER_A..=UPPER_Z).contains(&n) {
        return n - UPPER_A + LOWER_A;
    }

    if (UPPER_A_GRAVE..=UPPER_THORN).contains(&n) && n != DIVISION {
        return n - UPPER_A_GRAVE + LOWER_A_GRAVE;
    }

    n
}

/// Well known physical keys (USB HID usage ids)
pub mod physical {
    use super::PhysicalKey;

    pub const KEY_A: PhysicalKey = PhysicalKey(0x0007_0004);
    pub const KEY_B: PhysicalKey = PhysicalKey(0x0007_0005);
    pub const KEY_Q: PhysicalKey = PhysicalKey(0x0007_0014);
    pub const ENTER: PhysicalKey = PhysicalKey(0x0007_0028);
    pub const ESCAPE: PhysicalKey = PhysicalKey(0x0007_0029);
    pub const SPACE: PhysicalKey = PhysicalKey(0x0007_002c);
    pub const CAPS_LOCK: PhysicalKey = PhysicalKey(0x0007_0039);
    pub const SCROLL_LOCK: PhysicalKey = PhysicalKey(0x0007_0047);
    pub const NUM_LOCK: PhysicalKey = PhysicalKey(0x0007_0053);
    pub const CONTROL_LEFT: PhysicalKey = PhysicalKey(0x0007_00e0);
    pub const SHIFT_LEFT: PhysicalKey = PhysicalKey(0x0007_00e1);
    pub const ALT_LEFT: PhysicalKey = PhysicalKey(0x0007_00e2);
    pub const META_LEFT: PhysicalKey = PhysicalKey(0x0007_00e3);
    pub const CONTROL_RIGHT: PhysicalKey = PhysicalKey(0x0007_00e4);
    pub const SHIFT_RIGHT: PhysicalKey = PhysicalKey(0x0007_00e5);
    pub const ALT_RIGHT: PhysicalKey = PhysicalKey(0x0007_00e6);
    pub const META_RIGHT: PhysicalKey = PhysicalKey(0x0007_00e7);
}

/// Well known logical keys
pub mod logical {
    use super::LogicalKey;

    pub const BACKSPACE: LogicalKey = LogicalKey(0x001_0000_0008);
    pub const TAB: LogicalKey = LogicalKey(0x001_0000_0009);
    pub const ENTER: LogicalKey = LogicalKey(0x001_0000_000d);
    pub const ESCAPE: LogicalKey = LogicalKey(0x001_0000_001b);
    pub const DELETE: LogicalKey = LogicalKey(0x001_0000_007f);
    pub const CAPS_LOCK: LogicalKey = LogicalKey(0x001_0000_0104);
    pub const NUM_LOCK: LogicalKey = LogicalKey(0x001_0000_010a);
    pub const SCROLL_LOCK: LogicalKey = LogicalKey(0x001_0000_010c);
    pub const ARROW_DOWN: LogicalKey = LogicalKey(0x001_0000_0301);
    pub const ARROW_LEFT: LogicalKey = LogicalKey(0x001_0000_0302);
    pub const ARROW_RIGHT: LogicalKey = LogicalKey(0x001_0000_0303);
    pub const ARROW_UP: LogicalKey = LogicalKey(0x001_0000_0304);
    pub const END: LogicalKey = LogicalKey(0x001_0000_0305);
    pub const HOME: LogicalKey = LogicalKey(0x001_0000_0306);
    pub const PAGE_DOWN: LogicalKey = LogicalKey(0x001_0000_0307);
    pub const PAGE_UP: LogicalKey = LogicalKey(0x001_0000_0308);
    pub const INSERT: LogicalKey = LogicalKey(0x001_0000_0407);
    pub const F1: LogicalKey = LogicalKey(0x001_0000_0801);
    pub const CONTROL_LEFT: LogicalKey = LogicalKey(0x002_0000_0100);
    pub const CONTROL_RIGHT: LogicalKey = LogicalKey(0x002_0000_0101);
    pub const SHIFT_LEFT: LogicalKey = LogicalKey(0x002_0000_0102);
    pub const SHIFT_RIGHT: LogicalKey = LogicalKey(0x002_0000_0103);
    pub const ALT_LEFT: LogicalKey = LogicalKey(0x002_0000_0104);
    pub const ALT_RIGHT: LogicalKey = LogicalKey(0x002_0000_0105);
    pub const META_LEFT: LogicalKey = LogicalKey(0x002_0000_0106);
    pub const META_RIGHT: LogicalKey = LogicalKey(0x002_0000_0107);
    pub const KEY_A: LogicalKey = LogicalKey(0x61);
    pub const KEY_B: LogicalKey = LogicalKey(0x62);
    pub const SPACE: LogicalKey = LogicalKey(0x20);
}
