// Keysync GTK Tables
// XKB keycodes, GDK keyvals and GDK modifier bits

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::key::{logical, physical, LogicalKey, PhysicalKey};
use crate::modifier::{CheckedKey, CheckedKeyTable};

pub const SHIFT_MASK: u32 = 1 << 0;
pub const LOCK_MASK: u32 = 1 << 1;
pub const CONTROL_MASK: u32 = 1 << 2;
pub const MOD1_MASK: u32 = 1 << 3;
pub const MOD2_MASK: u32 = 1 << 4;
pub const META_MASK: u32 = 1 << 28;

/// GDK keyvals referenced outside of the lookup tables
pub mod keyval {
    pub const BACKSPACE: u32 = 0xff08;
    pub const TAB: u32 = 0xff09;
    pub const RETURN: u32 = 0xff0d;
    pub const ESCAPE: u32 = 0xff1b;
    pub const NUM_LOCK: u32 = 0xff7f;
    pub const SHIFT_L: u32 = 0xffe1;
    pub const SHIFT_R: u32 = 0xffe2;
    pub const CONTROL_L: u32 = 0xffe3;
    pub const CONTROL_R: u32 = 0xffe4;
    pub const CAPS_LOCK: u32 = 0xffe5;
    pub const ALT_L: u32 = 0xffe9;
    pub const DELETE: u32 = 0xffff;
}

/// XKB keycodes referenced outside of the lookup tables
pub mod keycode {
    pub const ESCAPE: u32 = 0x09;
    pub const ENTER: u32 = 0x24;
    pub const CONTROL_LEFT: u32 = 0x25;
    pub const KEY_A: u32 = 0x26;
    pub const SHIFT_LEFT: u32 = 0x32;
    pub const KEY_B: u32 = 0x38;
    pub const SHIFT_RIGHT: u32 = 0x3e;
    pub const ALT_LEFT: u32 = 0x40;
    pub const SPACE: u32 = 0x41;
    pub const CAPS_LOCK: u32 = 0x42;
    pub const NUM_LOCK: u32 = 0x4d;
}

/// XKB keycode to physical key
pub fn physical_keys() -> &'static HashMap<u32, PhysicalKey> {
    static TABLE: OnceLock<HashMap<u32, PhysicalKey>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let entries: &[(u32, u64)] = &[
            (0x09, 0x0007_0029), // Escape
            (0x0a, 0x0007_001e), // Digit1
            (0x0b, 0x0007_001f), // Digit2
            (0x0c, 0x0007_0020), // Digit3
            (0x0d, 0x0007_0021), // Digit4
            (0x0e, 0x0007_0022), // Digit5
            (0x0f, 0x0007_0023), // Digit6
            (0x10, 0x0007_0024), // Digit7
            (0x11, 0x0007_0025), // Digit8
            (0x12, 0x0007_0026), // Digit9
            (0x13, 0x0007_0027), // Digit0
            (0x14, 0x0007_002d), // Minus
            (0x15, 0x0007_002e), // Equal
            (0x16, 0x0007_002a), // Backspace
            (0x17, 0x0007_002b), // Tab
            (0x18, 0x0007_0014), // KeyQ
            (0x19, 0x0007_001a), // KeyW
            (0x1a, 0x0007_0008), // KeyE
            (0x1b, 0x0007_0015), // KeyR
            (0x1c, 0x0007_0017), // KeyT
            (0x1d, 0x0007_001c), // KeyY
            (0x1e, 0x0007_0018), // KeyU
            (0x1f, 0x0007_000c), // KeyI
            (0x20, 0x0007_0012), // KeyO
            (0x21, 0x0007_0013), // KeyP
            (0x22, 0x0007_002f), // BracketLeft
            (0x23, 0x0007_0030), // BracketRight
            (0x24, 0x0007_0028), // Enter
            (0x25, 0x0007_00e0), // ControlLeft
            (0x26, 0x0007_0004), // KeyA
            (0x27, 0x0007_0016), // KeyS
            (0x28, 0x0007_0007), // KeyD
            (0x29, 0x0007_0009), // KeyF
            (0x2a, 0x0007_000a), // KeyG
            (0x2b, 0x0007_000b), // KeyH
            (0x2c, 0x0007_000d), // KeyJ
            (0x2d, 0x0007_000e), // KeyK
            (0x2e, 0x0007_000f), // KeyL
            (0x2f, 0x0007_0033), // Semicolon
            (0x30, 0x0007_0034), // Quote
            (0x31, 0x0007_0035), // Backquote
            (0x32, 0x0007_00e1), // ShiftLeft
            (0x33, 0x0007_0031), // Backslash
            (0x34, 0x0007_001d), // KeyZ
            (0x35, 0x0007_001b), // KeyX
            (0x36, 0x0007_0006), // KeyC
            (0x37, 0x0007_0019), // KeyV
            (0x38, 0x0007_0005), // KeyB
            (0x39, 0x0007_0011), // KeyN
            (0x3a, 0x0007_0010), // KeyM
            (0x3b, 0x0007_0036), // Comma
            (0x3c, 0x0007_0037), // Period
            (0x3d, 0x0007_0038), // Slash
            (0x3e, 0x0007_00e5), // ShiftRight
            (0x3f, 0x0007_0055), // NumpadMultiply
            (0x40, 0x0007_00e2), // AltLeft
            (0x41, 0x0007_002c), // Space
            (0x42, 0x0007_0039), // CapsLock
            (0x43, 0x0007_003a), // F1
            (0x44, 0x0007_003b), // F2
            (0x45, 0x0007_003c), // F3
            (0x46, 0x0007_003d), // F4
            (0x47, 0x0007_003e), // F5
            (0x48, 0x0007_003f), // F6
            (0x49, 0x0007_0040), // F7
            (0x4a, 0x0007_0041), // F8
            (0x4b, 0x0007_0042), // F9
            (0x4c, 0x0007_0043), // F10
            (0x4d, 0x0007_0053), // NumLock
            (0x4e, 0x0007_0047), // ScrollLock
            (0x5f, 0x0007_0044), // F11
            (0x60, 0x0007_0045), // F12
            (0x69, 0x0007_00e4), // ControlRight
            (0x6c, 0x0007_00e6), // AltRight
            (0x6e, 0x0007_004a), // Home
            (0x6f, 0x0007_0052), // ArrowUp
            (0x70, 0x0007_004b), // PageUp
            (0x71, 0x0007_0050), // ArrowLeft
            (0x72, 0x0007_004f), // ArrowRight
            (0x73, 0x0007_004d), // End
            (0x74, 0x0007_0051), // ArrowDown
            (0x75, 0x0007_004e), // PageDown
            (0x76, 0x0007_0049), // Insert
            (0x77, 0x0007_004c), // Delete
            (0x85, 0x0007_00e3), // MetaLeft
            (0x86, 0x0007_00e7), // MetaRight
        ];
        entries
            .iter()
            .map(|&(code, id)| (code, PhysicalKey(id)))
            .collect()
    })
}

/// GDK keyval to logical key, for keyvals that don't derive from Unicode
pub fn logical_keys() -> &'static HashMap<u32, LogicalKey> {
    static TABLE: OnceLock<HashMap<u32, LogicalKey>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = HashMap::new();
        table.insert(keyval::BACKSPACE, logical::BACKSPACE);
        table.insert(keyval::TAB, logical::TAB);
        table.insert(keyval::RETURN, logical::ENTER);
        table.insert(0xff8d, logical::ENTER); // KP_Enter
        table.insert(keyval::ESCAPE, logical::ESCAPE);
        table.insert(keyval::DELETE, logical::DELETE);
        table.insert(0xff14, logical::SCROLL_LOCK);
        table.insert(keyval::NUM_LOCK, logical::NUM_LOCK);
        table.insert(keyval::CAPS_LOCK, logical::CAPS_LOCK);
        table.insert(keyval::SHIFT_L, logical::SHIFT_LEFT);
        table.insert(keyval::SHIFT_R, logical::SHIFT_RIGHT);
        table.insert(keyval::CONTROL_L, logical::CONTROL_LEFT);
        table.insert(keyval::CONTROL_R, logical::CONTROL_RIGHT);
        table.insert(0xffe7, logical::META_LEFT); // Meta_L
        table.insert(0xffe8, logical::META_RIGHT); // Meta_R
        table.insert(0xffeb, logical::META_LEFT); // Super_L
        table.insert(0xffec, logical::META_RIGHT); // Super_R
        table.insert(keyval::ALT_L, logical::ALT_LEFT);
        table.insert(0xffea, logical::ALT_RIGHT); // Alt_R
        table.insert(0xff50, logical::HOME);
        table.insert(0xff51, logical::ARROW_LEFT);
        table.insert(0xff52, logical::ARROW_UP);
        table.insert(0xff53, logical::ARROW_RIGHT);
        table.insert(0xff54, logical::ARROW_DOWN);
        table.insert(0xff55, logical::PAGE_UP);
        table.insert(0xff56, logical::PAGE_DOWN);
        table.insert(0xff57, logical::END);
        table.insert(0xff63, logical::INSERT);
        // F1 (0xffbe) through F12 (0xffc9)
        for n in 0..12u32 {
            table.insert(0xffbe + n, LogicalKey(logical::F1.0 + u64::from(n)));
        }
        table
    })
}

/// Modifier bits whose one-sided keys are kept in sync
pub fn modifier_checked_keys() -> CheckedKeyTable {
    let mut table = CheckedKeyTable::new();
    table.insert(
        SHIFT_MASK,
        CheckedKey::sided(physical::SHIFT_LEFT, logical::SHIFT_LEFT, logical::SHIFT_RIGHT),
    );
    table.insert(
        CONTROL_MASK,
        CheckedKey::sided(physical::CONTROL_LEFT, logical::CONTROL_LEFT, logical::CONTROL_RIGHT),
    );
    table.insert(
        MOD1_MASK,
        CheckedKey::sided(physical::ALT_LEFT, logical::ALT_LEFT, logical::ALT_RIGHT),
    );
    table.insert(
        META_MASK,
        CheckedKey::sided(physical::META_LEFT, logical::META_LEFT, logical::META_RIGHT),
    );
    table
}

/// Lock bits whose lock keys are kept in sync
pub fn lock_checked_keys() -> CheckedKeyTable {
    let mut table = CheckedKeyTable::new();
    table.insert(
        LOCK_MASK,
        CheckedKey::lock(physical::CAPS_LOCK, logical::CAPS_LOCK).with_caps_lock(),
    );
    table.insert(MOD2_MASK, CheckedKey::lock(physical::NUM_LOCK, logical::NUM_LOCK));
    table
}

/// Convert a keysym to the character it types, like `gdk_keyval_to_unicode`.
pub fn keyval_to_char(sym: u32) -> Option<char> {
    let code = match sym {
        // Latin-1 maps to itself
        0x20..=0x7e | 0xa0..=0xff => sym,
        // Directly encoded Unicode keysyms
        0x0100_0100..=0x0110_ffff => sym & 0x00ff_ffff,
        keyval::BACKSPACE => 0x08,
        keyval::TAB => 0x09,
        0xff0a => 0x0a, // Linefeed
        0xff0b => 0x0b, // Clear
        keyval::RETURN => 0x0d,
        keyval::ESCAPE => 0x1b,
        keyval::DELETE => 0x7f,
        0xff80 => 0x20, // KP_Space
        0xff89 => 0x09, // KP_Tab
        0xff8d => 0x0d, // KP_Enter
        0xffaa => '*' as u32,
        0xffab => '+' as u32,
        0xffac => ',' as u32,
        0xffad => '-' as u32,
        0xffae => '.' as u32,
        0xffaf => '/' as u32,
        0xffb0..=0xffb9 => sym - 0xffb0 + '0' as u32,
        0xffbd => '=' as u32,
        _ => return None,
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_table() {
        assert_eq!(physical_keys().get(&keycode::KEY_A), Some(&physical::KEY_A));
        assert_eq!(physical_keys().get(&keycode::SHIFT_LEFT), Some(&physical::SHIFT_LEFT));
        assert_eq!(physical_keys().get(&keycode::CAPS_LOCK), Some(&physical::CAPS_LOCK));
        assert_eq!(physical_keys().get(&0x01), None);
    }

    #[test]
    fn test_logical_table() {
        assert_eq!(logical_keys().get(&keyval::SHIFT_L), Some(&logical::SHIFT_LEFT));
        assert_eq!(logical_keys().get(&keyval::CAPS_LOCK), Some(&logical::CAPS_LOCK));
        assert_eq!(logical_keys().get(&0xffc9), Some(&LogicalKey(0x001_0000_080c)));
        // Printable keyvals are left to the Unicode fallback
        assert_eq!(logical_keys().get(&0x61), None);
    }

    #[test]
    fn test_keyval_to_char() {
        assert_eq!(keyval_to_char(0x61), Some('a'));
        assert_eq!(keyval_to_char(0x41), Some('A'));
        assert_eq!(keyval_to_char(0xe9), Some('é'));
        assert_eq!(keyval_to_char(0x0100_20ac), Some('€'));
        assert_eq!(keyval_to_char(keyval::RETURN), Some('\r'));
        assert_eq!(keyval_to_char(0xffb7), Some('7'));
        assert_eq!(keyval_to_char(keyval::SHIFT_L), None);
        assert_eq!(keyval_to_char(keyval::CAPS_LOCK), None);
    }

    #[test]
    fn test_default_checked_tables() {
        let modifiers = modifier_checked_keys();
        assert_eq!(modifiers.len(), 4);
        let shift = modifiers.get(SHIFT_MASK).unwrap();
        assert_eq!(shift.primary_logical_key, logical::SHIFT_LEFT);
        assert_eq!(shift.secondary_logical_key, Some(logical::SHIFT_RIGHT));

        let locks = lock_checked_keys();
        assert!(locks.get(LOCK_MASK).unwrap().is_caps_lock);
        assert!(!locks.get(MOD2_MASK).unwrap().is_caps_lock);
    }
}
