// Keysync Record Stores
// Pressing, mapping and lock records owned by a responder

use std::collections::HashMap;

use crate::key::{LogicalKey, PhysicalKey};

/// Keys currently down, and the logical key each one went down with.
///
/// Inserting requires the physical key to be absent and removing requires it
/// to be present. A breach means the event stream or a previous synthesis was
/// inconsistent: it panics in debug builds and is a logged no-op otherwise.
#[derive(Debug, Clone, Default)]
pub struct PressingRecord {
    pressed: HashMap<PhysicalKey, LogicalKey>,
}

impl PressingRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self {
            pressed: HashMap::new(),
        }
    }

    /// Record `physical` as pressed with `logical`.
    ///
    /// Returns false, leaving the record untouched, if it was already pressed.
    pub fn press(&mut self, physical: PhysicalKey, logical: LogicalKey) -> bool {
        if let Some(existing) = self.pressed.get(&physical) {
            log::warn!(
                "pressing record already has {} (logical {}), refusing {}",
                physical,
                existing,
                logical
            );
            debug_assert!(false, "physical key {} pressed twice", physical);
            return false;
        }
        self.pressed.insert(physical, logical);
        true
    }

    /// Record `physical` as released.
    ///
    /// Returns false, leaving the record untouched, if it was not pressed.
    pub fn release(&mut self, physical: PhysicalKey) -> bool {
        if self.pressed.remove(&physical).is_none() {
            log::warn!("pressing record has no {} to release", physical);
            debug_assert!(false, "physical key {} released while not pressed", physical);
            return false;
        }
        true
    }

    /// The logical key `physical` is pressed with, if it is pressed
    pub fn get(&self, physical: PhysicalKey) -> Option<LogicalKey> {
        self.pressed.get(&physical).copied()
    }

    /// Check if a physical key is currently pressed
    pub fn is_pressed(&self, physical: PhysicalKey) -> bool {
        self.pressed.contains_key(&physical)
    }

    pub fn len(&self) -> usize {
        self.pressed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }

    /// Iterate over `(physical, logical)` pairs of pressed keys
    pub fn iter(&self) -> impl Iterator<Item = (PhysicalKey, LogicalKey)> + '_ {
        self.pressed.iter().map(|(&p, &l)| (p, l))
    }

    /// Clear all pressed keys
    pub fn clear(&mut self) {
        self.pressed.clear();
    }
}

/// The physical key last seen going down for each logical key
#[derive(Debug, Clone, Default)]
pub struct MappingRecord {
    mappings: HashMap<LogicalKey, PhysicalKey>,
}

impl MappingRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
        }
    }

    /// Remember that `logical` was last produced by `physical`
    pub fn update(&mut self, logical: LogicalKey, physical: PhysicalKey) {
        self.mappings.insert(logical, physical);
    }

    /// The physical key last recorded for `logical`
    pub fn get(&self, logical: LogicalKey) -> Option<PhysicalKey> {
        self.mappings.get(&logical).copied()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn clear(&mut self) {
        self.mappings.clear();
    }
}

/// Bitmask of lock modes currently enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockRecord {
    bits: u32,
}

impl LockRecord {
    /// Create a record with every lock disabled
    pub fn new() -> Self {
        Self { bits: 0 }
    }

    /// Check if every bit of `bit` is enabled
    pub fn is_enabled(&self, bit: u32) -> bool {
        bit != 0 && self.bits & bit == bit
    }

    /// Flip the lock mode `bit`
    pub fn toggle(&mut self, bit: u32) {
        self.bits ^= bit;
    }

    /// The raw bitmask
    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn clear(&mut self) {
        self.bits = 0;
    }
}

/// The three records a responder keeps, created empty and cleared together
#[derive(Debug, Clone, Default)]
pub struct KeyRecords {
    pub pressing: PressingRecord,
    pub mapping: MappingRecord,
    pub lock: LockRecord,
}

impl KeyRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press or release of `physical`.
    ///
    /// A press also flips the lock bit of `logical`, if it is a lock key.
    pub fn update_pressing(
        &mut self,
        physical: PhysicalKey,
        logical: LogicalKey,
        is_down: bool,
        lock_bits: &HashMap<LogicalKey, u32>,
    ) {
        if is_down {
            self.pressing.press(physical, logical);
            if let Some(&bit) = lock_bits.get(&logical) {
                self.lock.toggle(bit);
            }
        } else {
            self.pressing.release(physical);
        }
    }

    pub fn clear(&mut self) {
        self.pressing.clear();
        self.mapping.clear();
        self.lock.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{logical, physical};

    #[test]
    fn test_pressing_press_release() {
        let mut record = PressingRecord::new();
        assert!(!record.is_pressed(physical::KEY_A));

        assert!(record.press(physical::KEY_A, logical::KEY_A));
        assert!(record.is_pressed(physical::KEY_A));
        assert_eq!(record.get(physical::KEY_A), Some(logical::KEY_A));
        assert_eq!(record.len(), 1);

        assert!(record.release(physical::KEY_A));
        assert!(record.is_empty());
        assert_eq!(record.get(physical::KEY_A), None);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "pressed twice"))]
    fn test_pressing_double_press_is_rejected() {
        let mut record = PressingRecord::new();
        record.press(physical::KEY_A, logical::KEY_A);
        assert!(!record.press(physical::KEY_A, logical::KEY_B));
        assert_eq!(record.get(physical::KEY_A), Some(logical::KEY_A));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "released while not pressed"))]
    fn test_pressing_release_unpressed_is_rejected() {
        let mut record = PressingRecord::new();
        assert!(!record.release(physical::KEY_A));
    }

    #[test]
    fn test_pressing_iter_and_clear() {
        let mut record = PressingRecord::new();
        record.press(physical::KEY_A, logical::KEY_A);
        record.press(physical::SHIFT_LEFT, logical::SHIFT_LEFT);

        let mut pressed: Vec<_> = record.iter().collect();
        pressed.sort();
        assert_eq!(
            pressed,
            vec![
                (physical::KEY_A, logical::KEY_A),
                (physical::SHIFT_LEFT, logical::SHIFT_LEFT)
            ]
        );

        record.clear();
        assert!(record.is_empty());
    }

    #[test]
    fn test_mapping_update_overwrites() {
        let mut record = MappingRecord::new();
        assert_eq!(record.get(logical::SHIFT_LEFT), None);

        record.update(logical::SHIFT_LEFT, physical::SHIFT_LEFT);
        record.update(logical::SHIFT_LEFT, physical::SHIFT_RIGHT);
        assert_eq!(record.get(logical::SHIFT_LEFT), Some(physical::SHIFT_RIGHT));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_lock_toggle() {
        let mut record = LockRecord::new();
        assert!(!record.is_enabled(0x2));

        record.toggle(0x2);
        assert!(record.is_enabled(0x2));
        assert!(!record.is_enabled(0x10));
        assert_eq!(record.bits(), 0x2);

        record.toggle(0x2);
        assert!(!record.is_enabled(0x2));
    }

    #[test]
    fn test_records_press_flips_lock_bit() {
        let lock_bits: HashMap<LogicalKey, u32> = [(logical::CAPS_LOCK, 0x2)].into_iter().collect();
        let mut records = KeyRecords::new();

        records.update_pressing(physical::CAPS_LOCK, logical::CAPS_LOCK, true, &lock_bits);
        assert!(records.lock.is_enabled(0x2));
        records.update_pressing(physical::CAPS_LOCK, logical::CAPS_LOCK, false, &lock_bits);
        assert!(records.lock.is_enabled(0x2));
        assert!(records.pressing.is_empty());

        records.update_pressing(physical::KEY_A, logical::KEY_A, true, &lock_bits);
        assert_eq!(records.lock.bits(), 0x2);

        records.clear();
        assert!(records.pressing.is_empty());
        assert_eq!(records.lock.bits(), 0);
    }

    #[test]
    fn test_lock_zero_bit_is_never_enabled() {
        let record = LockRecord::new();
        assert!(!record.is_enabled(0));
    }
}
