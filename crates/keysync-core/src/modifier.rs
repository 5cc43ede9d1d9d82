// Keysync Checked Keys
// Modifier and lock keys whose state is kept in sync with the native bitmask

use std::collections::HashMap;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::key::{LogicalKey, PhysicalKey};

/// Describes a modifier or lock key tracked against one bit of the native
/// state bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckedKey {
    /// The logical key synthesized when the bit demands a press
    pub primary_logical_key: LogicalKey,
    /// Used when no physical key was ever recorded for the primary logical key
    pub primary_physical_key: PhysicalKey,
    /// The other side of a combined bit (ShiftRight for the Shift bit)
    pub secondary_logical_key: Option<LogicalKey>,
    /// The CapsLock-like key whose stage logic is inferred at runtime
    pub is_caps_lock: bool,
}

impl CheckedKey {
    /// A modifier bit covering a left and a right key
    pub fn sided(primary_physical: PhysicalKey, primary: LogicalKey, secondary: LogicalKey) -> Self {
        Self {
            primary_logical_key: primary,
            primary_physical_key: primary_physical,
            secondary_logical_key: Some(secondary),
            is_caps_lock: false,
        }
    }

    /// A bit covering a single key
    pub fn lock(primary_physical: PhysicalKey, primary: LogicalKey) -> Self {
        Self {
            primary_logical_key: primary,
            primary_physical_key: primary_physical,
            secondary_logical_key: None,
            is_caps_lock: false,
        }
    }

    /// Mark this key as the CapsLock-like key
    pub fn with_caps_lock(mut self) -> Self {
        self.is_caps_lock = true;
        self
    }

    /// The primary logical key followed by the secondary one, if any
    pub fn logical_keys(&self) -> SmallVec<[LogicalKey; 2]> {
        let mut keys = SmallVec::new();
        keys.push(self.primary_logical_key);
        if let Some(secondary) = self.secondary_logical_key {
            keys.push(secondary);
        }
        keys
    }

    /// Check if `logical_key` is one of the keys of this bit
    pub fn covers(&self, logical_key: LogicalKey) -> bool {
        self.primary_logical_key == logical_key || self.secondary_logical_key == Some(logical_key)
    }
}

/// Bit to checked key table.
///
/// Iteration follows insertion order so synthesized events come out in a
/// stable order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckedKeyTable {
    keys: IndexMap<u32, CheckedKey>,
}

impl CheckedKeyTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            keys: IndexMap::new(),
        }
    }

    /// Add or replace the checked key of `bit`.
    ///
    /// Returns the previous entry for the bit, if any.
    pub fn insert(&mut self, bit: u32, key: CheckedKey) -> Option<CheckedKey> {
        self.keys.insert(bit, key)
    }

    /// Get the checked key of a bit
    pub fn get(&self, bit: u32) -> Option<&CheckedKey> {
        self.keys.get(&bit)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over `(bit, checked key)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &CheckedKey)> {
        self.keys.iter().map(|(&bit, key)| (bit, key))
    }

    /// Reverse table from each primary logical key to its bit
    pub fn bits_by_logical_key(&self) -> HashMap<LogicalKey, u32> {
        self.keys
            .iter()
            .map(|(&bit, key)| (key.primary_logical_key, bit))
            .collect()
    }
}

impl FromIterator<(u32, CheckedKey)> for CheckedKeyTable {
    fn from_iter<I: IntoIterator<Item = (u32, CheckedKey)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
