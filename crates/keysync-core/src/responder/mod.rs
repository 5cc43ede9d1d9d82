// Keysync Responders
// Turn native key events into framework key events

mod embedder;
mod lock;
mod pressed;
pub mod stage;

use std::collections::HashMap;

use crate::input::NativeKeyEvent;
use crate::key::LogicalKey;
use crate::mapping::{gtk, KeyMapping};
use crate::modifier::CheckedKeyTable;
use crate::output::ResponseCallback;

pub use embedder::EmbedderResponder;
pub use stage::StateLogic;

/// Something that handles native key events and answers asynchronously.
///
/// `callback` must be called exactly once, with whether the event was
/// handled. It may be called before `handle_event` returns.
pub trait KeyResponder: Send {
    fn handle_event(&mut self, event: &NativeKeyEvent, callback: ResponseCallback);
}

/// Static tables an [`EmbedderResponder`] is built from
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// Native code and value lookup
    pub mapping: KeyMapping,
    /// Modifier bit to one-sided modifier keys
    pub modifiers: CheckedKeyTable,
    /// Lock bit to lock key
    pub locks: CheckedKeyTable,
}

impl ResponderConfig {
    /// The built-in GTK tables
    pub fn gtk() -> Self {
        Self {
            mapping: KeyMapping::gtk(),
            modifiers: gtk::modifier_checked_keys(),
            locks: gtk::lock_checked_keys(),
        }
    }

    /// Lock key to its lock bit, derived from the lock table
    pub fn lock_bits(&self) -> HashMap<LogicalKey, u32> {
        self.locks.bits_by_logical_key()
    }
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self::gtk()
    }
}

/// What the synchronizers know about the event being handled
#[derive(Debug, Clone, Copy)]
pub(crate) struct SyncContext {
    /// Modifier and lock bitmask of the event
    pub state: u32,
    /// Timestamp given to synthesized events
    pub timestamp: u64,
    pub is_down: bool,
    pub event_logical_key: LogicalKey,
}
