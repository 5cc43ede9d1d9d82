// Keysync Output Layer - Framework Key Events
// The normalized event record forwarded to the engine

use std::fmt;

use crate::action::KeyEventType;
use crate::key::{LogicalKey, PhysicalKey};

/// A normalized key event as the framework receives it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Monotonic timestamp in microseconds
    pub timestamp: u64,
    pub event_type: KeyEventType,
    pub physical: PhysicalKey,
    pub logical: LogicalKey,
    /// Text typed by a down event, if any
    pub character: Option<String>,
    /// True for events the responder generated to keep state in sync
    pub synthesized: bool,
}

impl KeyEvent {
    /// A synthesized event, which never carries text
    pub fn synthesized(
        timestamp: u64,
        event_type: KeyEventType,
        physical: PhysicalKey,
        logical: LogicalKey,
    ) -> Self {
        Self {
            timestamp,
            event_type,
            physical,
            logical,
            character: None,
            synthesized: true,
        }
    }

    /// The structurally empty event sent in place of a suppressed one.
    ///
    /// Its zero keys tell the engine there is no event to deliver, which
    /// keeps the transport's request/response pairing intact.
    pub fn empty() -> Self {
        Self {
            timestamp: 0,
            event_type: KeyEventType::Down,
            physical: PhysicalKey(0),
            logical: LogicalKey(0),
            character: None,
            synthesized: false,
        }
    }

    /// Check if this is the empty event
    pub fn is_empty(&self) -> bool {
        self.physical.0 == 0 && self.logical.0 == 0
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(empty)");
        }
        write!(
            f,
            "{:>4} physical={} logical={} t={}",
            self.event_type, self.physical, self.logical, self.timestamp
        )?;
        if let Some(character) = &self.character {
            write!(f, " char={:?}", character)?;
        }
        if self.synthesized {
            write!(f, " (synthesized)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{logical, physical};

    #[test]
    fn test_empty_event() {
        let event = KeyEvent::empty();
        assert!(event.is_empty());
        assert!(!event.synthesized);
        assert_eq!(event.to_string(), "(empty)");
    }

    #[test]
    fn test_synthesized_event_has_no_character() {
        let event = KeyEvent::synthesized(
            5,
            KeyEventType::Up,
            physical::SHIFT_LEFT,
            logical::SHIFT_LEFT,
        );
        assert!(event.synthesized);
        assert!(event.character.is_none());
        assert!(!event.is_empty());
    }

    #[test]
    fn test_display() {
        let event = KeyEvent {
            timestamp: 1000,
            event_type: KeyEventType::Down,
            physical: physical::KEY_A,
            logical: logical::KEY_A,
            character: Some("a".to_string()),
            synthesized: false,
        };
        assert_eq!(
            event.to_string(),
            "down physical=0x00000070004 logical=0x00000000061 t=1000 char=\"a\""
        );
    }
}
