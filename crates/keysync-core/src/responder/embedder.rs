// Keysync Embedder Responder
// Normalizes native events and keeps modifier and lock state in sync

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use super::stage::StateLogic;
use super::{lock, pressed, KeyResponder, ResponderConfig, SyncContext};
use crate::action::KeyEventType;
use crate::input::NativeKeyEvent;
use crate::key::LogicalKey;
use crate::mapping::KeyMapping;
use crate::modifier::CheckedKeyTable;
use crate::output::{KeyEvent, KeyEventSink, RecordingSink, ResponseCallback};
use crate::state::{KeyRecords, LockRecord, MappingRecord, PressingRecord};

/// Sends native key events to the framework as normalized key events.
///
/// Before each real event, lock keys and then one-sided modifier keys are
/// reconciled against the event's bitmask, and whatever presses and releases
/// the framework missed are synthesized. A down of a key already recorded
/// pressed, or an up of a key not recorded pressed, is dropped and answered
/// as handled.
///
/// The engine is held weakly. Once it is gone, events still update the
/// records but are answered as handled without being forwarded.
pub struct EmbedderResponder {
    engine: Weak<dyn KeyEventSink>,
    mapping: KeyMapping,
    modifiers: CheckedKeyTable,
    locks: CheckedKeyTable,
    lock_bits: HashMap<LogicalKey, u32>,
    records: KeyRecords,
    caps_lock_logic: StateLogic,
}

impl EmbedderResponder {
    /// Create a responder forwarding to `engine`
    pub fn new(engine: Weak<dyn KeyEventSink>, config: ResponderConfig) -> Self {
        let lock_bits = config.lock_bits();
        Self {
            engine,
            mapping: config.mapping,
            modifiers: config.modifiers,
            locks: config.locks,
            lock_bits,
            records: KeyRecords::new(),
            caps_lock_logic: StateLogic::Undecided,
        }
    }

    /// Create a responder forwarding to `engine`, held weakly
    pub fn attached_to<S: KeyEventSink + 'static>(engine: &Arc<S>, config: ResponderConfig) -> Self {
        let engine: Arc<dyn KeyEventSink> = engine.clone();
        Self::new(Arc::downgrade(&engine), config)
    }

    /// Create a responder with no engine
    pub fn detached(config: ResponderConfig) -> Self {
        let engine: Weak<dyn KeyEventSink> = Weak::<RecordingSink>::new();
        Self::new(engine, config)
    }

    /// Check if the engine is still alive
    pub fn is_attached(&self) -> bool {
        self.engine.strong_count() > 0
    }

    pub fn pressing_record(&self) -> &PressingRecord {
        &self.records.pressing
    }

    pub fn mapping_record(&self) -> &MappingRecord {
        &self.records.mapping
    }

    pub fn lock_record(&self) -> LockRecord {
        self.records.lock
    }

    /// How this platform reports CapsLock, as inferred so far
    pub fn caps_lock_state_logic(&self) -> StateLogic {
        self.caps_lock_logic
    }

    pub fn mapping(&self) -> &KeyMapping {
        &self.mapping
    }
}

impl KeyResponder for EmbedderResponder {
    fn handle_event(&mut self, event: &NativeKeyEvent, callback: ResponseCallback) {
        let physical_key = self.mapping.physical_key(event.native_code);
        let logical_key = self.mapping.logical_key(event.native_value);
        let timestamp = self.mapping.timestamp(event);
        let is_down = event.is_press;
        log::trace!(
            "native {} code={:#x} value={:#x} state={:#x} -> physical={} logical={}",
            KeyEventType::from_press(is_down),
            event.native_code,
            event.native_value,
            event.state,
            physical_key,
            logical_key
        );

        let context = SyncContext {
            state: event.state,
            timestamp,
            is_down,
            event_logical_key: logical_key,
        };
        let mut synthesized = Vec::new();
        lock::synchronize_lock_states(
            &self.locks,
            &self.lock_bits,
            &mut self.records,
            &mut self.caps_lock_logic,
            &context,
            &mut synthesized,
        );
        pressed::synchronize_pressed_states(&self.modifiers, &mut self.records, &context, &mut synthesized);

        let engine = self.engine.upgrade();
        if let Some(engine) = &engine {
            for synthesized_event in &synthesized {
                engine.send_key_event(synthesized_event, None);
            }
        }

        let was_pressed = self.records.pressing.is_pressed(physical_key);
        if was_pressed == is_down {
            log::debug!(
                "dropping {} of {}: key is {} pressed",
                KeyEventType::from_press(is_down),
                physical_key,
                if was_pressed { "already" } else { "not" }
            );
            if let Some(engine) = &engine {
                engine.send_key_event(&KeyEvent::empty(), None);
            }
            callback(true);
            return;
        }

        let character = if is_down {
            self.mapping.character(event.native_value)
        } else {
            None
        };
        let out_event = KeyEvent {
            timestamp,
            event_type: KeyEventType::from_press(is_down),
            physical: physical_key,
            logical: logical_key,
            character,
            synthesized: false,
        };

        self.records
            .update_pressing(physical_key, logical_key, is_down, &self.lock_bits);
        if is_down {
            self.records.mapping.update(logical_key, physical_key);
        }

        match engine {
            Some(engine) => {
                log::trace!("forwarding {}", out_event);
                engine.send_key_event(&out_event, Some(callback));
            }
            None => callback(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{logical, physical};
    use crate::mapping::gtk::{self, keycode, keyval};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn respond_into(flag: &Arc<AtomicBool>) -> ResponseCallback {
        let flag = Arc::clone(flag);
        Box::new(move |handled| flag.store(handled, Ordering::SeqCst))
    }

    #[test]
    fn test_forwards_real_event_with_character() {
        let sink = Arc::new(RecordingSink::auto_respond(false));
        let mut responder = EmbedderResponder::attached_to(&sink, ResponderConfig::gtk());
        let handled = Arc::new(AtomicBool::new(true));

        responder.handle_event(&NativeKeyEvent::press(keycode::KEY_A, 'a' as u32).at(5), respond_into(&handled));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].physical, physical::KEY_A);
        assert_eq!(events[0].logical, logical::KEY_A);
        assert_eq!(events[0].character.as_deref(), Some("a"));
        assert_eq!(events[0].timestamp, 5000);
        assert!(!events[0].synthesized);
        assert!(!handled.load(Ordering::SeqCst));
        assert_eq!(responder.pressing_record().get(physical::KEY_A), Some(logical::KEY_A));
        assert_eq!(responder.mapping_record().get(logical::KEY_A), Some(physical::KEY_A));
    }

    #[test]
    fn test_up_event_has_no_character() {
        let sink = Arc::new(RecordingSink::auto_respond(true));
        let mut responder = EmbedderResponder::attached_to(&sink, ResponderConfig::gtk());

        responder.handle_event(&NativeKeyEvent::press(keycode::KEY_A, 'a' as u32), Box::new(|_: bool| {}));
        responder.handle_event(&NativeKeyEvent::release(keycode::KEY_A, 'a' as u32), Box::new(|_: bool| {}));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, KeyEventType::Up);
        assert!(events[1].character.is_none());
        assert!(responder.pressing_record().is_empty());
    }

    #[test]
    fn test_stale_up_is_dropped() {
        let sink = Arc::new(RecordingSink::new());
        let mut responder = EmbedderResponder::attached_to(&sink, ResponderConfig::gtk());
        let handled = Arc::new(AtomicBool::new(false));

        responder.handle_event(&NativeKeyEvent::release(keycode::KEY_A, 'a' as u32), respond_into(&handled));

        assert!(handled.load(Ordering::SeqCst));
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_empty());
        assert_eq!(sink.pending_responses(), 0);
    }

    #[test]
    fn test_detached_acknowledges_and_records() {
        let mut responder = EmbedderResponder::detached(ResponderConfig::gtk());
        assert!(!responder.is_attached());
        let handled = Arc::new(AtomicBool::new(false));

        responder.handle_event(
            &NativeKeyEvent::press(keycode::SHIFT_LEFT, keyval::SHIFT_L),
            respond_into(&handled),
        );

        assert!(handled.load(Ordering::SeqCst));
        assert!(responder.pressing_record().is_pressed(physical::SHIFT_LEFT));
    }

    #[test]
    fn test_engine_dropped_later() {
        let sink = Arc::new(RecordingSink::auto_respond(false));
        let mut responder = EmbedderResponder::attached_to(&sink, ResponderConfig::gtk());
        assert!(responder.is_attached());
        drop(sink);
        assert!(!responder.is_attached());

        let handled = Arc::new(AtomicBool::new(false));
        responder.handle_event(&NativeKeyEvent::press(keycode::KEY_A, 'a' as u32), respond_into(&handled));
        assert!(handled.load(Ordering::SeqCst));
    }

    #[test]
    fn test_synthesized_events_precede_real_event() {
        let sink = Arc::new(RecordingSink::auto_respond(true));
        let mut responder = EmbedderResponder::attached_to(&sink, ResponderConfig::gtk());

        let event = NativeKeyEvent::press(keycode::KEY_A, 'A' as u32).with_state(gtk::SHIFT_MASK | gtk::MOD2_MASK);
        responder.handle_event(&event, Box::new(|_: bool| {}));

        let events = sink.events();
        let summary: Vec<(bool, _)> = events.iter().map(|e| (e.synthesized, e.logical)).collect();
        assert_eq!(
            summary,
            vec![
                (true, logical::NUM_LOCK),
                (true, logical::SHIFT_LEFT),
                (false, logical::KEY_A),
            ]
        );
        assert_eq!(events[2].character.as_deref(), Some("A"));
        assert!(responder.lock_record().is_enabled(gtk::MOD2_MASK));
    }
}
