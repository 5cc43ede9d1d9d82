// Keysync Keyboard Manager
// Fans native events out to responders and redispatches what nobody handled

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::input::NativeKeyEvent;
use crate::responder::KeyResponder;

/// Gets the last chance at an event no responder handled
pub trait TextInputFilter: Send + Sync {
    /// Returns true if the event was consumed as text input
    fn filter_keypress(&self, event: &NativeKeyEvent) -> bool;
}

/// Called with each event that should be redispatched to the platform
pub type Redispatcher = Arc<dyn Fn(&NativeKeyEvent) + Send + Sync>;

/// An event waiting for its responders to answer
#[derive(Debug)]
struct PendingResponse {
    sequence_id: u64,
    event: NativeKeyEvent,
    unreplied: usize,
    any_handled: bool,
}

/// An event handed back to the platform, expected to come back once
#[derive(Debug)]
struct PendingRedispatch {
    hash: u64,
    event: NativeKeyEvent,
}

struct ManagerState {
    pending_responses: Vec<PendingResponse>,
    pending_redispatches: Vec<PendingRedispatch>,
    last_sequence_id: u64,
    text_input: Option<Arc<dyn TextInputFilter>>,
    redispatcher: Redispatcher,
}

impl ManagerState {
    /// Take a reply for `sequence_id`. Returns the event once every
    /// responder answered and none handled it.
    fn reply(&mut self, sequence_id: u64, handled: bool) -> Option<NativeKeyEvent> {
        let Some(index) = self
            .pending_responses
            .iter()
            .position(|p| p.sequence_id == sequence_id)
        else {
            log::warn!("reply for unknown event #{}", sequence_id);
            return None;
        };

        let pending = &mut self.pending_responses[index];
        pending.unreplied = pending.unreplied.saturating_sub(1);
        pending.any_handled |= handled;
        if pending.unreplied > 0 {
            return None;
        }

        let pending = self.pending_responses.swap_remove(index);
        if pending.any_handled {
            return None;
        }
        Some(pending.event)
    }
}

/// Dispatches each native event to every responder and collects their
/// answers.
///
/// When all responders answered and none handled the event, it is offered
/// to the text input filter and otherwise handed to the redispatcher. The
/// platform is expected to deliver a redispatched event again, and that
/// second delivery is recognized and declined by [`handle_event`](Self::handle_event).
///
/// Responders may answer late. Their callbacks hold the manager state
/// weakly, so answers arriving after the manager is dropped are ignored.
pub struct KeyboardManager {
    responders: Vec<Box<dyn KeyResponder>>,
    state: Arc<Mutex<ManagerState>>,
}

impl KeyboardManager {
    /// Create a manager with no responders
    pub fn new(text_input: Option<Arc<dyn TextInputFilter>>, redispatcher: Redispatcher) -> Self {
        Self {
            responders: Vec::new(),
            state: Arc::new(Mutex::new(ManagerState {
                pending_responses: Vec::new(),
                pending_redispatches: Vec::new(),
                last_sequence_id: 1,
                text_input,
                redispatcher,
            })),
        }
    }

    /// Append a responder. Events go to responders in the order added.
    pub fn add_responder(&mut self, responder: Box<dyn KeyResponder>) {
        self.responders.push(responder);
    }

    pub fn responder_count(&self) -> usize {
        self.responders.len()
    }

    /// Dispatch a native event.
    ///
    /// Returns false if this is an event we redispatched ourselves, which
    /// the platform should now handle natively. Otherwise returns true and
    /// the answer arrives through the responders asynchronously.
    pub fn handle_event(&mut self, event: NativeKeyEvent) -> bool {
        let hash = event.identity_hash();
        let sequence_id = {
            let mut state = self.state.lock();
            if let Some(index) = state
                .pending_redispatches
                .iter()
                .position(|p| p.hash == hash)
            {
                let redispatched = state.pending_redispatches.swap_remove(index);
                log::debug!("redispatched event came back: {:?}", redispatched.event);
                return false;
            }

            state.last_sequence_id += 1;
            let sequence_id = state.last_sequence_id;
            state.pending_responses.push(PendingResponse {
                sequence_id,
                event,
                unreplied: self.responders.len(),
                any_handled: false,
            });
            sequence_id
        };

        if self.responders.is_empty() {
            Self::on_reply(&Arc::downgrade(&self.state), sequence_id, false);
            return true;
        }

        for responder in &mut self.responders {
            let weak_state = Arc::downgrade(&self.state);
            responder.handle_event(
                &event,
                Box::new(move |handled| Self::on_reply(&weak_state, sequence_id, handled)),
            );
        }
        true
    }

    fn on_reply(state: &Weak<Mutex<ManagerState>>, sequence_id: u64, handled: bool) {
        let Some(state) = state.upgrade() else {
            log::debug!("reply for event #{} after manager shutdown", sequence_id);
            return;
        };

        let (event, text_input, redispatcher) = {
            let mut state = state.lock();
            let Some(event) = state.reply(sequence_id, handled) else {
                return;
            };
            (event, state.text_input.clone(), Arc::clone(&state.redispatcher))
        };

        if let Some(text_input) = text_input {
            if text_input.filter_keypress(&event) {
                log::trace!("event #{} consumed as text input", sequence_id);
                return;
            }
        }

        state.lock().pending_redispatches.push(PendingRedispatch {
            hash: event.identity_hash(),
            event,
        });
        log::debug!("redispatching unhandled event #{}", sequence_id);
        redispatcher(&event);
    }

    /// Number of events still waiting for a responder to answer
    pub fn pending_responses(&self) -> usize {
        self.state.lock().pending_responses.len()
    }

    /// Number of redispatched events not yet delivered back
    pub fn pending_redispatches(&self) -> usize {
        self.state.lock().pending_redispatches.len()
    }

    /// True when nothing awaits an answer or a redispatch
    pub fn is_state_clear(&self) -> bool {
        let state = self.state.lock();
        state.pending_responses.is_empty() && state.pending_redispatches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ResponseCallback;

    /// Answers every event with a fixed value, or stores the callback
    struct FakeResponder {
        answer: Option<bool>,
        stored: Arc<Mutex<Vec<ResponseCallback>>>,
    }

    impl FakeResponder {
        fn answering(handled: bool) -> Box<dyn KeyResponder> {
            Box::new(Self {
                answer: Some(handled),
                stored: Arc::new(Mutex::new(Vec::new())),
            })
        }

        fn deferred(stored: &Arc<Mutex<Vec<ResponseCallback>>>) -> Box<dyn KeyResponder> {
            Box::new(Self {
                answer: None,
                stored: Arc::clone(stored),
            })
        }
    }

    impl KeyResponder for FakeResponder {
        fn handle_event(&mut self, _event: &NativeKeyEvent, callback: ResponseCallback) {
            match self.answer {
                Some(handled) => callback(handled),
                None => self.stored.lock().push(callback),
            }
        }
    }

    struct ConsumeAll;

    impl TextInputFilter for ConsumeAll {
        fn filter_keypress(&self, _event: &NativeKeyEvent) -> bool {
            true
        }
    }

    fn recording_redispatcher() -> (Redispatcher, Arc<Mutex<Vec<NativeKeyEvent>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let redispatcher: Redispatcher = Arc::new(move |event: &NativeKeyEvent| sink.lock().push(*event));
        (redispatcher, log)
    }

    #[test]
    fn test_handled_event_is_not_redispatched() {
        let (redispatcher, log) = recording_redispatcher();
        let mut manager = KeyboardManager::new(None, redispatcher);
        manager.add_responder(FakeResponder::answering(true));

        assert!(manager.handle_event(NativeKeyEvent::press(0x26, 0x61)));
        assert!(log.lock().is_empty());
        assert!(manager.is_state_clear());
    }

    #[test]
    fn test_unhandled_event_round_trip() {
        let (redispatcher, log) = recording_redispatcher();
        let mut manager = KeyboardManager::new(None, redispatcher);
        manager.add_responder(FakeResponder::answering(false));

        let event = NativeKeyEvent::press(0x26, 0x61).at(10);
        assert!(manager.handle_event(event));
        assert_eq!(log.lock().as_slice(), &[event]);
        assert_eq!(manager.pending_redispatches(), 1);
        assert!(!manager.is_state_clear());

        // The platform delivers it again
        assert!(!manager.handle_event(event));
        assert!(manager.is_state_clear());
    }

    #[test]
    fn test_any_handled_wins() {
        let (redispatcher, log) = recording_redispatcher();
        let mut manager = KeyboardManager::new(None, redispatcher);
        manager.add_responder(FakeResponder::answering(false));
        manager.add_responder(FakeResponder::answering(true));

        manager.handle_event(NativeKeyEvent::press(0x26, 0x61));
        assert!(log.lock().is_empty());
        assert!(manager.is_state_clear());
    }

    #[test]
    fn test_waits_for_every_responder() {
        let (redispatcher, log) = recording_redispatcher();
        let stored = Arc::new(Mutex::new(Vec::new()));
        let mut manager = KeyboardManager::new(None, redispatcher);
        manager.add_responder(FakeResponder::deferred(&stored));
        manager.add_responder(FakeResponder::deferred(&stored));

        manager.handle_event(NativeKeyEvent::press(0x26, 0x61));
        assert_eq!(manager.pending_responses(), 1);

        let first = stored.lock().remove(0);
        first(false);
        assert_eq!(manager.pending_responses(), 1);
        assert!(log.lock().is_empty());

        let second = stored.lock().remove(0);
        second(false);
        assert_eq!(manager.pending_responses(), 0);
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_text_input_consumes_unhandled() {
        let (redispatcher, log) = recording_redispatcher();
        let mut manager = KeyboardManager::new(Some(Arc::new(ConsumeAll)), redispatcher);
        manager.add_responder(FakeResponder::answering(false));

        manager.handle_event(NativeKeyEvent::press(0x26, 0x61));
        assert!(log.lock().is_empty());
        assert!(manager.is_state_clear());
    }

    #[test]
    fn test_no_responders_redispatches() {
        let (redispatcher, log) = recording_redispatcher();
        let mut manager = KeyboardManager::new(None, redispatcher);

        assert!(manager.handle_event(NativeKeyEvent::release(0x26, 0x61)));
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_late_reply_after_drop_is_ignored() {
        let (redispatcher, log) = recording_redispatcher();
        let stored = Arc::new(Mutex::new(Vec::new()));
        let mut manager = KeyboardManager::new(None, redispatcher);
        manager.add_responder(FakeResponder::deferred(&stored));
        manager.handle_event(NativeKeyEvent::press(0x26, 0x61));
        drop(manager);

        let callback = stored.lock().remove(0);
        callback(false);
        assert!(log.lock().is_empty());
    }
}
