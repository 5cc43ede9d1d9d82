// Keysync Output Layer - Recording Sink
// In-memory transport that keeps every event and defers or auto-answers replies

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::{KeyEvent, KeyEventSink, ResponseCallback};

/// A [`KeyEventSink`] that records events in memory.
///
/// Replies are either given right away with a fixed answer, or queued until
/// [`respond_next`](Self::respond_next) / [`respond_all`](Self::respond_all).
/// Callbacks always run with no lock held, so they may send more events.
pub struct RecordingSink {
    events: Mutex<Vec<KeyEvent>>,
    pending: Mutex<VecDeque<ResponseCallback>>,
    auto_response: Mutex<Option<bool>>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSink {
    /// Create a sink that queues replies
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            pending: Mutex::new(VecDeque::new()),
            auto_response: Mutex::new(None),
        }
    }

    /// Create a sink that answers every event immediately with `handled`
    pub fn auto_respond(handled: bool) -> Self {
        let sink = Self::new();
        sink.set_auto_response(Some(handled));
        sink
    }

    /// Change the immediate answer, `None` to queue replies instead
    pub fn set_auto_response(&self, handled: Option<bool>) {
        *self.auto_response.lock() = handled;
    }

    /// Snapshot of every event sent so far
    pub fn events(&self) -> Vec<KeyEvent> {
        self.events.lock().clone()
    }

    /// Take every event sent so far, leaving the log empty
    pub fn take_events(&self) -> Vec<KeyEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of callbacks waiting for an answer
    pub fn pending_responses(&self) -> usize {
        self.pending.lock().len()
    }

    /// Answer the oldest waiting callback. Returns false if none was waiting.
    pub fn respond_next(&self, handled: bool) -> bool {
        let callback = self.pending.lock().pop_front();
        match callback {
            Some(callback) => {
                callback(handled);
                true
            }
            None => false,
        }
    }

    /// Answer every waiting callback in order, returning how many ran
    pub fn respond_all(&self, handled: bool) -> usize {
        let callbacks: Vec<ResponseCallback> = self.pending.lock().drain(..).collect();
        let count = callbacks.len();
        for callback in callbacks {
            callback(handled);
        }
        count
    }
}

impl KeyEventSink for RecordingSink {
    fn send_key_event(&self, event: &KeyEvent, callback: Option<ResponseCallback>) {
        log::trace!("sink <- {}", event);
        self.events.lock().push(event.clone());

        let Some(callback) = callback else {
            return;
        };
        let auto_response = *self.auto_response.lock();
        match auto_response {
            Some(handled) => callback(handled),
            None => self.pending.lock().push_back(callback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_callback(counter: &Arc<AtomicUsize>, expected: bool) -> ResponseCallback {
        let counter = Arc::clone(counter);
        Box::new(move |handled| {
            assert_eq!(handled, expected);
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_records_events() {
        let sink = RecordingSink::new();
        sink.send_key_event(&KeyEvent::empty(), None);
        sink.send_key_event(&KeyEvent::empty(), None);
        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.take_events().len(), 2);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_queued_responses() {
        let sink = RecordingSink::new();
        let counter = Arc::new(AtomicUsize::new(0));
        sink.send_key_event(&KeyEvent::empty(), Some(counting_callback(&counter, true)));
        sink.send_key_event(&KeyEvent::empty(), Some(counting_callback(&counter, true)));
        assert_eq!(sink.pending_responses(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        assert!(sink.respond_next(true));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(sink.respond_all(true), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!sink.respond_next(true));
    }

    #[test]
    fn test_auto_response() {
        let sink = RecordingSink::auto_respond(false);
        let counter = Arc::new(AtomicUsize::new(0));
        sink.send_key_event(&KeyEvent::empty(), Some(counting_callback(&counter, false)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(sink.pending_responses(), 0);
    }
}
