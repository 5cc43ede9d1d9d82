// Keysync Output Layer - Engine Transport
// The seam between the responder and whatever delivers events to the framework

use super::KeyEvent;

/// Completion slot for a forwarded event, called once with "handled"
pub type ResponseCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Delivers key events to the framework.
///
/// Sending returns immediately. When a callback is given, the sink calls it
/// exactly once, at some later point, with the framework's answer. Events
/// sent without a callback expect no answer.
pub trait KeyEventSink: Send + Sync {
    fn send_key_event(&self, event: &KeyEvent, callback: Option<ResponseCallback>);
}
