// Keysync Output Layer
// Framework-facing events and the transport that carries them

mod event;
mod recorder;
mod sink;

pub use event::KeyEvent;
pub use recorder::RecordingSink;
pub use sink::{KeyEventSink, ResponseCallback};
