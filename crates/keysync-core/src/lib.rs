// Keysync Core Library
// Native key events to a framework key event stream, with modifier and lock sync

pub mod action;
pub mod input;
pub mod key;
pub mod manager;
pub mod mapping;
pub mod modifier;
pub mod output;
pub mod responder;
pub mod state;
pub mod trace;

#[cfg(feature = "config")]
pub mod config;

pub use action::KeyEventType;
pub use input::NativeKeyEvent;
pub use key::{LogicalKey, PhysicalKey};
pub use manager::{KeyboardManager, Redispatcher, TextInputFilter};
pub use mapping::{KeyMapping, Platform};
pub use modifier::{CheckedKey, CheckedKeyTable};
pub use output::{KeyEvent, KeyEventSink, RecordingSink, ResponseCallback};
pub use responder::{EmbedderResponder, KeyResponder, ResponderConfig, StateLogic};
pub use state::{KeyRecords, LockRecord, MappingRecord, PressingRecord};
pub use trace::{parse_trace, parse_trace_path, TraceError};

#[cfg(feature = "config")]
pub use config::{Config, ConfigError};
