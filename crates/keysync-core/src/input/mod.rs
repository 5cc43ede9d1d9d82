// Keysync Input Layer
// Native events as they arrive from the platform

mod event;

pub use event::{NativeKeyEvent, KEY_PRESS_TYPE, KEY_RELEASE_TYPE};
