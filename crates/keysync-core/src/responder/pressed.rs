// Keysync Modifier Synchronizer
// Keeps one-sided modifier keys pressed exactly when their bit says so

use super::SyncContext;
use crate::action::KeyEventType;
use crate::modifier::{CheckedKey, CheckedKeyTable};
use crate::output::KeyEvent;
use crate::state::KeyRecords;

/// Synthesize releases of modifier keys the bitmask no longer holds, then
/// a press of the primary key for bits held with nothing recorded pressed.
///
/// The event's own key is left to the real event: its press is never
/// synthesized ahead of a real down, and its release is never synthesized
/// ahead of a real up.
pub(crate) fn synchronize_pressed_states(
    modifiers: &CheckedKeyTable,
    records: &mut KeyRecords,
    context: &SyncContext,
    out: &mut Vec<KeyEvent>,
) {
    for (bit, checked_key) in modifiers.iter() {
        synchronize_modifier(bit, checked_key, records, context, out);
    }
}

fn synchronize_modifier(
    bit: u32,
    checked_key: &CheckedKey,
    records: &mut KeyRecords,
    context: &SyncContext,
    out: &mut Vec<KeyEvent>,
) {
    let pressed_by_state = context.state & bit != 0;
    let mut pressed_by_record = false;

    for logical_key in checked_key.logical_keys() {
        let recorded_physical_key = records.mapping.get(logical_key);
        let pressed_before_event = recorded_physical_key.and_then(|p| records.pressing.get(p));
        if let Some(pressed) = pressed_before_event {
            if pressed != logical_key {
                log::warn!(
                    "modifier {} is recorded on a key pressed as {}",
                    logical_key,
                    pressed
                );
                return;
            }
        }
        let (Some(physical_key), Some(_)) = (recorded_physical_key, pressed_before_event) else {
            continue;
        };
        pressed_by_record = true;

        let released_by_event = !context.is_down && logical_key == context.event_logical_key;
        if !pressed_by_state && !released_by_event {
            records.pressing.release(physical_key);
            let event = KeyEvent::synthesized(context.timestamp, KeyEventType::Up, physical_key, logical_key);
            log::debug!("synthesized modifier {}", event);
            out.push(event);
        }
    }

    let pressed_by_event = context.is_down && checked_key.covers(context.event_logical_key);
    if pressed_by_state && !pressed_by_record && !pressed_by_event {
        let logical_key = checked_key.primary_logical_key;
        let recorded_physical_key = records.mapping.get(logical_key);
        let physical_key = recorded_physical_key.unwrap_or(checked_key.primary_physical_key);
        if recorded_physical_key.is_none() {
            records.mapping.update(logical_key, physical_key);
        }
        records.pressing.press(physical_key, logical_key);
        let event = KeyEvent::synthesized(context.timestamp, KeyEventType::Down, physical_key, logical_key);
        log::debug!("synthesized modifier {}", event);
        out.push(event);
    }
}
