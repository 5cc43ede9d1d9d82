// Keysync Lock Synchronizer
// Walks each lock key to the stage the event's bitmask implies

use std::collections::HashMap;

use super::stage::{self, StateLogic};
use super::SyncContext;
use crate::action::KeyEventType;
use crate::key::LogicalKey;
use crate::modifier::{CheckedKey, CheckedKeyTable};
use crate::output::KeyEvent;
use crate::state::KeyRecords;

/// Synthesize the press/release steps that bring every lock key in line
/// with `context.state`, appending them to `out`.
pub(crate) fn synchronize_lock_states(
    locks: &CheckedKeyTable,
    lock_bits: &HashMap<LogicalKey, u32>,
    records: &mut KeyRecords,
    caps_lock_logic: &mut StateLogic,
    context: &SyncContext,
    out: &mut Vec<KeyEvent>,
) {
    for (bit, checked_key) in locks.iter() {
        synchronize_lock_key(
            bit,
            checked_key,
            lock_bits,
            records,
            caps_lock_logic,
            context,
            out,
        );
    }
}

fn synchronize_lock_key(
    bit: u32,
    checked_key: &CheckedKey,
    lock_bits: &HashMap<LogicalKey, u32>,
    records: &mut KeyRecords,
    caps_lock_logic: &mut StateLogic,
    context: &SyncContext,
    out: &mut Vec<KeyEvent>,
) {
    let logical_key = checked_key.primary_logical_key;
    let recorded_physical_key = records.mapping.get(logical_key);
    // A synthesized up always follows a down that recorded the mapping, so
    // the fallback only ever serves a synthesized down.
    let physical_key = recorded_physical_key.unwrap_or(checked_key.primary_physical_key);

    let pressed_logical_key = recorded_physical_key.and_then(|p| records.pressing.get(p));
    if let Some(pressed) = pressed_logical_key {
        if pressed != logical_key {
            log::warn!(
                "lock key {} is recorded on {} which is pressed as {}",
                logical_key,
                physical_key,
                pressed
            );
            return;
        }
    }

    let stage_by_record = stage::stage_by_record(pressed_logical_key.is_some(), records.lock.is_enabled(bit));
    let enabled_by_state = context.state & bit != 0;
    let is_event_key = logical_key == context.event_logical_key;

    if is_event_key && checked_key.is_caps_lock {
        if *caps_lock_logic == StateLogic::Undecided && context.is_down {
            *caps_lock_logic = stage::infer_state_logic(stage_by_record, enabled_by_state);
            log::debug!("CapsLock state logic inferred as {}", caps_lock_logic);
        }
        if *caps_lock_logic == StateLogic::Undecided {
            log::debug!("CapsLock state logic undecided, skipping sync of {}", logical_key);
            return;
        }
    }

    let reverse_state_logic = checked_key.is_caps_lock && caps_lock_logic.is_reversed();
    let stage_by_event = if is_event_key {
        stage::stage_by_self_event(stage_by_record, context.is_down, enabled_by_state, reverse_state_logic)
    } else {
        stage::stage_by_others_event(stage_by_record, enabled_by_state)
    };

    let destination = stage::destination_stage(stage_by_record, stage_by_event);
    let Some(steps) = stage::walk(stage_by_record, destination) else {
        log::warn!(
            "lock key {} cannot walk from stage {} to {}",
            logical_key,
            stage_by_record,
            destination
        );
        return;
    };

    for current_stage in steps {
        let is_down = stage::is_press_step(current_stage);
        if is_down && recorded_physical_key.is_none() {
            records.mapping.update(logical_key, physical_key);
        }
        records.update_pressing(physical_key, logical_key, is_down, lock_bits);

        let event = KeyEvent::synthesized(
            context.timestamp,
            KeyEventType::from_press(is_down),
            physical_key,
            logical_key,
        );
        log::debug!("synthesized lock {} (stage {})", event, current_stage);
        out.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{logical, physical};
    use crate::mapping::gtk;

    const CAPS: u32 = gtk::LOCK_MASK;

    fn caps_table() -> CheckedKeyTable {
        let mut table = CheckedKeyTable::new();
        table.insert(CAPS, CheckedKey::lock(physical::CAPS_LOCK, logical::CAPS_LOCK).with_caps_lock());
        table
    }

    fn others_event(state: u32) -> SyncContext {
        SyncContext {
            state,
            timestamp: 7,
            is_down: true,
            event_logical_key: logical::KEY_A,
        }
    }

    fn run(records: &mut KeyRecords, logic: &mut StateLogic, context: SyncContext) -> Vec<KeyEvent> {
        let table = caps_table();
        let bits = table.bits_by_logical_key();
        let mut out = Vec::new();
        synchronize_lock_states(&table, &bits, records, logic, &context, &mut out);
        out
    }

    #[test]
    fn test_bystander_enables_lock() {
        let mut records = KeyRecords::new();
        let mut logic = StateLogic::Undecided;

        let out = run(&mut records, &mut logic, others_event(CAPS));

        // 0 -> 1: a single press
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].event_type, KeyEventType::Down);
        assert_eq!(out[0].physical, physical::CAPS_LOCK);
        assert!(out[0].synthesized);
        assert_eq!(out[0].timestamp, 7);
        assert!(records.lock.is_enabled(CAPS));
        assert_eq!(records.pressing.get(physical::CAPS_LOCK), Some(logical::CAPS_LOCK));
        assert_eq!(records.mapping.get(logical::CAPS_LOCK), Some(physical::CAPS_LOCK));
        // Bystanders never decide the CapsLock logic
        assert_eq!(logic, StateLogic::Undecided);
    }

    #[test]
    fn test_bystander_disables_lock() {
        let mut records = KeyRecords::new();
        let mut logic = StateLogic::Undecided;
        run(&mut records, &mut logic, others_event(CAPS));

        let out = run(&mut records, &mut logic, others_event(0));

        // 1 -> 4: release, press, release
        let types: Vec<KeyEventType> = out.iter().map(|e| e.event_type).collect();
        assert_eq!(types, vec![KeyEventType::Up, KeyEventType::Down, KeyEventType::Up]);
        assert!(!records.lock.is_enabled(CAPS));
        assert!(records.pressing.is_empty());
    }

    #[test]
    fn test_in_sync_emits_nothing() {
        let mut records = KeyRecords::new();
        let mut logic = StateLogic::Undecided;
        assert!(run(&mut records, &mut logic, others_event(0)).is_empty());
    }

    #[test]
    fn test_caps_up_before_any_down_is_skipped() {
        let mut records = KeyRecords::new();
        let mut logic = StateLogic::Undecided;
        let context = SyncContext {
            state: CAPS,
            timestamp: 0,
            is_down: false,
            event_logical_key: logical::CAPS_LOCK,
        };
        assert!(run(&mut records, &mut logic, context).is_empty());
        assert_eq!(logic, StateLogic::Undecided);
    }

    #[test]
    fn test_caps_down_decides_logic_once() {
        let mut records = KeyRecords::new();
        let mut logic = StateLogic::Undecided;
        let context = SyncContext {
            state: CAPS,
            timestamp: 0,
            is_down: true,
            event_logical_key: logical::CAPS_LOCK,
        };
        let out = run(&mut records, &mut logic, context);
        assert_eq!(logic, StateLogic::Reversed);
        assert!(out.is_empty());

        let context = SyncContext { state: 0, ..context };
        run(&mut records, &mut logic, context);
        assert_eq!(logic, StateLogic::Reversed);
    }
}
