// Keysync Lock Stages
// The 4-stage press/enable cycle of lock keys
//
//               #    [0]         [1]          [2]           [3]
//     TruePressed: Released    Pressed      Released      Pressed
//     TrueEnabled: Disabled    Enabled      Enabled       Disabled
//        SelfType:         Down         Up           Down            Up
//       SelfState:          0           1             1              1
// SelfState(rvsd):          1           1             0              1
//     OthersState:    0           1            1              1

use std::ops::Range;

use strum_macros::{AsRefStr, Display};

/// Number of stages in one lock cycle
pub const NUM_STAGES: u8 = 4;

/// A stage walk longer than this many cycles is an internal inconsistency
pub const MAX_CYCLES: u8 = 2;

/// How the platform reports the CapsLock bit on CapsLock's own events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum StateLogic {
    /// No CapsLock down seen yet
    #[default]
    Undecided,
    /// Bit reads 0-1-1-1 across the four transitions
    Normal,
    /// Bit reads 1-1-0-1 across the four transitions
    Reversed,
}

impl StateLogic {
    pub fn is_reversed(self) -> bool {
        self == StateLogic::Reversed
    }
}

/// Stage implied by the records before the event
pub fn stage_by_record(is_down: bool, is_enabled: bool) -> u8 {
    const STAGE_BY_RECORD: [u8; 4] = [
        0, // up, disabled
        2, // up, enabled
        3, // down, disabled
        1, // down, enabled
    ];
    STAGE_BY_RECORD[(usize::from(is_down) << 1) + usize::from(is_enabled)]
}

/// Stage implied by an event of the lock key itself, before the event
pub fn stage_by_self_event(
    stage_by_record: u8,
    is_down_event: bool,
    is_state_on: bool,
    reverse_state_logic: bool,
) -> u8 {
    if !is_state_on {
        return if reverse_state_logic { 2 } else { 0 };
    }
    if is_down_event {
        return if reverse_state_logic { 0 } else { 2 };
    }
    stage_by_record
}

/// Stage implied by an event of some other key.
///
/// A bystander can only confirm that the mode is enabled, so stage 0 snaps to
/// 1 and any other enabled stage is kept.
pub fn stage_by_others_event(stage_by_record: u8, is_state_on: bool) -> u8 {
    if !is_state_on {
        return 0;
    }
    if stage_by_record == 0 {
        return 1;
    }
    stage_by_record
}

/// Decide the CapsLock state logic from its first down event.
///
/// Seeing the bit disagree with the records on the 0/2 pair means the
/// platform reports the bit reversed.
pub fn infer_state_logic(stage_by_record: u8, is_state_on: bool) -> StateLogic {
    let stage_by_event = stage_by_self_event(stage_by_record, true, is_state_on, false);
    match (stage_by_event, stage_by_record) {
        (0, 2) | (2, 0) => StateLogic::Reversed,
        _ => StateLogic::Normal,
    }
}

/// The event stage shifted cyclically so it is never behind the record
pub fn destination_stage(stage_by_record: u8, stage_by_event: u8) -> u8 {
    if stage_by_event >= stage_by_record {
        stage_by_event
    } else {
        stage_by_event + NUM_STAGES
    }
}

/// Stages to step through to get from `from` to `to`.
///
/// Returns `None` when the walk would go backwards or past [`MAX_CYCLES`].
pub fn walk(from: u8, to: u8) -> Option<Range<u8>> {
    if to < from || to - from > NUM_STAGES * MAX_CYCLES {
        return None;
    }
    Some(from..to)
}

/// Whether leaving `stage` is a press
pub fn is_press_step(stage: u8) -> bool {
    stage % 2 == 0
}
