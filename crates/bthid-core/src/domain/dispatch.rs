//! Applies raw input events to [`HidState`] and decides what to send now.
//!
//! | Event                    | State change            | Sent immediately          |
//! |--------------------------|-------------------------|---------------------------|
//! | Relative motion / wheel  | accumulator += delta    | nothing (scheduler does)  |
//! | Mouse button edge        | button mask             | mouse report, zero motion |
//! | Modifier key edge        | modifier mask           | keyboard report           |
//! | Other mapped key edge    | rollover buffer         | keyboard report           |
//! | Unmapped key / autorepeat| nothing                 | nothing                   |
//!
//! Keyboard and button edges are rare and latency-sensitive, so they bypass
//! the scheduler.  Motion is frequent, so it is batched.

use tracing::trace;

use super::state::{Axis, HidState};
use crate::keymap::linux_evdev::{EV_KEY, EV_REL};
use crate::keymap::{HidKeyCode, KeyMapper};
use crate::protocol::report::InputReport;

/// Edge carried by a key or button event (the evdev `value` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Released,
    Pressed,
    /// Kernel autorepeat.  The peer runs its own repeat, so this is not an edge.
    Repeat,
}

impl KeyState {
    /// Converts the evdev `value` of an `EV_KEY` event.
    pub fn from_evdev_value(value: i32) -> Self {
        match value {
            0 => KeyState::Released,
            1 => KeyState::Pressed,
            _ => KeyState::Repeat,
        }
    }
}

/// One input event as read from a local device.
///
/// Key codes are Linux evdev `KEY_*` / `BTN_*` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInputEvent {
    Key { code: u16, state: KeyState },
    Relative { axis: Axis, delta: i32 },
}

impl RawInputEvent {
    /// Translates one evdev `(type, code, value)` triple.
    ///
    /// Synchronisation events and relative axes other than X, Y and the
    /// vertical wheel return `None`.
    pub fn from_evdev(event_type: u16, code: u16, value: i32) -> Option<Self> {
        match event_type {
            EV_KEY => Some(RawInputEvent::Key {
                code,
                state: KeyState::from_evdev_value(value),
            }),
            EV_REL => KeyMapper::evdev_axis(code).map(|axis| RawInputEvent::Relative {
                axis,
                delta: value,
            }),
            _ => None,
        }
    }
}

/// Multipliers applied to raw relative deltas before accumulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionScale {
    pub pointer: f64,
    pub wheel: f64,
}

impl Default for MotionScale {
    fn default() -> Self {
        Self {
            pointer: 1.0,
            wheel: 1.0,
        }
    }
}

/// Routes raw events into the state tracker.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputEventDispatcher {
    scale: MotionScale,
}

impl InputEventDispatcher {
    pub fn new(scale: MotionScale) -> Self {
        Self { scale }
    }

    /// Applies `event` to `state`.
    ///
    /// Returns the report that must be sent right away, if any.
    pub fn dispatch(&self, state: &mut HidState, event: RawInputEvent) -> Option<InputReport> {
        match event {
            RawInputEvent::Relative { axis, delta } => {
                let factor = match axis {
                    Axis::X | Axis::Y => self.scale.pointer,
                    Axis::Wheel => self.scale.wheel,
                };
                state.accumulate_motion(axis, f64::from(delta) * factor);
                None
            }
            RawInputEvent::Key { state: KeyState::Repeat, .. } => None,
            RawInputEvent::Key { code, state: edge } => {
                let down = edge == KeyState::Pressed;
                if let Some(bit) = KeyMapper::evdev_button_bit(code) {
                    state.apply_button(bit, down);
                    return Some(state.button_report());
                }

                let hid = KeyMapper::evdev_to_hid(code);
                if hid == HidKeyCode::Unknown {
                    trace!(code, "ignoring key with no HID mapping");
                    return None;
                }
                match hid.modifier_bit() {
                    Some(bit) => state.apply_modifier(bit, down),
                    None => {
                        state.apply_key(hid.as_u8(), down);
                    }
                }
                Some(state.keyboard_report())
            }
        }
    }
}
