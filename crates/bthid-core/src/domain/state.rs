//! Live HID input state for one peer session.
//!
//! [`HidState`] owns everything a report is built from:
//!
//! - the 8-bit modifier mask,
//! - the rollover buffer of pressed non-modifier keys (press order, no gaps),
//! - the 3-bit mouse button mask,
//! - three fractional motion accumulators (X, Y, wheel).
//!
//! # Why fractional accumulators? (for beginners)
//!
//! A mouse report can only carry whole numbers in -127..=127 per axis.  When
//! raw deltas are scaled by a pointer speed of, say, 0.5, a single 1-unit
//! movement becomes 0.5: too small to send, but throwing it away would make
//! slow movements disappear.  The accumulator keeps the fraction until enough
//! motion has piled up to form a whole unit.  Whole units are taken out with
//! [`HidState::drain_axis`] + [`HidState::commit_motion`]; the sub-unit
//! residue stays behind for the next tick.
//!
//! There is no internal locking.  One owner (the transport session) mutates
//! the state from both the dispatch path and the scheduler path, one at a time.

use crate::protocol::report::{InputReport, ReportEncoder, AXIS_LIMIT, ROLLOVER_SLOTS};

/// Modifier mask of the keyboard report.
///
/// Bit layout follows the HID modifier usages 0xE0..0xE7 in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierFlags(pub u8);

impl ModifierFlags {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const LEFT_SHIFT: u8 = 1 << 1;
    pub const LEFT_ALT: u8 = 1 << 2;
    pub const LEFT_META: u8 = 1 << 3;
    pub const RIGHT_CTRL: u8 = 1 << 4;
    pub const RIGHT_SHIFT: u8 = 1 << 5;
    pub const RIGHT_ALT: u8 = 1 << 6;
    pub const RIGHT_META: u8 = 1 << 7;

    /// Returns `true` if either Ctrl modifier is active.
    pub fn ctrl(&self) -> bool {
        self.0 & (Self::LEFT_CTRL | Self::RIGHT_CTRL) != 0
    }

    /// Returns `true` if either Shift modifier is active.
    pub fn shift(&self) -> bool {
        self.0 & (Self::LEFT_SHIFT | Self::RIGHT_SHIFT) != 0
    }
}

/// Button mask of the mouse report.  Only the low three bits are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonFlags(pub u8);

impl ButtonFlags {
    pub const LEFT: u8 = 1 << 0;
    pub const RIGHT: u8 = 1 << 1;
    pub const MIDDLE: u8 = 1 << 2;
}

const MAX_BUTTON_BIT: u8 = 2;

/// A motion axis of the mouse report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Wheel,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Wheel];

    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Wheel => 2,
        }
    }
}

/// The modifier/key/button state and motion accumulators of one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HidState {
    modifiers: ModifierFlags,
    keys: [u8; ROLLOVER_SLOTS],
    key_count: usize,
    buttons: ButtonFlags,
    motion: [f64; 3],
}

impl HidState {
    /// Creates an all-zero state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or clears bit `bit` (0..=7) of the modifier mask.
    pub fn apply_modifier(&mut self, bit: u8, down: bool) {
        let mask = 1u8 << (bit & 0x07);
        if down {
            self.modifiers.0 |= mask;
        } else {
            self.modifiers.0 &= !mask;
        }
    }

    /// Adds or removes a key usage in the rollover buffer.
    ///
    /// A press is ignored when the key is already held or all slots are taken.
    /// A release of a key that is not held is ignored.  Removing a key shifts
    /// the later keys down so the buffer never has gaps.
    ///
    /// Returns `true` if the buffer changed.
    pub fn apply_key(&mut self, code: u8, down: bool) -> bool {
        let position = self.pressed_keys().iter().position(|&k| k == code);
        match (down, position) {
            (true, None) if self.key_count < ROLLOVER_SLOTS => {
                self.keys[self.key_count] = code;
                self.key_count += 1;
                true
            }
            (false, Some(i)) => {
                self.keys.copy_within(i + 1..self.key_count, i);
                self.key_count -= 1;
                self.keys[self.key_count] = 0;
                true
            }
            _ => false,
        }
    }

    /// Sets or clears bit `bit` (0..=2) of the button mask.  Higher bits are
    /// padding in the mouse report and are ignored.
    pub fn apply_button(&mut self, bit: u8, down: bool) {
        if bit > MAX_BUTTON_BIT {
            return;
        }
        let mask = 1u8 << bit;
        if down {
            self.buttons.0 |= mask;
        } else {
            self.buttons.0 &= !mask;
        }
    }

    /// Adds `delta` to the accumulator of `axis`.  No clamping happens here.
    ///
    /// A sum that is not finite is discarded and the accumulator keeps its
    /// previous value; an infinite or NaN accumulator could never be drained.
    pub fn accumulate_motion(&mut self, axis: Axis, delta: f64) {
        let slot = &mut self.motion[axis.index()];
        let sum = *slot + delta;
        if sum.is_finite() {
            *slot = sum;
        }
    }

    /// Returns the integral delta the next report may carry on `axis`: the
    /// accumulator truncated toward zero and clamped to ±127.
    ///
    /// Pure: the accumulator is not modified.  Use [`commit_motion`](Self::commit_motion)
    /// once the report carrying the delta has been produced.
    pub fn drain_axis(&self, axis: Axis) -> i8 {
        let limit = f64::from(AXIS_LIMIT);
        self.motion[axis.index()].trunc().clamp(-limit, limit) as i8
    }

    /// Subtracts the deltas of an emitted report from the accumulators.
    pub fn commit_motion(&mut self, dx: i8, dy: i8, wheel: i8) {
        self.motion[0] -= f64::from(dx);
        self.motion[1] -= f64::from(dy);
        self.motion[2] -= f64::from(wheel);
    }

    /// Returns the current (possibly fractional) accumulator value of `axis`.
    pub fn accumulator(&self, axis: Axis) -> f64 {
        self.motion[axis.index()]
    }

    /// Returns `true` while any axis holds at least one whole unit of motion.
    pub fn has_pending_motion(&self) -> bool {
        self.motion.iter().any(|v| v.abs() >= 1.0)
    }

    pub fn modifiers(&self) -> ModifierFlags {
        self.modifiers
    }

    pub fn buttons(&self) -> ButtonFlags {
        self.buttons
    }

    /// Returns the held keys in press order.
    pub fn pressed_keys(&self) -> &[u8] {
        &self.keys[..self.key_count]
    }

    /// Encodes the keyboard report for the current modifier and key state.
    pub fn keyboard_report(&self) -> InputReport {
        ReportEncoder::encode_keyboard(self.modifiers, self.pressed_keys())
    }

    /// Encodes a mouse report with the current buttons and no motion.
    pub fn button_report(&self) -> InputReport {
        ReportEncoder::encode_mouse(self.buttons, 0, 0, 0)
    }

    /// Clears everything back to the all-zero state of a fresh session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_all_zero() {
        let state = HidState::new();
        assert_eq!(state.modifiers(), ModifierFlags(0));
        assert_eq!(state.buttons(), ButtonFlags(0));
        assert!(state.pressed_keys().is_empty());
        for axis in Axis::ALL {
            assert_eq!(state.accumulator(axis), 0.0);
        }
    }

    #[test]
    fn test_apply_modifier_sets_and_clears_independent_bits() {
        // Arrange
        let mut state = HidState::new();

        // Act
        state.apply_modifier(0, true);
        state.apply_modifier(5, true);
        state.apply_modifier(0, false);

        // Assert
        assert_eq!(state.modifiers().0, ModifierFlags::RIGHT_SHIFT);
        assert!(state.modifiers().shift());
        assert!(!state.modifiers().ctrl());
    }

    #[test]
    fn test_apply_key_appends_in_press_order() {
        let mut state = HidState::new();
        assert!(state.apply_key(0x04, true));
        assert!(state.apply_key(0x16, true));
        assert!(state.apply_key(0x07, true));
        assert_eq!(state.pressed_keys(), &[0x04, 0x16, 0x07]);
    }

    #[test]
    fn test_apply_key_ignores_duplicate_press() {
        let mut state = HidState::new();
        state.apply_key(0x04, true);
        assert!(!state.apply_key(0x04, true));
        assert_eq!(state.pressed_keys(), &[0x04]);
    }

    #[test]
    fn test_apply_key_release_compacts_preserving_order() {
        // Arrange
        let mut state = HidState::new();
        for k in [0x04, 0x05, 0x06, 0x07] {
            state.apply_key(k, true);
        }

        // Act
        state.apply_key(0x05, false);

        // Assert
        assert_eq!(state.pressed_keys(), &[0x04, 0x06, 0x07]);
        assert_eq!(
            state.keyboard_report().as_bytes(),
            &[0xA1, 0x02, 0x00, 0x04, 0x06, 0x07, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_ninth_key_is_silently_dropped() {
        // Arrange
        let mut state = HidState::new();
        for k in 0x04..0x0C {
            state.apply_key(k, true);
        }
        let before = state.pressed_keys().to_vec();

        // Act
        let changed = state.apply_key(0x20, true);

        // Assert
        assert!(!changed);
        assert_eq!(state.pressed_keys(), before.as_slice());
        assert_eq!(state.pressed_keys().len(), ROLLOVER_SLOTS);
    }

    #[test]
    fn test_release_of_unheld_key_is_noop() {
        let mut state = HidState::new();
        state.apply_key(0x04, true);
        assert!(!state.apply_key(0x05, false));
        assert_eq!(state.pressed_keys(), &[0x04]);
    }

    #[test]
    fn test_apply_button_sets_and_clears() {
        let mut state = HidState::new();
        state.apply_button(0, true);
        state.apply_button(2, true);
        assert_eq!(state.buttons().0, ButtonFlags::LEFT | ButtonFlags::MIDDLE);
        state.apply_button(0, false);
        assert_eq!(state.buttons().0, ButtonFlags::MIDDLE);
    }

    #[test]
    fn test_apply_button_ignores_bits_above_middle() {
        // Arrange
        let mut state = HidState::new();
        state.apply_button(1, true);

        // Act
        state.apply_button(3, true);
        state.apply_button(7, true);
        state.apply_button(9, true);

        // Assert: the upper five bits stay zero.
        assert_eq!(state.buttons().0, ButtonFlags::RIGHT);
        assert_eq!(state.buttons().0 & 0xF8, 0);
    }

    #[test]
    fn test_accumulate_motion_discards_non_finite_sums() {
        // Arrange
        let mut state = HidState::new();
        state.accumulate_motion(Axis::X, 12.0);

        // Act
        state.accumulate_motion(Axis::X, f64::MAX);
        state.accumulate_motion(Axis::X, f64::MAX);
        state.accumulate_motion(Axis::Y, f64::INFINITY);
        state.accumulate_motion(Axis::Wheel, f64::NAN);

        // Assert
        assert!(state.accumulator(Axis::X).is_finite());
        assert_eq!(state.accumulator(Axis::Y), 0.0);
        assert_eq!(state.accumulator(Axis::Wheel), 0.0);
    }

    #[test]
    fn test_drain_axis_truncates_toward_zero_and_clamps() {
        let mut state = HidState::new();
        state.accumulate_motion(Axis::X, 300.0);
        state.accumulate_motion(Axis::Y, -2.7);
        state.accumulate_motion(Axis::Wheel, 0.9);

        assert_eq!(state.drain_axis(Axis::X), 127);
        assert_eq!(state.drain_axis(Axis::Y), -2);
        assert_eq!(state.drain_axis(Axis::Wheel), 0);
        // drain_axis does not consume
        assert_eq!(state.accumulator(Axis::X), 300.0);
    }

    #[test]
    fn test_drain_axis_clamps_negative_to_minus_127() {
        let mut state = HidState::new();
        state.accumulate_motion(Axis::Y, -1000.0);
        assert_eq!(state.drain_axis(Axis::Y), -127);
    }

    #[test]
    fn test_commit_motion_keeps_residue() {
        let mut state = HidState::new();
        state.accumulate_motion(Axis::X, 2.5);
        let dx = state.drain_axis(Axis::X);
        state.commit_motion(dx, 0, 0);
        assert!((state.accumulator(Axis::X) - 0.5).abs() < f64::EPSILON);
        assert!(!state.has_pending_motion());
    }

    #[test]
    fn test_reset_clears_everything() {
        // Arrange
        let mut state = HidState::new();
        state.apply_modifier(1, true);
        state.apply_key(0x04, true);
        state.apply_button(1, true);
        state.accumulate_motion(Axis::Wheel, 3.3);

        // Act
        state.reset();

        // Assert
        assert_eq!(state, HidState::new());
    }
}
