//! Integration tests for the bthid-core input pipeline.
//!
//! These tests drive raw events through the public API (dispatcher, state,
//! scheduler, encoder) and check the properties the peer relies on: rollover
//! order, modifier independence and lossless motion draining.

use bthid_core::{
    Axis, HidState, InputEventDispatcher, InputReport, KeyState, MotionScale, RawInputEvent,
    ReportScheduler,
};

/// Small deterministic generator so the "for all sequences" tests are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

/// evdev codes of letter keys (KEY_Q..KEY_P, KEY_A..KEY_L, KEY_Z..KEY_M).
const LETTER_CODES: [u16; 26] = [
    16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 30, 31, 32, 33, 34, 35, 36, 37, 38, 44, 45, 46, 47,
    48, 49, 50,
];

/// evdev codes of the eight modifiers in HID bit order.
const MODIFIER_CODES: [u16; 8] = [29, 42, 56, 125, 97, 54, 100, 126];

fn press(code: u16) -> RawInputEvent {
    RawInputEvent::Key {
        code,
        state: KeyState::Pressed,
    }
}

fn release(code: u16) -> RawInputEvent {
    RawInputEvent::Key {
        code,
        state: KeyState::Released,
    }
}

fn dx(report: &InputReport) -> i32 {
    report.as_bytes()[3] as i8 as i32
}

#[test]
fn test_random_key_sequences_keep_held_keys_in_press_order() {
    let dispatcher = InputEventDispatcher::default();
    let mut rng = Lcg(7);

    for _round in 0..200 {
        // Arrange
        let mut state = HidState::new();
        let mut model: Vec<u8> = Vec::new();
        let mut held: Vec<u16> = Vec::new();

        // Act: random presses of unheld keys and releases of held keys
        for _ in 0..40 {
            let code = LETTER_CODES[rng.below(26) as usize];
            let usage = bthid_core::keymap::KeyMapper::evdev_to_hid(code).as_u8();
            if held.contains(&code) {
                held.retain(|&c| c != code);
                model.retain(|&u| u != usage);
                dispatcher.dispatch(&mut state, release(code));
            } else {
                held.push(code);
                if model.len() < 8 {
                    model.push(usage);
                }
                dispatcher.dispatch(&mut state, press(code));
            }

            // Assert
            assert!(state.pressed_keys().len() <= 8);
            assert_eq!(state.pressed_keys(), model.as_slice());
        }
    }
}

#[test]
fn test_ninth_key_while_eight_held_leaves_report_unchanged() {
    // Arrange
    let dispatcher = InputEventDispatcher::default();
    let mut state = HidState::new();
    let mut last = None;
    for &code in &LETTER_CODES[..8] {
        last = dispatcher.dispatch(&mut state, press(code));
    }
    let before = last.expect("eighth key sends a report");

    // Act
    let after = dispatcher
        .dispatch(&mut state, press(LETTER_CODES[8]))
        .expect("key edge sends a report");

    // Assert
    assert_eq!(before, after);
}

#[test]
fn test_modifier_mask_tracks_down_modifiers_independent_of_keys_and_buttons() {
    let dispatcher = InputEventDispatcher::default();
    let mut rng = Lcg(99);
    let mut state = HidState::new();
    let mut expected: u8 = 0;

    for _ in 0..500 {
        let bit = rng.below(8) as usize;
        let down = rng.below(2) == 0;
        let code = MODIFIER_CODES[bit];
        dispatcher.dispatch(&mut state, if down { press(code) } else { release(code) });
        if down {
            expected |= 1 << bit;
        } else {
            expected &= !(1 << bit);
        }

        // Unrelated traffic must not disturb the mask
        let letter = LETTER_CODES[rng.below(26) as usize];
        dispatcher.dispatch(&mut state, press(letter));
        dispatcher.dispatch(&mut state, release(letter));
        dispatcher.dispatch(&mut state, press(bthid_core::keymap::linux_evdev::BTN_LEFT));

        assert_eq!(state.modifiers().0, expected);
    }
}

#[test]
fn test_motion_draining_is_lossless_within_sub_unit_residue() {
    let scheduler = ReportScheduler::default();
    let dispatcher = InputEventDispatcher::new(MotionScale {
        pointer: 0.37,
        wheel: 1.0,
    });
    let mut rng = Lcg(2024);

    for _round in 0..50 {
        // Arrange
        let mut state = HidState::new();
        let mut total = 0.0f64;
        let mut emitted = 0i64;

        // Act: interleave bursts of motion with ticks
        for _ in 0..100 {
            let delta = rng.below(801) as i32 - 400;
            total += f64::from(delta) * 0.37;
            dispatcher.dispatch(&mut state, RawInputEvent::Relative { axis: Axis::X, delta });
            if rng.below(3) == 0 {
                emitted += scheduler.drain(&mut state).map(|r| dx(&r) as i64).sum::<i64>();
            }
        }
        emitted += scheduler.drain(&mut state).map(|r| dx(&r) as i64).sum::<i64>();

        // Assert
        let residue = state.accumulator(Axis::X);
        assert!(residue.abs() < 1.0, "residue {residue} must be sub-unit");
        assert!((emitted as f64 + residue - total).abs() < 1e-6);
    }
}

#[test]
fn test_every_drained_delta_is_within_127() {
    let scheduler = ReportScheduler::default();
    let mut state = HidState::new();
    state.accumulate_motion(Axis::X, 10_000.0);
    state.accumulate_motion(Axis::Y, -9_999.5);
    state.accumulate_motion(Axis::Wheel, 333.0);

    let reports: Vec<InputReport> = scheduler.drain(&mut state).collect();

    assert!(!reports.is_empty());
    for report in &reports {
        for &b in &report.as_bytes()[3..] {
            assert_ne!(b as i8, i8::MIN, "-128 must never be produced");
        }
    }
    assert!(!state.has_pending_motion());
}
