//! Key code translation tables for the input boundary.
//!
//! The canonical representation is USB HID Usage IDs (page 0x07, Keyboard/Keypad),
//! which is what the keyboard report carries.  Linux evdev codes are translated
//! to HID when an event enters the bridge.

pub mod hid;
pub mod linux_evdev;

pub use hid::HidKeyCode;

use crate::domain::state::Axis;

/// Unified key mapper for the evdev → HID direction.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates an evdev `KEY_*` code to a [`HidKeyCode`].
    ///
    /// Returns [`HidKeyCode::Unknown`] if no mapping exists for `code`.
    pub fn evdev_to_hid(code: u16) -> HidKeyCode {
        linux_evdev::evdev_to_hid(code)
    }

    /// Translates an evdev `BTN_*` code to its bit in the mouse report.
    ///
    /// Returns `None` for buttons the boot mouse report cannot carry.
    pub fn evdev_button_bit(code: u16) -> Option<u8> {
        linux_evdev::button_bit(code)
    }

    /// Translates an evdev `REL_*` code to a motion [`Axis`].
    pub fn evdev_axis(code: u16) -> Option<Axis> {
        linux_evdev::relative_axis(code)
    }
}
