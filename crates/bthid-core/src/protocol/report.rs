//! Fixed-layout HID input reports sent on the interrupt channel.
//!
//! Wire format (all single bytes, no multi-byte integers):
//! ```text
//! Mouse:    [0xA1][0x01][buttons][dx:i8][dy:i8][wheel:i8]               =  6 bytes
//! Keyboard: [0xA1][0x02][modifiers][key0][key1] … [key7]                = 11 bytes
//! ```
//!
//! The leading `0xA1` is the HIDP transaction header `DATA | INPUT`: it tags the
//! rest of the frame as an input report.  The second byte is the report ID that
//! tells the host which collection of the descriptor the bytes belong to.
//!
//! Encoding is pure: any valid state maps to a valid report, so there is no
//! error type here.

use crate::domain::state::{ButtonFlags, ModifierFlags};

/// HIDP header `DATA (0xA) | INPUT (0x1)`.
pub const HIDP_INPUT_REPORT: u8 = 0xA1;

/// Report ID of the mouse collection.
pub const REPORT_ID_MOUSE: u8 = 0x01;

/// Report ID of the keyboard collection.
pub const REPORT_ID_KEYBOARD: u8 = 0x02;

/// Number of key usage slots in the keyboard report.
pub const ROLLOVER_SLOTS: usize = 8;

/// Total size of a mouse report frame including header and report ID.
pub const MOUSE_REPORT_LEN: usize = 6;

/// Total size of a keyboard report frame including header and report ID.
pub const KEYBOARD_REPORT_LEN: usize = 3 + ROLLOVER_SLOTS;

/// Largest magnitude a single mouse report can carry on one axis.
pub const AXIS_LIMIT: i8 = 127;

/// An encoded input report, ready to be written to the interrupt channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputReport {
    Keyboard([u8; KEYBOARD_REPORT_LEN]),
    Mouse([u8; MOUSE_REPORT_LEN]),
}

impl InputReport {
    /// Returns the complete frame, header byte first.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            InputReport::Keyboard(b) => b,
            InputReport::Mouse(b) => b,
        }
    }

    /// Returns the report ID carried in the second byte.
    pub fn report_id(&self) -> u8 {
        self.as_bytes()[1]
    }
}

/// Stateless encoder for the two report layouts.
pub struct ReportEncoder;

impl ReportEncoder {
    /// Encodes a keyboard report.
    ///
    /// `keys` holds HID usage IDs in press order.  Slots past the end of `keys`
    /// are zero ("no key"); entries beyond [`ROLLOVER_SLOTS`] are not written.
    pub fn encode_keyboard(modifiers: ModifierFlags, keys: &[u8]) -> InputReport {
        let mut buf = [0u8; KEYBOARD_REPORT_LEN];
        buf[0] = HIDP_INPUT_REPORT;
        buf[1] = REPORT_ID_KEYBOARD;
        buf[2] = modifiers.0;
        for (slot, &key) in buf[3..].iter_mut().zip(keys) {
            *slot = key;
        }
        InputReport::Keyboard(buf)
    }

    /// Encodes a mouse report with the given button mask and motion deltas.
    ///
    /// Deltas are already clamped by the caller; `-128` is accepted by the type
    /// but never produced by the scheduler.
    pub fn encode_mouse(buttons: ButtonFlags, dx: i8, dy: i8, wheel: i8) -> InputReport {
        InputReport::Mouse([
            HIDP_INPUT_REPORT,
            REPORT_ID_MOUSE,
            buttons.0,
            dx as u8,
            dy as u8,
            wheel as u8,
        ])
    }
}
