//! Linux evdev code to USB HID translation tables.
//!
//! Reference: `linux/input-event-codes.h` and USB HID Usage Tables 1.3.
//!
//! # What is an evdev code? (for beginners)
//!
//! The Linux kernel reports every input device through `/dev/input/event*`
//! nodes.  Each event carries a *type* (`EV_KEY`, `EV_REL`, …), a *code* and a
//! *value*.  For `EV_KEY` the code names a key or button (`KEY_A = 30`,
//! `BTN_LEFT = 272`); for `EV_REL` it names a relative axis (`REL_X = 0`).
//!
//! Key codes describe *physical positions* (scan-code style), the same concept
//! as HID usages, so the translation is a plain table lookup with no layout
//! involved.
//!
//! # How this table works
//!
//! `EVDEV_TO_HID_TABLE` is a compile-time array of 128 [`HidKeyCode`] values
//! indexed by evdev key code.  Every keyboard key of a standard 105-key board
//! lives below 128; codes past the end of the table, or holes inside it, map to
//! [`HidKeyCode::Unknown`].

use super::hid::HidKeyCode;
use crate::domain::state::Axis;

/// `EV_SYN`: frame separator, carries no state.
pub const EV_SYN: u16 = 0x00;
/// `EV_KEY`: keys and buttons.
pub const EV_KEY: u16 = 0x01;
/// `EV_REL`: relative axes.
pub const EV_REL: u16 = 0x02;

pub const REL_X: u16 = 0x00;
pub const REL_Y: u16 = 0x01;
pub const REL_WHEEL: u16 = 0x08;

pub const BTN_LEFT: u16 = 0x110;
pub const BTN_RIGHT: u16 = 0x111;
pub const BTN_MIDDLE: u16 = 0x112;

/// Translates an evdev `KEY_*` code to a HID Usage ID.
///
/// Returns [`HidKeyCode::Unknown`] for codes without a keyboard mapping.  All
/// `u16` inputs are handled.
pub fn evdev_to_hid(code: u16) -> HidKeyCode {
    EVDEV_TO_HID_TABLE
        .get(code as usize)
        .copied()
        .unwrap_or(HidKeyCode::Unknown)
}

/// Returns the bit index of a mouse button in the report's button byte.
///
/// Only the three boot-protocol buttons are reported: left (bit 0), right
/// (bit 1) and middle (bit 2).
pub fn button_bit(code: u16) -> Option<u8> {
    match code {
        BTN_LEFT => Some(0),
        BTN_RIGHT => Some(1),
        BTN_MIDDLE => Some(2),
        _ => None,
    }
}

/// Maps an evdev `REL_*` code to the motion axis it feeds.
pub fn relative_axis(code: u16) -> Option<Axis> {
    match code {
        REL_X => Some(Axis::X),
        REL_Y => Some(Axis::Y),
        REL_WHEEL => Some(Axis::Wheel),
        _ => None,
    }
}

/// Complete evdev → HID mapping table indexed by `KEY_*` code (0–127).
const EVDEV_TO_HID_TABLE: [HidKeyCode; 128] = {
    use HidKeyCode::*;
    let mut t = [Unknown; 128];

    // ── Top row ──────────────────────────────────────────────────────────────
    t[1] = Escape;
    t[2] = Digit1;
    t[3] = Digit2;
    t[4] = Digit3;
    t[5] = Digit4;
    t[6] = Digit5;
    t[7] = Digit6;
    t[8] = Digit7;
    t[9] = Digit8;
    t[10] = Digit9;
    t[11] = Digit0;
    t[12] = Minus;
    t[13] = Equal;
    t[14] = Backspace;
    t[15] = Tab;

    // ── Letter rows (evdev follows the QWERTY scan order) ────────────────────
    t[16] = KeyQ;
    t[17] = KeyW;
    t[18] = KeyE;
    t[19] = KeyR;
    t[20] = KeyT;
    t[21] = KeyY;
    t[22] = KeyU;
    t[23] = KeyI;
    t[24] = KeyO;
    t[25] = KeyP;
    t[26] = BracketLeft;
    t[27] = BracketRight;
    t[28] = Enter;
    t[29] = ControlLeft;
    t[30] = KeyA;
    t[31] = KeyS;
    t[32] = KeyD;
    t[33] = KeyF;
    t[34] = KeyG;
    t[35] = KeyH;
    t[36] = KeyJ;
    t[37] = KeyK;
    t[38] = KeyL;
    t[39] = Semicolon;
    t[40] = Quote;
    t[41] = Backquote;
    t[42] = ShiftLeft;
    t[43] = Backslash;
    t[44] = KeyZ;
    t[45] = KeyX;
    t[46] = KeyC;
    t[47] = KeyV;
    t[48] = KeyB;
    t[49] = KeyN;
    t[50] = KeyM;
    t[51] = Comma;
    t[52] = Period;
    t[53] = Slash;
    t[54] = ShiftRight;
    t[55] = NumpadMultiply;
    t[56] = AltLeft;
    t[57] = Space;
    t[58] = CapsLock;

    // ── F1–F10 ───────────────────────────────────────────────────────────────
    t[59] = F1;
    t[60] = F2;
    t[61] = F3;
    t[62] = F4;
    t[63] = F5;
    t[64] = F6;
    t[65] = F7;
    t[66] = F8;
    t[67] = F9;
    t[68] = F10;

    // ── Keypad ───────────────────────────────────────────────────────────────
    t[69] = NumLock;
    t[70] = ScrollLock;
    t[71] = Numpad7;
    t[72] = Numpad8;
    t[73] = Numpad9;
    t[74] = NumpadSubtract;
    t[75] = Numpad4;
    t[76] = Numpad5;
    t[77] = Numpad6;
    t[78] = NumpadAdd;
    t[79] = Numpad1;
    t[80] = Numpad2;
    t[81] = Numpad3;
    t[82] = Numpad0;
    t[83] = NumpadDecimal;

    t[86] = IntlBackslash;  // KEY_102ND
    t[87] = F11;
    t[88] = F12;

    t[96] = NumpadEnter;
    t[97] = ControlRight;
    t[98] = NumpadDivide;
    t[99] = PrintScreen;    // KEY_SYSRQ
    t[100] = AltRight;

    // ── Navigation cluster ───────────────────────────────────────────────────
    t[102] = Home;
    t[103] = ArrowUp;
    t[104] = PageUp;
    t[105] = ArrowLeft;
    t[106] = ArrowRight;
    t[107] = End;
    t[108] = ArrowDown;
    t[109] = PageDown;
    t[110] = Insert;
    t[111] = Delete;

    t[119] = Pause;
    t[125] = MetaLeft;
    t[126] = MetaRight;
    t[127] = ContextMenu;   // KEY_COMPOSE

    t
};
