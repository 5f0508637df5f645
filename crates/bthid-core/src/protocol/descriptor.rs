//! The HID report descriptor advertised to the peer.
//!
//! The descriptor tells the host how to parse the reports produced by
//! [`super::report::ReportEncoder`].  It declares two application collections:
//!
//! | Report ID | Collection | Fields                                                   |
//! |-----------|------------|----------------------------------------------------------|
//! | 1         | Mouse      | 3 buttons + 5 bits padding, X, Y, Wheel (i8, -127..127)  |
//! | 2         | Keyboard   | 8 modifier bits, 8 key slots (usages 0x00..0x65)         |
//!
//! The keyboard collection has no reserved byte, so the 8 key slots follow the
//! modifier byte directly.

/// Raw HID report descriptor bytes (98 bytes).
pub const REPORT_DESCRIPTOR: [u8; 98] = [
    // ── Mouse (report ID 1) ──────────────────────────────────────────────────
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x01, //   Report ID (1)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (1)
    0x29, 0x03, //     Usage Maximum (3)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x75, 0x05, //     Report Size (5)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x03, //     Input (Constant)
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    0xC0,       //   End Collection
    0xC0,       // End Collection
    // ── Keyboard (report ID 2) ───────────────────────────────────────────────
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x02, //   Report ID (2)
    0xA1, 0x00, //   Collection (Physical)
    0x05, 0x07, //     Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //     Usage Minimum (Left Control)
    0x29, 0xE7, //     Usage Maximum (Right GUI)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x08, //     Report Count (8)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x95, 0x08, //     Report Count (8)
    0x75, 0x08, //     Report Size (8)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x65, //     Logical Maximum (0x65)
    0x05, 0x07, //     Usage Page (Keyboard/Keypad)
    0x19, 0x00, //     Usage Minimum (0)
    0x29, 0x65, //     Usage Maximum (0x65)
    0x81, 0x00, //     Input (Data, Array)
    0xC0,       //   End Collection
    0xC0,       // End Collection
];

/// Returns the descriptor as an uppercase hex string, the form BlueZ expects
/// inside an SDP `<text encoding="hex">` element.
pub fn descriptor_hex() -> String {
    REPORT_DESCRIPTOR
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect()
}
