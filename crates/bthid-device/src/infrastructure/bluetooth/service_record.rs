//! SDP service record for the HID profile, in the XML form BlueZ accepts.
//!
//! # What is in an SDP record? (for beginners)
//!
//! Before a host opens the HID channels it asks our SDP server "what services
//! do you offer?".  The answer is a list of numbered attributes.  The ones
//! that matter for HID are:
//!
//! | Attribute | Meaning                                                   |
//! |-----------|-----------------------------------------------------------|
//! | `0x0001`  | Service class: `0x1124` (Human Interface Device)          |
//! | `0x0004`  | Control channel: L2CAP PSM + HIDP                         |
//! | `0x000d`  | Interrupt channel: L2CAP PSM + HIDP                       |
//! | `0x0100`  | Service name (and `0x0101`/`0x0102` description/provider) |
//! | `0x0206`  | The HID report descriptor, hex-encoded                    |
//!
//! BlueZ's profile registration takes the whole record as one XML document.

use std::fmt::Write as _;

use bthid_core::protocol::descriptor::descriptor_hex;

use crate::application::bridge::ServiceRecord;

/// HID service class and profile UUID (16-bit form).
pub const HID_SERVICE_CLASS: u16 = 0x1124;

/// Full 128-bit form of [`HID_SERVICE_CLASS`] on the Bluetooth base UUID.
pub const HID_SERVICE_UUID: u128 = 0x0000_1124_0000_1000_8000_0080_5f9b_34fb;

const L2CAP_UUID: u16 = 0x0100;
const HIDP_UUID: u16 = 0x0011;
const PUBLIC_BROWSE_GROUP: u16 = 0x1002;

/// Device subclass: combined keyboard and pointing device.
const HID_SUBCLASS_COMBO: u8 = 0xC0;

/// Class descriptor type of a report descriptor.
const REPORT_DESCRIPTOR_TYPE: u8 = 0x22;

/// Renders the complete BlueZ SDP record XML for `record`.
pub fn service_record_xml(record: &ServiceRecord) -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<record>\n");

    attribute(&mut xml, 0x0001, &format!("<sequence>{}</sequence>", uuid16(HID_SERVICE_CLASS)));
    attribute(
        &mut xml,
        0x0004,
        &protocol_descriptor(record.control_psm),
    );
    attribute(
        &mut xml,
        0x0005,
        &format!("<sequence>{}</sequence>", uuid16(PUBLIC_BROWSE_GROUP)),
    );
    attribute(
        &mut xml,
        0x0006,
        &format!(
            "<sequence>{}{}{}</sequence>",
            uint16(0x656e),
            uint16(0x006a),
            uint16(0x0100)
        ),
    );
    attribute(
        &mut xml,
        0x0009,
        &format!(
            "<sequence><sequence>{}{}</sequence></sequence>",
            uuid16(HID_SERVICE_CLASS),
            uint16(0x0101)
        ),
    );
    attribute(
        &mut xml,
        0x000d,
        &format!("<sequence>{}</sequence>", protocol_descriptor(record.interrupt_psm)),
    );
    attribute(&mut xml, 0x0100, &text(&record.name));
    attribute(&mut xml, 0x0101, &text(&record.description));
    attribute(&mut xml, 0x0102, &text(&record.provider));

    attribute(&mut xml, 0x0200, &uint16(0x0100)); // device release number
    attribute(&mut xml, 0x0201, &uint16(0x0111)); // HID parser version 1.11
    attribute(&mut xml, 0x0202, &uint8(HID_SUBCLASS_COMBO));
    attribute(&mut xml, 0x0203, &uint8(0x00)); // country code: not localized
    attribute(&mut xml, 0x0204, &boolean(true)); // virtual cable
    attribute(&mut xml, 0x0205, &boolean(true)); // reconnect initiate
    attribute(
        &mut xml,
        0x0206,
        &format!(
            "<sequence><sequence>{}<text encoding=\"hex\" value=\"{}\" /></sequence></sequence>",
            uint8(REPORT_DESCRIPTOR_TYPE),
            descriptor_hex()
        ),
    );
    attribute(
        &mut xml,
        0x0207,
        &format!(
            "<sequence><sequence>{}{}</sequence></sequence>",
            uint16(0x0409),
            uint16(0x0100)
        ),
    );
    attribute(&mut xml, 0x020b, &uint16(0x0100)); // profile version
    attribute(&mut xml, 0x020e, &boolean(false)); // boot device

    xml.push_str("</record>\n");
    xml
}

fn attribute(xml: &mut String, id: u16, value: &str) {
    // Writing into a String cannot fail.
    let _ = writeln!(xml, "  <attribute id=\"0x{id:04x}\">{value}</attribute>");
}

fn protocol_descriptor(psm: u16) -> String {
    format!(
        "<sequence><sequence>{}{}</sequence><sequence>{}</sequence></sequence>",
        uuid16(L2CAP_UUID),
        uint16(psm),
        uuid16(HIDP_UUID)
    )
}

fn uuid16(value: u16) -> String {
    format!("<uuid value=\"0x{value:04x}\" />")
}

fn uint8(value: u8) -> String {
    format!("<uint8 value=\"0x{value:02x}\" />")
}

fn uint16(value: u16) -> String {
    format!("<uint16 value=\"0x{value:04x}\" />")
}

fn boolean(value: bool) -> String {
    format!("<boolean value=\"{value}\" />")
}

fn text(value: &str) -> String {
    format!("<text value=\"{}\" />", xml_escape(value))
}

/// Escapes the five XML special characters.
fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
