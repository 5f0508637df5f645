//! HIDP transaction headers exchanged on the control channel.
//!
//! Every HIDP message starts with one header byte:
//! ```text
//! bit 7..4  transaction type
//! bit 3..0  parameter (meaning depends on the type)
//! ```
//!
//! The host uses the control channel to configure the device (protocol mode,
//! idle rate) and to poll reports.  This module only *parses* what arrives;
//! deciding what to answer lives in [`crate::domain::control`].

use thiserror::Error;

// ── Transaction types (high nibble) ───────────────────────────────────────────

pub const HANDSHAKE: u8 = 0x0;
pub const HID_CONTROL: u8 = 0x1;
pub const GET_REPORT: u8 = 0x4;
pub const SET_REPORT: u8 = 0x5;
pub const GET_PROTOCOL: u8 = 0x6;
pub const SET_PROTOCOL: u8 = 0x7;
pub const GET_IDLE: u8 = 0x8;
pub const SET_IDLE: u8 = 0x9;
pub const DATA: u8 = 0xA;

/// HID_CONTROL parameter asking the device to drop the virtual cable.
pub const CONTROL_VIRTUAL_CABLE_UNPLUG: u8 = 0x5;

/// GET_REPORT parameter bit: a 2-byte buffer size follows the report ID.
const GET_REPORT_SIZE_FLAG: u8 = 0x08;

/// Result codes carried in the low nibble of a HANDSHAKE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeResult {
    Successful = 0x0,
    NotReady = 0x1,
    InvalidReportId = 0x2,
    UnsupportedRequest = 0x3,
    InvalidParameter = 0x4,
}

impl HandshakeResult {
    /// Encodes the one-byte HANDSHAKE message.
    pub fn to_byte(self) -> u8 {
        (HANDSHAKE << 4) | self as u8
    }
}

/// Report type carried in the low two bits of GET_REPORT / SET_REPORT / DATA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    Other,
    Input,
    Output,
    Feature,
}

impl ReportType {
    fn from_param(param: u8) -> Self {
        match param & 0x03 {
            1 => ReportType::Input,
            2 => ReportType::Output,
            3 => ReportType::Feature,
            _ => ReportType::Other,
        }
    }
}

/// Boot or report protocol, as set by SET_PROTOCOL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolMode {
    Boot,
    #[default]
    Report,
}

impl ProtocolMode {
    pub fn as_u8(self) -> u8 {
        match self {
            ProtocolMode::Boot => 0,
            ProtocolMode::Report => 1,
        }
    }
}

/// A parsed control channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    Handshake(u8),
    HidControl(u8),
    GetReport {
        report_type: ReportType,
        report_id: Option<u8>,
    },
    SetReport {
        report_type: ReportType,
        data: Vec<u8>,
    },
    GetProtocol,
    SetProtocol(ProtocolMode),
    GetIdle,
    SetIdle(u8),
    Data {
        report_type: ReportType,
        data: Vec<u8>,
    },
    /// A transaction type this device does not implement (deprecated or reserved).
    Unsupported(u8),
}

/// Errors that can occur while parsing a control message.
#[derive(Debug, Error, PartialEq)]
pub enum HidpError {
    /// A zero-length message was received.
    #[error("empty HIDP message")]
    Empty,

    /// The header announced a payload that is missing.
    #[error("truncated HIDP message: transaction 0x{transaction:X} needs {needed} bytes, got {available}")]
    Truncated {
        transaction: u8,
        needed: usize,
        available: usize,
    },
}

impl ControlRequest {
    /// Parses one message received on the control channel.
    ///
    /// # Errors
    ///
    /// Returns [`HidpError`] if `buf` is empty or shorter than its header requires.
    pub fn parse(buf: &[u8]) -> Result<Self, HidpError> {
        let (&header, rest) = buf.split_first().ok_or(HidpError::Empty)?;
        let transaction = header >> 4;
        let param = header & 0x0F;

        let request = match transaction {
            HANDSHAKE => ControlRequest::Handshake(param),
            HID_CONTROL => ControlRequest::HidControl(param),
            GET_REPORT => {
                // Our descriptor uses report IDs, so the host names one; tolerate
                // hosts that omit it and let the caller answer with an error.
                let report_id = rest.first().copied();
                if param & GET_REPORT_SIZE_FLAG != 0 && rest.len() < 3 {
                    return Err(HidpError::Truncated {
                        transaction,
                        needed: 4,
                        available: buf.len(),
                    });
                }
                ControlRequest::GetReport {
                    report_type: ReportType::from_param(param),
                    report_id,
                }
            }
            SET_REPORT => ControlRequest::SetReport {
                report_type: ReportType::from_param(param),
                data: rest.to_vec(),
            },
            GET_PROTOCOL => ControlRequest::GetProtocol,
            SET_PROTOCOL => ControlRequest::SetProtocol(if param & 0x01 == 0 {
                ProtocolMode::Boot
            } else {
                ProtocolMode::Report
            }),
            GET_IDLE => ControlRequest::GetIdle,
            SET_IDLE => {
                let &rate = rest.first().ok_or(HidpError::Truncated {
                    transaction,
                    needed: 2,
                    available: buf.len(),
                })?;
                ControlRequest::SetIdle(rate)
            }
            DATA => ControlRequest::Data {
                report_type: ReportType::from_param(param),
                data: rest.to_vec(),
            },
            other => ControlRequest::Unsupported(other),
        };
        Ok(request)
    }
}

/// Encodes a DATA message carrying `payload` with report type "other".
pub fn data_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(1 + payload.len());
    frame.push(DATA << 4);
    frame.extend_from_slice(payload);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_message_is_error() {
        assert_eq!(ControlRequest::parse(&[]), Err(HidpError::Empty));
    }

    #[test]
    fn test_parse_set_protocol_report_mode() {
        assert_eq!(
            ControlRequest::parse(&[0x71]),
            Ok(ControlRequest::SetProtocol(ProtocolMode::Report))
        );
        assert_eq!(
            ControlRequest::parse(&[0x70]),
            Ok(ControlRequest::SetProtocol(ProtocolMode::Boot))
        );
    }

    #[test]
    fn test_parse_get_report_input_with_id() {
        // Arrange: GET_REPORT | INPUT, report ID 2
        let msg = [0x41, 0x02];

        // Act
        let parsed = ControlRequest::parse(&msg);

        // Assert
        assert_eq!(
            parsed,
            Ok(ControlRequest::GetReport {
                report_type: ReportType::Input,
                report_id: Some(2),
            })
        );
    }

    #[test]
    fn test_parse_get_report_with_size_flag_requires_buffer_size() {
        let parsed = ControlRequest::parse(&[0x49, 0x01]);
        assert!(matches!(parsed, Err(HidpError::Truncated { needed: 4, .. })));

        let parsed = ControlRequest::parse(&[0x49, 0x01, 0x06, 0x00]);
        assert!(matches!(
            parsed,
            Ok(ControlRequest::GetReport { report_id: Some(1), .. })
        ));
    }

    #[test]
    fn test_parse_set_idle_requires_rate_byte() {
        assert!(matches!(
            ControlRequest::parse(&[0x90]),
            Err(HidpError::Truncated { transaction: SET_IDLE, .. })
        ));
        assert_eq!(ControlRequest::parse(&[0x90, 0x00]), Ok(ControlRequest::SetIdle(0)));
    }

    #[test]
    fn test_parse_virtual_cable_unplug() {
        assert_eq!(
            ControlRequest::parse(&[0x15]),
            Ok(ControlRequest::HidControl(CONTROL_VIRTUAL_CABLE_UNPLUG))
        );
    }

    #[test]
    fn test_parse_output_report_on_data() {
        // Keyboard LED output report: DATA | OUTPUT, id 2, caps lock on
        assert_eq!(
            ControlRequest::parse(&[0xA2, 0x02, 0x02]),
            Ok(ControlRequest::Data {
                report_type: ReportType::Output,
                data: vec![0x02, 0x02],
            })
        );
    }

    #[test]
    fn test_parse_reserved_type_is_unsupported() {
        assert_eq!(ControlRequest::parse(&[0x20]), Ok(ControlRequest::Unsupported(0x2)));
        assert_eq!(ControlRequest::parse(&[0xD0]), Ok(ControlRequest::Unsupported(0xD)));
    }

    #[test]
    fn test_handshake_bytes() {
        assert_eq!(HandshakeResult::Successful.to_byte(), 0x00);
        assert_eq!(HandshakeResult::InvalidReportId.to_byte(), 0x02);
        assert_eq!(HandshakeResult::UnsupportedRequest.to_byte(), 0x03);
    }

    #[test]
    fn test_data_frame_prefixes_header() {
        assert_eq!(data_frame(&[0x01]), vec![0xA0, 0x01]);
    }
}
