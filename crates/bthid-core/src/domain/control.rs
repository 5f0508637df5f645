//! Answers to HIDP requests the host sends on the control channel.
//!
//! The host mostly configures the device right after connecting
//! (`SET_PROTOCOL`, `SET_IDLE`) and occasionally polls the current state with
//! `GET_REPORT`.  Reports are always produced in report-protocol layout; the
//! protocol mode and idle rate are only recorded and read back.

use tracing::debug;

use super::state::HidState;
use crate::protocol::hidp::{
    data_frame, ControlRequest, HandshakeResult, HidpError, ProtocolMode, ReportType,
    CONTROL_VIRTUAL_CABLE_UNPLUG,
};
use crate::protocol::report::{REPORT_ID_KEYBOARD, REPORT_ID_MOUSE};

/// What the session must do in response to a control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    /// Send these bytes back on the control channel.
    Reply(Vec<u8>),
    /// Nothing to send.
    Ignore,
    /// The host dropped the virtual cable; end the session.
    Unplug,
}

/// Per-session control channel state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    protocol: ProtocolMode,
    idle_rate: u8,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn protocol(&self) -> ProtocolMode {
        self.protocol
    }

    pub fn idle_rate(&self) -> u8 {
        self.idle_rate
    }

    /// Parses `message` and decides the answer, reading `hid` for GET_REPORT.
    pub fn handle_message(&mut self, message: &[u8], hid: &HidState) -> ControlAction {
        match ControlRequest::parse(message) {
            Ok(request) => self.handle(&request, hid),
            Err(HidpError::Empty) => ControlAction::Ignore,
            Err(e) => {
                debug!(error = %e, "malformed control message");
                ControlAction::Reply(vec![HandshakeResult::InvalidParameter.to_byte()])
            }
        }
    }

    /// Decides the answer to an already parsed request.
    pub fn handle(&mut self, request: &ControlRequest, hid: &HidState) -> ControlAction {
        let ok = || ControlAction::Reply(vec![HandshakeResult::Successful.to_byte()]);
        match request {
            ControlRequest::SetProtocol(mode) => {
                debug!(?mode, "host set protocol mode");
                self.protocol = *mode;
                ok()
            }
            ControlRequest::GetProtocol => {
                ControlAction::Reply(data_frame(&[self.protocol.as_u8()]))
            }
            ControlRequest::SetIdle(rate) => {
                self.idle_rate = *rate;
                ok()
            }
            ControlRequest::GetIdle => ControlAction::Reply(data_frame(&[self.idle_rate])),
            ControlRequest::SetReport { report_type, data } => {
                debug!(?report_type, len = data.len(), "host set report");
                ok()
            }
            ControlRequest::GetReport {
                report_type: ReportType::Input,
                report_id: Some(REPORT_ID_MOUSE),
            } => ControlAction::Reply(hid.button_report().as_bytes().to_vec()),
            ControlRequest::GetReport {
                report_type: ReportType::Input,
                report_id: Some(REPORT_ID_KEYBOARD),
            } => ControlAction::Reply(hid.keyboard_report().as_bytes().to_vec()),
            ControlRequest::GetReport { .. } => {
                ControlAction::Reply(vec![HandshakeResult::InvalidReportId.to_byte()])
            }
            ControlRequest::HidControl(CONTROL_VIRTUAL_CABLE_UNPLUG) => ControlAction::Unplug,
            ControlRequest::HidControl(_)
            | ControlRequest::Handshake(_)
            | ControlRequest::Data { .. } => ControlAction::Ignore,
            ControlRequest::Unsupported(_) => {
                ControlAction::Reply(vec![HandshakeResult::UnsupportedRequest.to_byte()])
            }
        }
    }
}
