//! Protocol module containing the HID report wire format, the report
//! descriptor, and the HIDP control message parser.

pub mod descriptor;
pub mod hidp;
pub mod report;

pub use descriptor::REPORT_DESCRIPTOR;
pub use hidp::{ControlRequest, HandshakeResult, HidpError, ProtocolMode, ReportType};
pub use report::{InputReport, ReportEncoder};
