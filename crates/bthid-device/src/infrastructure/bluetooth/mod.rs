//! Bluetooth transport: L2CAP channels and HID service advertisement.
//!
//! The BlueZ-backed implementations are Linux-only; the SDP record builder and
//! the in-memory mock compile everywhere.

pub mod mock;
pub mod service_record;

#[cfg(target_os = "linux")]
pub mod advertiser;

#[cfg(target_os = "linux")]
pub mod l2cap;
