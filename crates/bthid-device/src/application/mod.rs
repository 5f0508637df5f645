//! Application layer for the bridge daemon.
//!
//! - **`transport_session`** – The per-peer connection state machine
//!   (`Listening → ControlAccepted → Active → Closing`).  It is written
//!   against the `ChannelListener`/`HidChannel` traits and the `InputSource`
//!   trait, so tests drive it with in-memory channels and scripted devices.
//!
//! - **`bridge`** – Process-level setup and teardown around the session:
//!   advertise the HID service, bind the listeners, run sessions until
//!   shutdown, withdraw the service.

pub mod bridge;
pub mod transport_session;
