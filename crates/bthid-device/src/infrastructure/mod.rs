//! Infrastructure layer for the bridge daemon.
//!
//! Contains OS-facing adapters: BlueZ L2CAP sockets and service registration,
//! evdev input devices, and the TOML configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and `bthid_core`,
//! but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`bluetooth`** – L2CAP seqpacket listeners implementing `ChannelListener`,
//!   the SDP record builder, and the BlueZ profile-based `ServiceAdvertiser`.
//!   In-memory channels for tests live in `bluetooth::mock`.
//!
//! - **`input_source`** – The evdev implementation of `InputSource` that scans
//!   `/dev/input`, grabs keyboards and mice, and feeds their events into one
//!   queue.  A scripted source for tests lives in `input_source::mock`.
//!
//! - **`storage`** – TOML configuration file loading and validation.

pub mod bluetooth;
pub mod input_source;
pub mod storage;
