//! # bthid-core
//!
//! Shared library for the Bluetooth HID bridge containing the key code
//! translation tables, the HID report wire format, and the input state machine
//! that turns raw keyboard/mouse events into reports.
//!
//! It has zero dependencies on OS APIs, Bluetooth stacks, or input devices.
//! The daemon in `bthid-device` feeds it platform-neutral [`RawInputEvent`]s
//! and writes the bytes it produces to the peer.
//!
//! # Architecture overview (for beginners)
//!
//! The bridge makes this machine look like a Bluetooth keyboard + mouse to a
//! remote host.  Local input devices are grabbed exclusively, every key press
//! or mouse movement is translated into a *HID input report*, and the reports
//! are streamed to the host over the Bluetooth HID interrupt channel.
//!
//! - **`keymap`** – Translation tables from Linux evdev codes to the canonical
//!   representation used on the wire: USB HID Usage IDs.
//!
//! - **`protocol`** – How bytes travel to the peer: the fixed-layout keyboard
//!   and mouse reports, the HID report descriptor, and the HIDP transaction
//!   headers seen on the control channel.
//!
//! - **`domain`** – Pure state logic: the live modifier/key/button state and
//!   motion accumulators ([`HidState`]), the dispatcher that applies raw
//!   events to it, and the scheduler that drains accumulated motion into
//!   rate-limited reports, and the answers to control channel requests.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::control::{ControlAction, ControlState};
pub use domain::dispatch::{InputEventDispatcher, KeyState, MotionScale, RawInputEvent};
pub use domain::scheduler::{MotionDrain, ReportScheduler};
pub use domain::state::{Axis, ButtonFlags, HidState, ModifierFlags};
pub use keymap::hid::HidKeyCode;
pub use protocol::report::{InputReport, ReportEncoder};
