//! bthid-device library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does bthid-device do? (for beginners)
//!
//! The daemon turns this Linux machine into a Bluetooth keyboard + mouse for
//! some other computer (the *host*: a laptop, tablet or TV).
//!
//! 1. Registers an SDP record with BlueZ so the host can discover a HID
//!    device and learn its report descriptor.
//! 2. Listens on the two L2CAP channels of the HID profile: *control*
//!    (PSM 0x11) and *interrupt* (PSM 0x13).
//! 3. When a host connects both channels, grabs the local keyboards and
//!    mice exclusively so their input no longer reaches this machine.
//! 4. Translates every key press, button click and mouse movement into HID
//!    input reports (via `bthid_core`) and writes them to the interrupt channel.
//! 5. When the host disconnects, releases the devices and waits for the next host.

/// Application layer: the transport session state machine and the setup/teardown around it.
pub mod application;

/// Infrastructure layer: BlueZ sockets and advertisement, evdev input devices, configuration.
pub mod infrastructure;
