//! Local input devices.
//!
//! The evdev implementation is selected at compile time via `#[cfg(target_os = "linux")]`.

pub mod mock;
pub mod selector;

#[cfg(target_os = "linux")]
pub mod linux;
