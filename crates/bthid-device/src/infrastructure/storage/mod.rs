//! Storage infrastructure: the configuration file.
//!
//! The `config` sub-module reads the TOML file from the XDG config directory
//! (or an explicit path), fills in defaults for anything missing and checks
//! the values before the daemon touches Bluetooth or input devices.

pub mod config;
