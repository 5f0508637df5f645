//! Which input devices the bridge takes over.
//!
//! The choice is a pluggable [`DeviceSelector`].  The default,
//! [`NameHeuristic`], looks at the kernel device name and capabilities:
//!
//! | Kind     | Capability          | Name contains (case-insensitive) |
//! |----------|---------------------|----------------------------------|
//! | Keyboard | `EV_KEY`            | `keyboard`                       |
//! | Mouse    | `EV_REL`            | `mouse`                          |

use std::fmt;

/// What the selector gets to see about a candidate device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub has_keys: bool,
    pub has_relative: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Keyboard,
    Mouse,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Keyboard => f.write_str("keyboard"),
            DeviceKind::Mouse => f.write_str("mouse"),
        }
    }
}

/// Decides whether a device should be grabbed, and as what.
pub trait DeviceSelector: Send + Sync {
    /// Returns `None` for devices the bridge must leave alone.
    fn classify(&self, info: &DeviceInfo) -> Option<DeviceKind>;
}

/// Case-insensitive name substring match plus a capability check.
#[derive(Debug, Clone)]
pub struct NameHeuristic {
    keyboard_match: String,
    mouse_match: String,
}

impl NameHeuristic {
    pub fn new(keyboard_match: &str, mouse_match: &str) -> Self {
        Self {
            keyboard_match: keyboard_match.to_lowercase(),
            mouse_match: mouse_match.to_lowercase(),
        }
    }
}

impl Default for NameHeuristic {
    fn default() -> Self {
        Self::new("keyboard", "mouse")
    }
}

impl DeviceSelector for NameHeuristic {
    fn classify(&self, info: &DeviceInfo) -> Option<DeviceKind> {
        let name = info.name.to_lowercase();
        if info.has_keys && name.contains(&self.keyboard_match) {
            Some(DeviceKind::Keyboard)
        } else if info.has_relative && name.contains(&self.mouse_match) {
            Some(DeviceKind::Mouse)
        } else {
            None
        }
    }
}
