//! Pure session logic: input state, event dispatch, motion scheduling and
//! control channel answers.

pub mod control;
pub mod dispatch;
pub mod scheduler;
pub mod state;

pub use control::{ControlAction, ControlState};
pub use dispatch::{InputEventDispatcher, KeyState, MotionScale, RawInputEvent};
pub use scheduler::{MotionDrain, ReportScheduler};
pub use state::{Axis, ButtonFlags, HidState, ModifierFlags};
