//! Fixed-cadence draining of accumulated mouse motion.
//!
//! Raw mouse events arrive far faster than the peer needs them and each one
//! would otherwise cost a report.  Instead, motion is accumulated in
//! [`HidState`] and the transport session calls [`ReportScheduler::drain`] on
//! every tick.  The returned [`MotionDrain`] yields as many clamped reports as
//! it takes to move every axis below one whole unit:
//!
//! ```text
//! accumulator X = 300.0   →  reports dx = 127, 127, 46   →  residue 0.0
//! accumulator X =   0.4   →  no report                   →  residue 0.4
//! ```
//!
//! Buttons are never emitted here; they are sent on their edges by the
//! dispatcher.  Each drained report carries the *current* button mask so a
//! held button stays held while dragging.

use std::time::Duration;

use super::state::{Axis, HidState};
use crate::protocol::report::{InputReport, ReportEncoder};

/// Default tick interval (1 ms).
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(1);

/// Tick cadence and the drain operation run on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportScheduler {
    interval: Duration,
}

impl Default for ReportScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_INTERVAL)
    }
}

impl ReportScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// The time between two ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts draining `state`'s accumulators for one tick.
    ///
    /// Each report yielded has already been subtracted from the accumulators.
    /// If the caller stops iterating early (e.g. because a send failed), the
    /// remaining motion stays in `state`.
    pub fn drain<'a>(&self, state: &'a mut HidState) -> MotionDrain<'a> {
        MotionDrain { state }
    }
}

/// Iterator over the motion reports of one tick.  See [`ReportScheduler::drain`].
#[derive(Debug)]
pub struct MotionDrain<'a> {
    state: &'a mut HidState,
}

impl Iterator for MotionDrain<'_> {
    type Item = InputReport;

    fn next(&mut self) -> Option<InputReport> {
        let dx = self.state.drain_axis(Axis::X);
        let dy = self.state.drain_axis(Axis::Y);
        let wheel = self.state.drain_axis(Axis::Wheel);
        // All-zero means every axis is sub-unit: the residue carries to the next tick.
        if dx == 0 && dy == 0 && wheel == 0 {
            return None;
        }
        self.state.commit_motion(dx, dy, wheel);
        Some(ReportEncoder::encode_mouse(self.state.buttons(), dx, dy, wheel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::ButtonFlags;

    fn dx_of(report: &InputReport) -> i8 {
        report.as_bytes()[3] as i8
    }

    #[test]
    fn test_burst_of_300_is_split_into_127_127_46() {
        // Arrange
        let scheduler = ReportScheduler::default();
        let mut state = HidState::new();
        state.accumulate_motion(Axis::X, 300.0);

        // Act
        let reports: Vec<InputReport> = scheduler.drain(&mut state).collect();

        // Assert
        let deltas: Vec<i8> = reports.iter().map(dx_of).collect();
        assert_eq!(deltas, vec![127, 127, 46]);
        assert_eq!(state.accumulator(Axis::X), 0.0);
    }

    #[test]
    fn test_sub_unit_motion_emits_nothing_and_is_retained() {
        let scheduler = ReportScheduler::default();
        let mut state = HidState::new();
        for axis in Axis::ALL {
            state.accumulate_motion(axis, 0.4);
        }

        assert_eq!(scheduler.drain(&mut state).count(), 0);
        for axis in Axis::ALL {
            assert_eq!(state.accumulator(axis), 0.4);
        }
    }

    #[test]
    fn test_negative_burst_splits_symmetrically() {
        let scheduler = ReportScheduler::default();
        let mut state = HidState::new();
        state.accumulate_motion(Axis::Y, -200.25);

        let dys: Vec<i8> = scheduler
            .drain(&mut state)
            .map(|r| r.as_bytes()[4] as i8)
            .collect();

        assert_eq!(dys, vec![-127, -73]);
        assert!((state.accumulator(Axis::Y) + 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_axes_drain_together_in_one_report() {
        // Arrange
        let scheduler = ReportScheduler::default();
        let mut state = HidState::new();
        state.accumulate_motion(Axis::X, 3.0);
        state.accumulate_motion(Axis::Y, -4.0);
        state.accumulate_motion(Axis::Wheel, 1.0);

        // Act
        let reports: Vec<InputReport> = scheduler.drain(&mut state).collect();

        // Assert
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].as_bytes(), &[0xA1, 0x01, 0x00, 3, 0xFC, 1]);
    }

    #[test]
    fn test_drained_reports_carry_held_buttons() {
        let scheduler = ReportScheduler::default();
        let mut state = HidState::new();
        state.apply_button(0, true);
        state.accumulate_motion(Axis::X, 5.0);

        let report = scheduler.drain(&mut state).next().expect("one report");
        assert_eq!(report.as_bytes()[2], ButtonFlags::LEFT);
    }

    #[test]
    fn test_stopping_early_leaves_remaining_motion() {
        let scheduler = ReportScheduler::default();
        let mut state = HidState::new();
        state.accumulate_motion(Axis::X, 300.0);

        let _first = scheduler.drain(&mut state).next();

        assert_eq!(state.accumulator(Axis::X), 173.0);
    }

    #[test]
    fn test_default_interval_is_one_millisecond() {
        assert_eq!(ReportScheduler::default().interval(), Duration::from_millis(1));
    }
}
