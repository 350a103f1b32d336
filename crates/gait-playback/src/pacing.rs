//! ---
//! gait_section: "07-playback"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Frame pacing policies."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::time::Duration;

use gait_common::PacingMode;

/// Decides how long to wait before each frame is drawn.
#[derive(Debug, Clone)]
pub struct Pacer {
    mode: PacingMode,
    fixed: Duration,
    started: bool,
    last_timestamp: Option<f64>,
}

impl Pacer {
    pub fn new(mode: PacingMode, fixed: Duration) -> Self {
        Self {
            mode,
            fixed,
            started: false,
            last_timestamp: None,
        }
    }

    /// Wait to apply before drawing the frame stamped `timestamp` (seconds).
    ///
    /// The first frame is drawn immediately. Timestamped pacing then waits
    /// the delta from the previously drawn frame's timestamp to this one, and
    /// falls back to the fixed interval when either is missing or time did
    /// not move forward (loop wrap, untimed sources).
    pub fn wait_before(&mut self, timestamp: Option<f64>) -> Duration {
        let previous = std::mem::replace(&mut self.last_timestamp, timestamp);
        if !std::mem::replace(&mut self.started, true) {
            return Duration::ZERO;
        }
        match (self.mode, previous, timestamp) {
            (PacingMode::Timestamped, Some(previous), Some(current))
                if current.is_finite() && previous.is_finite() && current > previous =>
            {
                Duration::from_secs_f64(current - previous)
            }
            _ => self.fixed,
        }
    }
}
