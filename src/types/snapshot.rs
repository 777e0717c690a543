//! Read-only view of the controller for presentation layers

use serde::{Deserialize, Serialize};
use crate::types::{AssessmentResult, Baseline, ControllerState, FrameOutput};

/// Everything a display needs, copied out of the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub state: ControllerState,
    /// Calibration progress (frames so far / required)
    pub calibration_frames: u32,
    pub calibration_required: u32,
    pub baseline: Option<Baseline>,
    /// Seconds left, only while a session is active
    pub time_remaining_secs: Option<f64>,
    pub session_secs: u64,
    pub last_frame: Option<FrameOutput>,
    pub assessment: AssessmentResult,
    /// Landmark overlay toggle
    pub overlay: bool,
}

impl ControllerSnapshot {
    /// Single status line for the terminal
    pub fn to_status_line(&self) -> String {
        match self.state {
            ControllerState::Calibrating | ControllerState::IdleUncalibrated => format!(
                "[{}] calibrating {}/{}",
                self.state, self.calibration_frames, self.calibration_required
            ),
            ControllerState::SessionActive => format!(
                "[{}] recording {}s left",
                self.state,
                self.time_remaining_secs.unwrap_or(0.0) as u64
            ),
            ControllerState::ResultsAvailable => {
                format!("[{}] {}", self.state, self.assessment.label)
            }
            ControllerState::IdleMonitoring => format!("[{}]", self.state),
        }
    }
}
