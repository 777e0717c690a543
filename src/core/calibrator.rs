//! Calibrator: neutral-expression baselines from the first 20 frames
//!
//! CALIBRATING → CALIBRATED once the frame counter reaches 20.
//! A recalibration request returns to CALIBRATING with everything unset.

use tracing::info;
use crate::CALIBRATION_FRAMES;
use crate::core::TrailingWindow;
use crate::types::{Baseline, CalibrationState};

#[derive(Debug, Clone)]
pub struct Calibrator {
    state: CalibrationState,
    frames: u32,
    baseline: Option<Baseline>,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calibrator {
    pub fn new() -> Self {
        Self {
            state: CalibrationState::Calibrating,
            frames: 0,
            baseline: None,
        }
    }

    /// Count one calibration frame. Returns the baseline on the frame that
    /// completes calibration; no-op once calibrated.
    pub fn advance(
        &mut self,
        eye_window: &TrailingWindow,
        lip_window: &TrailingWindow,
    ) -> Option<Baseline> {
        if self.state == CalibrationState::Calibrated {
            return None;
        }

        self.frames += 1;
        if self.frames < CALIBRATION_FRAMES {
            return None;
        }

        let baseline = Baseline {
            eye_gap: eye_window.mean().unwrap_or(1.0),
            lip_tension: lip_window.mean().unwrap_or(1.0),
        };
        self.baseline = Some(baseline);
        self.state = CalibrationState::Calibrated;
        info!(
            eye_gap = format!("{:.2}", baseline.eye_gap),
            lip_tension = format!("{:.2}", baseline.lip_tension),
            "calibration complete"
        );
        Some(baseline)
    }

    /// Back to CALIBRATING with counter 0 and baselines unset
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn is_calibrated(&self) -> bool {
        self.state == CalibrationState::Calibrated
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn baseline(&self) -> Option<Baseline> {
        self.baseline
    }
}
