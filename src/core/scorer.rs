//! Frame stress scorer
//!
//! Owns the measurement windows, the calibrator and the smoothing window.
//! One call per frame: measure → calibrate or score → smooth.
//!
//! Eye factor < 1 (brows drawn together) raises stress; lip factor > 1
//! (mouth wider/tighter) raises stress. A face exactly at baseline scores
//! raw 1.0: both factors land in their "else" branches.

use thiserror::Error;
use tracing::{debug, warn};
use crate::{
    clamp01, EYE_CLOSER_GAIN, EYE_WEIGHT, EYE_WIDER_GAIN, LIP_RELAXED_GAIN, LIP_TIGHTER_GAIN,
    LIP_WEIGHT, MEASUREMENT_WINDOW, MIN_SCORING_SAMPLES, SMOOTHING_WINDOW,
};
use crate::core::{metrics, Calibrator, TrailingWindow};
use crate::types::{Baseline, FaceLandmarks, FrameOutput, MeasurementSample, ReasonCode, StressComponents};

pub const LABEL_CALIBRATING: &str = "Calibrating...";
pub const LABEL_COLLECTING: &str = "Collecting data...";
pub const LABEL_ERROR: &str = "Error";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("non-finite {0} while scoring")]
    NonFinite(&'static str),
}

/// Map one sample against the baseline (no smoothing)
pub fn score_components(
    sample: MeasurementSample,
    baseline: Baseline,
) -> Result<StressComponents, ScoreError> {
    let eye_factor = if baseline.eye_gap == 0.0 {
        1.0
    } else {
        sample.eye_gap / baseline.eye_gap
    };
    if !eye_factor.is_finite() {
        return Err(ScoreError::NonFinite("eye factor"));
    }
    let eye_stress = if eye_factor < 1.0 {
        clamp01((1.0 - eye_factor) * EYE_CLOSER_GAIN)
    } else {
        clamp01(1.0 - (eye_factor - 1.0) * EYE_WIDER_GAIN)
    };

    let lip_factor = if baseline.lip_tension == 0.0 {
        1.0
    } else {
        sample.lip_tension / baseline.lip_tension
    };
    if !lip_factor.is_finite() {
        return Err(ScoreError::NonFinite("lip factor"));
    }
    let lip_stress = if lip_factor > 1.0 {
        clamp01((lip_factor - 1.0) * LIP_TIGHTER_GAIN)
    } else {
        clamp01(1.0 - (1.0 - lip_factor) * LIP_RELAXED_GAIN)
    };

    let raw = eye_stress * EYE_WEIGHT + lip_stress * LIP_WEIGHT;
    if !raw.is_finite() {
        return Err(ScoreError::NonFinite("raw stress"));
    }

    Ok(StressComponents {
        eye_factor,
        eye_stress,
        lip_factor,
        lip_stress,
        raw,
    })
}

/// Per-user face model: windows + calibration + smoothing
#[derive(Debug, Clone)]
pub struct FaceStressModel {
    eye_window: TrailingWindow,
    lip_window: TrailingWindow,
    smoothing: TrailingWindow,
    calibrator: Calibrator,
}

impl Default for FaceStressModel {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceStressModel {
    pub fn new() -> Self {
        Self {
            eye_window: TrailingWindow::new(MEASUREMENT_WINDOW),
            lip_window: TrailingWindow::new(MEASUREMENT_WINDOW),
            smoothing: TrailingWindow::new(SMOOTHING_WINDOW),
            calibrator: Calibrator::new(),
        }
    }

    /// Measure a face and push its metrics, without scoring
    pub fn observe(&mut self, face: &FaceLandmarks) -> MeasurementSample {
        metrics::measure(face, &mut self.eye_window, &mut self.lip_window)
    }

    /// Measure, then calibrate or score
    pub fn process(&mut self, face: &FaceLandmarks) -> FrameOutput {
        let sample = self.observe(face);
        self.evaluate(sample)
    }

    /// Calibrate or score an already-observed sample
    pub fn evaluate(&mut self, sample: MeasurementSample) -> FrameOutput {
        if !self.calibrator.is_calibrated() {
            self.calibrator.advance(&self.eye_window, &self.lip_window);
            return FrameOutput::neutral(LABEL_CALIBRATING, ReasonCode::S001_CALIBRATING, sample);
        }

        if self.eye_window.len() < MIN_SCORING_SAMPLES || self.lip_window.len() < MIN_SCORING_SAMPLES {
            return FrameOutput::neutral(LABEL_COLLECTING, ReasonCode::S001_COLLECTING_DATA, sample);
        }

        let Some(baseline) = self.calibrator.baseline() else {
            // Calibrated always carries a baseline
            return FrameOutput::neutral(LABEL_ERROR, ReasonCode::S002_SCORER_FAULT, sample);
        };

        match score_components(sample, baseline) {
            Ok(components) => {
                self.smoothing.push(components.raw);
                let stress = clamp01(self.smoothing.mean().unwrap_or(components.raw));
                debug!(
                    eye_stress = components.eye_stress,
                    lip_stress = components.lip_stress,
                    raw = components.raw,
                    smoothed = stress,
                    "frame scored"
                );
                FrameOutput::scored(stress, sample, components, ReasonCode::S002_SCORED)
            }
            Err(e) => {
                warn!(error = %e, "stress scoring failed");
                FrameOutput::neutral(LABEL_ERROR, ReasonCode::S002_SCORER_FAULT, sample)
            }
        }
    }

    /// Drop baselines and all windows, restart calibration
    pub fn recalibrate(&mut self) {
        self.calibrator.reset();
        self.eye_window.clear();
        self.lip_window.clear();
        self.smoothing.clear();
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_calibrated()
    }

    pub fn baseline(&self) -> Option<Baseline> {
        self.calibrator.baseline()
    }

    pub fn eye_window(&self) -> &TrailingWindow {
        &self.eye_window
    }

    pub fn lip_window(&self) -> &TrailingWindow {
        &self.lip_window
    }

    pub fn smoothing_window(&self) -> &TrailingWindow {
        &self.smoothing
    }
}

// =============================================================================
// TESTS
// =============================================================================
