//! Per-frame measurements and calibration baselines

use serde::{Deserialize, Serialize};

/// Scalars extracted from one face in one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementSample {
    /// Distance between the inner eyebrow ends
    pub eye_gap: f64,
    /// Mouth width / height
    pub lip_tension: f64,
}

impl MeasurementSample {
    pub fn new(eye_gap: f64, lip_tension: f64) -> Self {
        Self { eye_gap, lip_tension }
    }
}

/// Neutral-expression reference values. Both are set together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub eye_gap: f64,
    pub lip_tension: f64,
}

/// Intermediate scorer values for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressComponents {
    pub eye_factor: f64,
    pub eye_stress: f64,
    pub lip_factor: f64,
    pub lip_stress: f64,
    /// Weighted, unsmoothed stress
    pub raw: f64,
}
