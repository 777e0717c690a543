//! Output structures for terminal display

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{MeasurementSample, ReasonCode, StressComponents, StressLevel};

/// Output for one processed face
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameOutput {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Displayed stress value (0.0-1.0)
    pub stress: f64,
    /// Display label ("High Stress", "Calibrating...", ...)
    pub label: String,
    /// Tier, only for scored frames and results
    pub level: Option<StressLevel>,
    /// Why this value
    pub reason: ReasonCode,
    /// Raw measurements for the frame
    pub sample: MeasurementSample,
    /// Scorer intermediates, only for scored frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<StressComponents>,
}

impl FrameOutput {
    /// Neutral output with a fixed label (calibrating, collecting, error)
    pub fn neutral(label: &str, reason: ReasonCode, sample: MeasurementSample) -> Self {
        Self {
            timestamp: Utc::now(),
            stress: crate::NEUTRAL_STRESS,
            label: label.to_string(),
            level: None,
            reason,
            sample,
            components: None,
        }
    }

    /// Scored output, label derived from the tier
    pub fn scored(
        stress: f64,
        sample: MeasurementSample,
        components: StressComponents,
        reason: ReasonCode,
    ) -> Self {
        let level = StressLevel::from_score(stress);
        Self {
            timestamp: Utc::now(),
            stress,
            label: level.label().to_string(),
            level: Some(level),
            reason,
            sample,
            components: Some(components),
        }
    }

    /// Is this a real estimate (not a placeholder)?
    pub fn is_scored(&self) -> bool {
        self.components.is_some()
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.level.map(|l| l.color_code()).unwrap_or("\x1b[90m");
        format!(
            "{}stress={:.2} ({:>3}%) | {} | eye={:.1} lip={:.2} | {}\x1b[0m",
            color,
            self.stress,
            (self.stress * 100.0) as u32,
            self.label,
            self.sample.eye_gap,
            self.sample.lip_tension,
            self.reason.code(),
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "stress={:.3} | label={} | eye={:.2} | lip={:.3} | reason={}",
            self.stress,
            self.label,
            self.sample.eye_gap,
            self.sample.lip_tension,
            self.reason.code()
        )
    }
}
