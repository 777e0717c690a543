//! Session-level results: trend report, voice estimate, fused assessment

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{ReasonCode, StressLevel};

/// Direction of stress over a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Trend::Increasing => "INCREASING",
            Trend::Decreasing => "DECREASING",
            Trend::Stable => "STABLE",
        };
        write!(f, "{}", name)
    }
}

/// Mean stress of one elapsed second
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondAverage {
    pub second: u64,
    pub average: f64,
}

/// Per-second breakdown of a session, seconds in ascending order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub seconds: Vec<SecondAverage>,
    pub peak: SecondAverage,
    pub minimum: SecondAverage,
    /// Omitted with fewer than two seconds
    pub trend: Option<Trend>,
}

impl TrendReport {
    /// ASCII bar chart, one row per second
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&"-".repeat(60));
        out.push('\n');
        for s in &self.seconds {
            let bar = "█".repeat((s.average * 50.0) as usize);
            out.push_str(&format!("Second {:2}: {:.2} |{}\n", s.second, s.average, bar));
        }
        out.push_str(&"-".repeat(60));
        out.push('\n');
        out.push_str(&format!("Peak stress: {:.2} at second {}\n", self.peak.average, self.peak.second));
        out.push_str(&format!(
            "Minimum stress: {:.2} at second {}\n",
            self.minimum.average, self.minimum.second
        ));
        if let Some(trend) = self.trend {
            out.push_str(&format!("Overall trend: {}\n", trend));
        }
        out
    }
}

/// Facial reduction of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Mean of per-second means, 0.0 when nothing was recorded
    pub facial_stress: f64,
    pub frame_count: usize,
    pub trend: Option<TrendReport>,
}

/// Output of the voice stress estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceEstimate {
    pub stress: f64,
    pub reason: ReasonCode,
}

/// Which signals went into a fused result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressSource {
    FacialAndVoice,
    FacialOnly,
}

impl StressSource {
    pub fn annotation(&self) -> &'static str {
        match self {
            StressSource::FacialAndVoice => "facial expression and voice",
            StressSource::FacialOnly => "facial expression only",
        }
    }
}

/// Fused session assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub facial_stress: f64,
    pub voice_stress: f64,
    pub combined_stress: f64,
    pub label: String,
    pub level: Option<StressLevel>,
    pub source: Option<StressSource>,
    pub has_spoken: bool,
    pub voice_reason: Option<ReasonCode>,
    pub trend: Option<TrendReport>,
    pub assessed_at: Option<DateTime<Utc>>,
}

impl Default for AssessmentResult {
    fn default() -> Self {
        Self::not_assessed()
    }
}

impl AssessmentResult {
    pub const NOT_ASSESSED: &'static str = "Not assessed";

    /// Cleared result
    pub fn not_assessed() -> Self {
        Self {
            facial_stress: 0.0,
            voice_stress: 0.0,
            combined_stress: 0.0,
            label: Self::NOT_ASSESSED.to_string(),
            level: None,
            source: None,
            has_spoken: false,
            voice_reason: None,
            trend: None,
            assessed_at: None,
        }
    }

    pub fn is_assessed(&self) -> bool {
        self.assessed_at.is_some()
    }

    /// Multi-line summary for terminal display
    pub fn to_terminal_string(&self, no_color: bool) -> String {
        let color = match (no_color, self.level) {
            (false, Some(level)) => level.color_code(),
            _ => "",
        };
        let reset = if no_color { "" } else { "\x1b[0m" };
        let mut out = format!("{}STRESS ASSESSMENT RESULTS{}\n", color, reset);
        out.push_str(&format!("  Facial stress: {:>3}%\n", (self.facial_stress * 100.0) as u32));
        if self.has_spoken {
            out.push_str(&format!("  Voice stress:  {:>3}%\n", (self.voice_stress * 100.0) as u32));
        } else {
            out.push_str("  No speech detected\n");
        }
        out.push_str(&format!(
            "  {}Result: {}% - {}{}\n",
            color,
            (self.combined_stress * 100.0) as u32,
            self.label,
            reset
        ));
        out
    }
}
