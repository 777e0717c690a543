//! Controller and calibration state definitions

use serde::{Deserialize, Serialize};

/// Lifecycle states of the session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControllerState {
    /// No face seen yet
    IdleUncalibrated,
    /// Collecting neutral frames for baselines
    Calibrating,
    /// Calibrated, live monitoring, no session
    IdleMonitoring,
    /// Timed session recording
    SessionActive,
    /// Session finished, assessment ready
    ResultsAvailable,
}

impl ControllerState {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            ControllerState::IdleUncalibrated => "\x1b[90m", // Gray
            ControllerState::Calibrating => "\x1b[33m",      // Yellow
            ControllerState::IdleMonitoring => "\x1b[36m",   // Cyan
            ControllerState::SessionActive => "\x1b[31m",    // Red (recording)
            ControllerState::ResultsAvailable => "\x1b[32m", // Green
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for state
    pub fn emoji(&self) -> &'static str {
        match self {
            ControllerState::IdleUncalibrated => "⏳",
            ControllerState::Calibrating => "🎯",
            ControllerState::IdleMonitoring => "👁",
            ControllerState::SessionActive => "⏺",
            ControllerState::ResultsAvailable => "📋",
        }
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ControllerState::IdleUncalibrated => "IDLE_UNCALIBRATED",
            ControllerState::Calibrating => "CALIBRATING",
            ControllerState::IdleMonitoring => "IDLE_MONITORING",
            ControllerState::SessionActive => "SESSION_ACTIVE",
            ControllerState::ResultsAvailable => "RESULTS_AVAILABLE",
        };
        write!(f, "{}", name)
    }
}

/// Calibrator states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalibrationState {
    Calibrating,
    Calibrated,
}

/// Three-tier stress classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

impl StressLevel {
    /// Classify a stress scalar (≥ comparisons, high to low)
    pub fn from_score(score: f64) -> Self {
        if score >= crate::STRESS_HIGH_THRESHOLD {
            StressLevel::High
        } else if score >= crate::STRESS_MEDIUM_THRESHOLD {
            StressLevel::Medium
        } else {
            StressLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StressLevel::Low => "Low Stress",
            StressLevel::Medium => "Medium Stress",
            StressLevel::High => "High Stress",
        }
    }

    pub fn color_code(&self) -> &'static str {
        match self {
            StressLevel::Low => "\x1b[32m",
            StressLevel::Medium => "\x1b[33m",
            StressLevel::High => "\x1b[31m",
        }
    }
}

impl std::fmt::Display for StressLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
