//! Reason codes for frame scores and voice estimates

use serde::{Deserialize, Serialize};

/// Why a frame or voice value came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // S001: Calibration
    // =========================================================================
    /// Neutral frames still being collected
    S001_CALIBRATING,
    /// Calibrated, windows below the scoring minimum
    S001_COLLECTING_DATA,

    // =========================================================================
    // S002: Scoring
    // =========================================================================
    /// Smoothed stress computed from baselines
    S002_SCORED,
    /// Scored and recorded into the active session
    S002_SCORED_IN_SESSION,
    /// Non-finite intermediate, neutral value returned
    S002_SCORER_FAULT,

    // =========================================================================
    // S003: Display
    // =========================================================================
    /// Frame output mirrors the final assessment
    S003_SHOWING_RESULTS,

    // =========================================================================
    // V001: Voice
    // =========================================================================
    /// No speech detected, oracle not consulted
    V001_NO_SPEECH,
    /// stress_score read from the JSON object
    V001_ORACLE_JSON,
    /// Score pulled from free text
    V001_ORACLE_TEXT_FALLBACK,
    /// Nothing usable in the response
    V001_ORACLE_UNPARSEABLE,
    /// Transport, timeout or status failure
    V001_ORACLE_FAILED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::S001_CALIBRATING => "S001_CALIBRATING",
            Self::S001_COLLECTING_DATA => "S001_COLLECTING_DATA",
            Self::S002_SCORED => "S002_SCORED",
            Self::S002_SCORED_IN_SESSION => "S002_SCORED_IN_SESSION",
            Self::S002_SCORER_FAULT => "S002_SCORER_FAULT",
            Self::S003_SHOWING_RESULTS => "S003_SHOWING_RESULTS",
            Self::V001_NO_SPEECH => "V001_NO_SPEECH",
            Self::V001_ORACLE_JSON => "V001_ORACLE_JSON",
            Self::V001_ORACLE_TEXT_FALLBACK => "V001_ORACLE_TEXT_FALLBACK",
            Self::V001_ORACLE_UNPARSEABLE => "V001_ORACLE_UNPARSEABLE",
            Self::V001_ORACLE_FAILED => "V001_ORACLE_FAILED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::S001_CALIBRATING => "Calibrating, hold a neutral expression",
            Self::S001_COLLECTING_DATA => "Collecting data",
            Self::S002_SCORED => "Live stress estimate",
            Self::S002_SCORED_IN_SESSION => "Live stress estimate (recorded)",
            Self::S002_SCORER_FAULT => "Scoring error",
            Self::S003_SHOWING_RESULTS => "Showing session results",
            Self::V001_NO_SPEECH => "No speech detected",
            Self::V001_ORACLE_JSON => "Oracle score parsed",
            Self::V001_ORACLE_TEXT_FALLBACK => "Oracle score extracted from text",
            Self::V001_ORACLE_UNPARSEABLE => "Oracle reply unusable, default applied",
            Self::V001_ORACLE_FAILED => "Oracle call failed, default applied",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
