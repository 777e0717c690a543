//! Stressline: multimodal stress estimation engine
//!
//! landmarks → metrics → calibrator/scorer → per-second buckets → fusion,
//! sequenced by the session controller.

pub mod config;
pub mod core;
pub mod types;

// =============================================================================
// WINDOWS
// =============================================================================

/// Capacity of each measurement trailing window (eye gap, lip tension)
pub const MEASUREMENT_WINDOW: usize = 30;

/// Capacity of the stress smoothing window
pub const SMOOTHING_WINDOW: usize = 20;

/// Frames collected before baselines are computed
pub const CALIBRATION_FRAMES: u32 = 20;

/// Minimum samples per measurement window before scoring
pub const MIN_SCORING_SAMPLES: usize = 5;

/// Mouth ranges shorter than this are treated as a measurement fault
pub const MIN_MOUTH_POINTS: usize = 12;

// =============================================================================
// SCORER GAINS + WEIGHTS
// =============================================================================

/// Eyebrows drawn together (factor < 1)
pub const EYE_CLOSER_GAIN: f64 = 2.5;
/// Eyebrows raised apart (factor ≥ 1)
pub const EYE_WIDER_GAIN: f64 = 2.0;
/// Lips pressed wider than baseline (factor > 1)
pub const LIP_TIGHTER_GAIN: f64 = 2.0;
/// Lips more relaxed than baseline (factor ≤ 1)
pub const LIP_RELAXED_GAIN: f64 = 1.5;

pub const EYE_WEIGHT: f64 = 0.8;
pub const LIP_WEIGHT: f64 = 0.2;

// =============================================================================
// LABEL THRESHOLDS (≥ comparisons, high to low)
// =============================================================================

pub const STRESS_HIGH_THRESHOLD: f64 = 0.40;
pub const STRESS_MEDIUM_THRESHOLD: f64 = 0.20;

/// Value shown while calibrating, collecting data, or after a scorer fault
pub const NEUTRAL_STRESS: f64 = 0.5;

// =============================================================================
// FUSION
// =============================================================================

pub const FACIAL_FUSION_WEIGHT: f64 = 0.6;
pub const VOICE_FUSION_WEIGHT: f64 = 0.4;

/// Voice stress when the oracle gives nothing usable
pub const VOICE_DEFAULT_STRESS: f64 = 0.5;

// =============================================================================
// SESSION + AUDIO DEFAULTS
// =============================================================================

pub const DEFAULT_SESSION_SECS: u64 = 60;

/// Bounded wait for the capture task after a stop request
pub const AUDIO_JOIN_TIMEOUT_MS: u64 = 2000;

pub const AUDIO_SAMPLE_RATE: u32 = 44_100;
pub const AUDIO_CHUNK_SAMPLES: usize = 1024;

/// Peak |amplitude| above which a chunk counts as speech
pub const SPEECH_AMPLITUDE_THRESHOLD: i16 = 500;

/// has_spoken requires the silent share of chunks to stay below this
pub const SILENT_CHUNK_RATIO: f64 = 0.9;

pub const ORACLE_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "0.1.0";

/// Clamp a stress scalar into [0, 1]
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
