//! Core modules for Stressline

pub mod window;
pub mod metrics;
pub mod calibrator;
pub mod scorer;
pub mod aggregator;
pub mod voice;
pub mod fusion;
pub mod audio;
pub mod controller;
pub mod api;

pub use window::TrailingWindow;
pub use calibrator::Calibrator;
pub use scorer::{score_components, FaceStressModel, ScoreError};
pub use aggregator::{classify_trend, trend_report, SessionAggregator};
pub use voice::{HttpOracle, OracleError, SpeechStressOracle, VoiceStressEstimator};
pub use fusion::{fuse, FusionResult};
pub use audio::{
    start_capture, AudioBackend, AudioError, AudioSource, CaptureHandle, CaptureOutcome,
    SilenceBackend, SpeechGate, WavReplayBackend,
};
pub use controller::{CommandOutcome, ControllerError, SessionController};
pub use api::{create_router, run_server};
