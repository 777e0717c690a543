//! Core types for Stressline

mod state;
mod landmarks;
mod measurement;
mod output;
mod reason;
mod assessment;
mod command;
mod snapshot;

pub use state::{ControllerState, CalibrationState, StressLevel};
pub use landmarks::{Point, FaceLandmarks, Frame, LANDMARK_COUNT, LEFT_EYEBROW, RIGHT_EYEBROW, MOUTH};
pub use measurement::{MeasurementSample, Baseline, StressComponents};
pub use output::FrameOutput;
pub use reason::ReasonCode;
pub use assessment::{
    AssessmentResult, SessionSummary, SecondAverage, StressSource, Trend, TrendReport, VoiceEstimate,
};
pub use command::Command;
pub use snapshot::ControllerSnapshot;
