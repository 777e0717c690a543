//! Session controller: state machine over calibration, sessions and results
//!
//! State transitions:
//! - IDLE_UNCALIBRATED → CALIBRATING: first face seen
//! - CALIBRATING → IDLE_MONITORING: 20 calibration frames
//! - IDLE_MONITORING → SESSION_ACTIVE: start-session
//! - SESSION_ACTIVE → RESULTS_AVAILABLE: end-session or timer expiry
//! - RESULTS_AVAILABLE → IDLE_MONITORING: reset-results
//! - any but SESSION_ACTIVE → CALIBRATING: recalibrate

use std::path::PathBuf;
use std::time::{Duration, Instant};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use crate::config::StressConfig;
use crate::core::audio::{self, AudioBackend, CaptureHandle, CaptureOutcome, SilenceBackend};
use crate::core::{fuse, FaceStressModel, SessionAggregator, VoiceStressEstimator};
use crate::types::{
    AssessmentResult, Command, ControllerSnapshot, ControllerState, FaceLandmarks, Frame,
    FrameOutput, ReasonCode,
};
use crate::CALIBRATION_FRAMES;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("{command} not allowed in state {state}")]
    InvalidTransition { command: Command, state: ControllerState },
    #[error("cannot start a session before calibration completes")]
    NotCalibrated,
}

/// Result of an accepted command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Started { session_secs: u64 },
    Ended { assessment: AssessmentResult },
    Recalibrating,
    Reset,
    Overlay { enabled: bool },
    Quit,
}

/// A running timed session
#[derive(Debug)]
struct ActiveSession {
    started_at: Instant,
    duration: Duration,
    capture: Option<CaptureHandle>,
}

/// Owns every piece of detector state; no globals
pub struct SessionController {
    config: StressConfig,
    state: ControllerState,
    model: FaceStressModel,
    aggregator: SessionAggregator,
    session: Option<ActiveSession>,
    time_remaining: Option<Duration>,
    assessment: AssessmentResult,
    voice: VoiceStressEstimator,
    audio: Box<dyn AudioBackend>,
    transcript: Option<String>,
    artifacts: Vec<PathBuf>,
    last_frame: Option<FrameOutput>,
    overlay: bool,
    quit_requested: bool,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("calibration_frames", &self.model.calibrator().frames())
            .field("session", &self.session)
            .field("assessment", &self.assessment.label)
            .finish()
    }
}

impl SessionController {
    pub fn new(
        config: StressConfig,
        voice: VoiceStressEstimator,
        audio: Box<dyn AudioBackend>,
    ) -> Self {
        Self {
            config,
            state: ControllerState::IdleUncalibrated,
            model: FaceStressModel::new(),
            aggregator: SessionAggregator::new(),
            session: None,
            time_remaining: None,
            assessment: AssessmentResult::not_assessed(),
            voice,
            audio,
            transcript: None,
            artifacts: Vec::new(),
            last_frame: None,
            overlay: true,
            quit_requested: false,
        }
    }

    /// HTTP oracle from config (if any) and paced silence for audio
    pub fn from_config(config: StressConfig) -> Self {
        let voice = VoiceStressEstimator::from_settings(&config.oracle);
        let audio = Box::new(SilenceBackend {
            sample_rate: config.audio.sample_rate,
        });
        Self::new(config, voice, audio)
    }

    // =========================================================================
    // FRAMES
    // =========================================================================

    pub fn process_frame(&mut self, frame: &Frame) -> Option<FrameOutput> {
        self.process_frame_at(frame, Instant::now())
    }

    /// Tick the session timer, then score the first face (if any)
    pub fn process_frame_at(&mut self, frame: &Frame, now: Instant) -> Option<FrameOutput> {
        self.tick_at(now);

        let Some(face) = frame.faces.first() else {
            debug!("no face detected");
            return None;
        };
        if frame.faces.len() > 1 {
            debug!(faces = frame.faces.len(), "multiple faces, scoring the first");
        }

        let output = self.process_face(face, now);
        self.last_frame = Some(output.clone());
        Some(output)
    }

    fn process_face(&mut self, face: &FaceLandmarks, now: Instant) -> FrameOutput {
        if self.state == ControllerState::ResultsAvailable {
            let sample = self.model.observe(face);
            return results_output(&self.assessment, sample);
        }

        if self.state == ControllerState::IdleUncalibrated {
            self.transition(ControllerState::Calibrating);
        }

        let mut output = self.model.process(face);

        if self.state == ControllerState::Calibrating && self.model.is_calibrated() {
            self.transition(ControllerState::IdleMonitoring);
        }

        if let Some(session) = &self.session {
            if output.is_scored() {
                self.aggregator.record_at(session.started_at, now, output.stress);
                output.reason = ReasonCode::S002_SCORED_IN_SESSION;
            }
        }
        output
    }

    /// Recompute time remaining; ends the session when it reaches zero
    pub fn tick_at(&mut self, now: Instant) -> Option<AssessmentResult> {
        let session = self.session.as_ref()?;
        let elapsed = now.saturating_duration_since(session.started_at);
        let remaining = session.duration.saturating_sub(elapsed);
        self.time_remaining = Some(remaining);

        if remaining.is_zero() {
            info!("session time elapsed");
            return self.end_session_at(now).ok();
        }
        None
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Dispatch a control-surface command
    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome, ControllerError> {
        self.apply_at(command, Instant::now())
    }

    pub fn apply_at(&mut self, command: Command, now: Instant) -> Result<CommandOutcome, ControllerError> {
        let result = match command {
            Command::StartSession => self
                .start_session_at(now)
                .map(|_| CommandOutcome::Started { session_secs: self.config.session_secs }),
            Command::EndSession => self
                .end_session_at(now)
                .map(|assessment| CommandOutcome::Ended { assessment }),
            Command::Recalibrate => self.recalibrate().map(|_| CommandOutcome::Recalibrating),
            Command::ResetResults => self.reset_results().map(|_| CommandOutcome::Reset),
            Command::ToggleOverlay => Ok(CommandOutcome::Overlay {
                enabled: self.toggle_overlay(),
            }),
            Command::Quit => {
                self.shutdown();
                Ok(CommandOutcome::Quit)
            }
        };

        if let Err(e) = &result {
            warn!(command = %command, error = %e, "command rejected");
        }
        result
    }

    pub fn start_session(&mut self) -> Result<(), ControllerError> {
        self.start_session_at(Instant::now())
    }

    /// IDLE_MONITORING → SESSION_ACTIVE
    pub fn start_session_at(&mut self, now: Instant) -> Result<(), ControllerError> {
        match self.state {
            ControllerState::IdleMonitoring => {}
            ControllerState::IdleUncalibrated | ControllerState::Calibrating => {
                return Err(ControllerError::NotCalibrated)
            }
            state => {
                return Err(ControllerError::InvalidTransition {
                    command: Command::StartSession,
                    state,
                })
            }
        }

        let duration = self.config.session_duration();
        self.aggregator.clear();

        let capture = match self.audio.open() {
            Ok(source) => match audio::start_capture(source, duration, &self.config.audio) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(error = %e, "audio capture failed to start, session continues without audio");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "audio source unavailable, session continues without audio");
                None
            }
        };

        self.session = Some(ActiveSession {
            started_at: now,
            duration,
            capture,
        });
        self.time_remaining = Some(duration);
        self.transition(ControllerState::SessionActive);
        info!(session_secs = self.config.session_secs, "stress assessment session started");
        Ok(())
    }

    pub fn end_session(&mut self) -> Result<AssessmentResult, ControllerError> {
        self.end_session_at(Instant::now())
    }

    /// SESSION_ACTIVE → RESULTS_AVAILABLE
    pub fn end_session_at(&mut self, now: Instant) -> Result<AssessmentResult, ControllerError> {
        let Some(mut session) = self.session.take() else {
            return Err(ControllerError::InvalidTransition {
                command: Command::EndSession,
                state: self.state,
            });
        };
        self.time_remaining = None;

        let outcome = match session.capture.take() {
            Some(handle) => handle.stop(self.config.audio_join_timeout()),
            None => CaptureOutcome::empty(),
        };
        if let Some(path) = &outcome.audio_ref {
            self.artifacts.push(path.clone());
        }
        // No saved audio, no speech
        let has_spoken = outcome.has_spoken && outcome.audio_ref.is_some();

        let summary = self.aggregator.finalize();
        self.aggregator.clear();
        info!(
            duration_secs = format!("{:.1}", now.saturating_duration_since(session.started_at).as_secs_f64()),
            facial_stress = format!("{:.2}", summary.facial_stress),
            frames = summary.frame_count,
            "session ended"
        );
        if let Some(report) = &summary.trend {
            info!(
                peak = report.peak.average,
                peak_second = report.peak.second,
                minimum = report.minimum.average,
                minimum_second = report.minimum.second,
                trend = report.trend.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
                "stress trend"
            );
        }

        let transcript = self
            .transcript
            .take()
            .unwrap_or_else(|| self.config.oracle.fallback_transcript.clone());
        let voice = self.voice.estimate(has_spoken, &transcript);
        let fused = fuse(summary.facial_stress, voice.stress, has_spoken);
        info!(combined = format!("{:.2}", fused.combined), label = %fused.label, "combined stress assessment");

        self.assessment = AssessmentResult {
            facial_stress: summary.facial_stress,
            voice_stress: voice.stress,
            combined_stress: fused.combined,
            label: fused.label,
            level: Some(fused.level),
            source: Some(fused.source),
            has_spoken,
            voice_reason: Some(voice.reason),
            trend: summary.trend,
            assessed_at: Some(Utc::now()),
        };
        self.transition(ControllerState::ResultsAvailable);
        Ok(self.assessment.clone())
    }

    /// RESULTS_AVAILABLE → IDLE_MONITORING
    pub fn reset_results(&mut self) -> Result<(), ControllerError> {
        if self.state != ControllerState::ResultsAvailable {
            return Err(ControllerError::InvalidTransition {
                command: Command::ResetResults,
                state: self.state,
            });
        }
        self.assessment = AssessmentResult::not_assessed();
        self.transition(ControllerState::IdleMonitoring);
        info!("assessment results reset");
        Ok(())
    }

    /// Any state but SESSION_ACTIVE → CALIBRATING
    pub fn recalibrate(&mut self) -> Result<(), ControllerError> {
        if self.state == ControllerState::SessionActive {
            return Err(ControllerError::InvalidTransition {
                command: Command::Recalibrate,
                state: self.state,
            });
        }
        self.model.recalibrate();
        self.transition(ControllerState::Calibrating);
        info!("recalibration started, hold a neutral expression");
        Ok(())
    }

    pub fn toggle_overlay(&mut self) -> bool {
        self.overlay = !self.overlay;
        self.overlay
    }

    /// Transcript for the current or next session's voice analysis
    pub fn supply_transcript(&mut self, transcript: impl Into<String>) {
        self.transcript = Some(transcript.into());
    }

    /// Stop any capture and delete temporary audio
    pub fn shutdown(&mut self) {
        self.abandon_session();
        self.cleanup_artifacts();
        self.quit_requested = true;
    }

    /// Drop an active session without assessing it, keeping its artifact
    /// for cleanup
    fn abandon_session(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if let Some(handle) = session.capture.take() {
            let outcome = handle.stop(self.config.audio_join_timeout());
            self.artifacts.extend(outcome.audio_ref);
        }
        self.aggregator.clear();
        self.time_remaining = None;
        self.state = if self.model.is_calibrated() {
            ControllerState::IdleMonitoring
        } else {
            ControllerState::Calibrating
        };
        info!("active session abandoned");
    }

    fn cleanup_artifacts(&mut self) {
        for path in self.artifacts.drain(..) {
            audio::remove_artifact(&path);
        }
    }

    fn transition(&mut self, to: ControllerState) {
        if self.state != to {
            debug!(from = %self.state, to = %to, "state transition");
            self.state = to;
        }
    }

    // =========================================================================
    // READ-ONLY STATE
    // =========================================================================

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn assessment(&self) -> &AssessmentResult {
        &self.assessment
    }

    pub fn last_frame(&self) -> Option<&FrameOutput> {
        self.last_frame.as_ref()
    }

    pub fn time_remaining(&self) -> Option<Duration> {
        self.time_remaining
    }

    pub fn model(&self) -> &FaceStressModel {
        &self.model
    }

    pub fn config(&self) -> &StressConfig {
        &self.config
    }

    pub fn overlay(&self) -> bool {
        self.overlay
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    pub fn session_frame_count(&self) -> usize {
        self.aggregator.frame_count()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.state,
            calibration_frames: self.model.calibrator().frames(),
            calibration_required: CALIBRATION_FRAMES,
            baseline: self.model.baseline(),
            time_remaining_secs: self.time_remaining.map(|d| d.as_secs_f64()),
            session_secs: self.config.session_secs,
            last_frame: self.last_frame.clone(),
            assessment: self.assessment.clone(),
            overlay: self.overlay,
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.abandon_session();
        self.cleanup_artifacts();
    }
}

/// Frame output mirroring the final assessment
fn results_output(assessment: &AssessmentResult, sample: crate::types::MeasurementSample) -> FrameOutput {
    FrameOutput {
        timestamp: Utc::now(),
        stress: assessment.combined_stress,
        label: assessment.label.clone(),
        level: assessment.level,
        reason: ReasonCode::S003_SHOWING_RESULTS,
        sample,
        components: None,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::{AudioError, AudioSource, ReplaySource};
    use crate::types::{Point, StressSource, LANDMARK_COUNT};

    /// Face with a chosen eyebrow gap and a 2:1 mouth
    fn face(eye_gap: f64) -> FaceLandmarks {
        let mut points = vec![Point::new(0.0, 0.0); LANDMARK_COUNT];
        points[21] = Point::new(100.0, 50.0);
        points[22] = Point::new(100.0 + eye_gap, 50.0);
        for (i, p) in points[48..68].iter_mut().enumerate() {
            *p = Point::new(110.0 + (i % 5) as f64, 160.0);
        }
        points[48] = Point::new(100.0, 160.0);
        points[54] = Point::new(140.0, 160.0);
        points[51] = Point::new(120.0, 150.0);
        points[57] = Point::new(120.0, 170.0);
        FaceLandmarks::new(points)
    }

    struct NoAudio;

    impl AudioBackend for NoAudio {
        fn open(&self) -> Result<Box<dyn AudioSource>, AudioError> {
            Err(AudioError::Unavailable("test".to_string()))
        }
    }

    struct LoudAudio;

    impl AudioBackend for LoudAudio {
        fn open(&self) -> Result<Box<dyn AudioSource>, AudioError> {
            Ok(Box::new(ReplaySource::from_samples(vec![4000; 4096], 16_000, false)))
        }
    }

    fn controller(audio: Box<dyn AudioBackend>) -> SessionController {
        let config = StressConfig {
            session_secs: 5,
            ..StressConfig::default()
        };
        SessionController::new(config, VoiceStressEstimator::disabled(), audio)
    }

    fn calibrated(audio: Box<dyn AudioBackend>) -> (SessionController, Instant) {
        let mut ctrl = controller(audio);
        let t0 = Instant::now();
        for _ in 0..CALIBRATION_FRAMES {
            ctrl.process_frame_at(&Frame::single(face(40.0)), t0);
        }
        (ctrl, t0)
    }

    #[test]
    fn test_initial_state() {
        let ctrl = controller(Box::new(NoAudio));
        assert_eq!(ctrl.state(), ControllerState::IdleUncalibrated);
        assert_eq!(ctrl.assessment().label, "Not assessed");
    }

    #[test]
    fn test_calibration_path() {
        let mut ctrl = controller(Box::new(NoAudio));
        let out = ctrl.process_frame(&Frame::single(face(40.0))).unwrap();
        assert_eq!(ctrl.state(), ControllerState::Calibrating);
        assert_eq!(out.label, "Calibrating...");

        for _ in 1..CALIBRATION_FRAMES {
            ctrl.process_frame(&Frame::single(face(40.0)));
        }
        assert_eq!(ctrl.state(), ControllerState::IdleMonitoring);
        let baseline = ctrl.model().baseline().unwrap();
        assert_eq!(baseline.eye_gap, 40.0);
        assert!((baseline.lip_tension - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_frame_is_not_an_error() {
        let mut ctrl = controller(Box::new(NoAudio));
        assert!(ctrl.process_frame(&Frame::empty()).is_none());
        assert_eq!(ctrl.state(), ControllerState::IdleUncalibrated);
    }

    #[test]
    fn test_start_before_calibration_rejected() {
        let mut ctrl = controller(Box::new(NoAudio));
        assert_eq!(ctrl.start_session(), Err(ControllerError::NotCalibrated));
        assert_eq!(ctrl.state(), ControllerState::IdleUncalibrated);
    }

    #[test]
    fn test_start_twice_rejected() {
        let (mut ctrl, t0) = calibrated(Box::new(NoAudio));
        ctrl.start_session_at(t0).unwrap();
        assert_eq!(
            ctrl.start_session_at(t0),
            Err(ControllerError::InvalidTransition {
                command: Command::StartSession,
                state: ControllerState::SessionActive,
            })
        );
        assert_eq!(ctrl.state(), ControllerState::SessionActive);
    }

    #[test]
    fn test_recalibrate_rejected_during_session() {
        let (mut ctrl, t0) = calibrated(Box::new(NoAudio));
        ctrl.start_session_at(t0).unwrap();
        assert!(ctrl.recalibrate().is_err());
        assert!(ctrl.model().is_calibrated());
    }

    #[test]
    fn test_session_records_and_ends_on_timer() {
        let (mut ctrl, t0) = calibrated(Box::new(NoAudio));
        ctrl.start_session_at(t0).unwrap();

        for ms in (0..5000).step_by(250) {
            let out = ctrl
                .process_frame_at(&Frame::single(face(40.0)), t0 + Duration::from_millis(ms))
                .unwrap();
            assert_eq!(out.reason, ReasonCode::S002_SCORED_IN_SESSION);
        }
        assert_eq!(ctrl.session_frame_count(), 20);
        assert_eq!(ctrl.time_remaining(), Some(Duration::from_millis(250)));

        // Timer expiry on the next tick
        let out = ctrl
            .process_frame_at(&Frame::single(face(40.0)), t0 + Duration::from_secs(5))
            .unwrap();
        assert_eq!(ctrl.state(), ControllerState::ResultsAvailable);
        assert_eq!(out.reason, ReasonCode::S003_SHOWING_RESULTS);

        let result = ctrl.assessment();
        assert!(!result.has_spoken);
        assert_eq!(result.voice_stress, 0.0);
        assert_eq!(result.combined_stress, result.facial_stress);
        assert_eq!(result.source, Some(StressSource::FacialOnly));
        assert!(result.label.contains("facial expression only"));
        // Exact-baseline face saturates at 1.0
        assert!((result.facial_stress - 1.0).abs() < 1e-9);
        assert_eq!(result.trend.as_ref().unwrap().seconds.len(), 5);
    }

    #[test]
    fn test_spoken_session_without_oracle_uses_default() {
        let (mut ctrl, t0) = calibrated(Box::new(LoudAudio));
        ctrl.start_session_at(t0).unwrap();
        ctrl.process_frame_at(&Frame::single(face(40.0)), t0 + Duration::from_millis(100));
        std::thread::sleep(Duration::from_millis(50));

        let result = ctrl.end_session_at(t0 + Duration::from_secs(1)).unwrap();
        assert!(result.has_spoken);
        assert_eq!(result.voice_stress, 0.5);
        assert_eq!(result.voice_reason, Some(ReasonCode::V001_ORACLE_FAILED));
        assert!((result.combined_stress - (result.facial_stress * 0.6 + 0.5 * 0.4)).abs() < 1e-12);
        assert_eq!(ctrl.artifacts().len(), 1);

        let artifact = ctrl.artifacts()[0].clone();
        ctrl.shutdown();
        assert!(!artifact.exists());
        assert!(ctrl.quit_requested());
    }

    #[test]
    fn test_end_without_session_rejected() {
        let (mut ctrl, _) = calibrated(Box::new(NoAudio));
        let err = ctrl.end_session().unwrap_err();
        assert_eq!(
            err,
            ControllerError::InvalidTransition {
                command: Command::EndSession,
                state: ControllerState::IdleMonitoring,
            }
        );
    }

    #[test]
    fn test_reset_only_from_results() {
        let (mut ctrl, t0) = calibrated(Box::new(NoAudio));
        assert!(ctrl.reset_results().is_err());

        ctrl.start_session_at(t0).unwrap();
        ctrl.end_session_at(t0 + Duration::from_secs(1)).unwrap();
        assert!(ctrl.assessment().is_assessed());

        ctrl.reset_results().unwrap();
        assert_eq!(ctrl.state(), ControllerState::IdleMonitoring);
        assert_eq!(ctrl.assessment(), &AssessmentResult::not_assessed());
    }

    #[test]
    fn test_empty_session_facial_zero() {
        let (mut ctrl, t0) = calibrated(Box::new(NoAudio));
        ctrl.start_session_at(t0).unwrap();
        let result = ctrl.end_session_at(t0).unwrap();
        assert_eq!(result.facial_stress, 0.0);
        assert_eq!(result.label, "Low Stress (facial expression only)");
        assert!(result.trend.is_none());
    }

    #[test]
    fn test_recalibrate_from_results() {
        let (mut ctrl, t0) = calibrated(Box::new(NoAudio));
        ctrl.start_session_at(t0).unwrap();
        ctrl.end_session_at(t0).unwrap();

        ctrl.recalibrate().unwrap();
        assert_eq!(ctrl.state(), ControllerState::Calibrating);
        assert!(ctrl.model().baseline().is_none());
        assert_eq!(ctrl.model().calibrator().frames(), 0);
    }

    #[test]
    fn test_commands_dispatch() {
        let (mut ctrl, t0) = calibrated(Box::new(NoAudio));
        assert!(matches!(
            ctrl.apply_at(Command::StartSession, t0),
            Ok(CommandOutcome::Started { session_secs: 5 })
        ));
        assert!(matches!(
            ctrl.apply_at(Command::EndSession, t0),
            Ok(CommandOutcome::Ended { .. })
        ));
        assert!(matches!(ctrl.apply(Command::ToggleOverlay), Ok(CommandOutcome::Overlay { enabled: false })));
        assert!(matches!(ctrl.apply(Command::ResetResults), Ok(CommandOutcome::Reset)));
        assert!(ctrl.apply(Command::ResetResults).is_err());
        assert!(matches!(ctrl.apply(Command::Quit), Ok(CommandOutcome::Quit)));
    }

    #[test]
    fn test_snapshot_reports_progress() {
        let mut ctrl = controller(Box::new(NoAudio));
        for _ in 0..3 {
            ctrl.process_frame(&Frame::single(face(40.0)));
        }
        let snap = ctrl.snapshot();
        assert_eq!(snap.state, ControllerState::Calibrating);
        assert_eq!(snap.calibration_frames, 3);
        assert_eq!(snap.calibration_required, CALIBRATION_FRAMES);
        assert!(snap.time_remaining_secs.is_none());
        assert!(snap.to_status_line().contains("3/20"));
    }

    #[test]
    fn test_drop_mid_session_removes_audio() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StressConfig {
            session_secs: 5,
            ..StressConfig::default()
        };
        config.audio.artifact_dir = Some(dir.path().to_path_buf());

        let mut ctrl = SessionController::new(config, VoiceStressEstimator::disabled(), Box::new(LoudAudio));
        let t0 = Instant::now();
        for _ in 0..CALIBRATION_FRAMES {
            ctrl.process_frame_at(&Frame::single(face(40.0)), t0);
        }
        ctrl.start_session_at(t0).unwrap();
        std::thread::sleep(Duration::from_millis(100));
        drop(ctrl);

        let left = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(left, 0);
    }
}
