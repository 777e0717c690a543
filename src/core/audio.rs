//! Audio capture task
//!
//! One background thread per session. It reads chunks from an `AudioSource`
//! until cancelled, the source ends, or the max duration passes, then writes
//! a temporary WAV and sends a single `CaptureOutcome` back over a channel.
//! `CaptureHandle::stop` waits for that outcome with a bounded timeout.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SendError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use crate::config::AudioSettings;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
    #[error("audio source unavailable: {0}")]
    Unavailable(String),
}

/// Blocking sample stream (mono, i16)
pub trait AudioSource: Send {
    /// Fill `buf` with the next chunk. Ok(0) means end of stream.
    fn read_chunk(&mut self, buf: &mut [i16]) -> Result<usize, AudioError>;

    fn sample_rate(&self) -> u32;
}

/// Opens a fresh source for each session
pub trait AudioBackend: Send + Sync {
    fn open(&self) -> Result<Box<dyn AudioSource>, AudioError>;
}

// =============================================================================
// SOURCES
// =============================================================================

fn chunk_duration(samples: usize, sample_rate: u32) -> Duration {
    Duration::from_secs_f64(samples as f64 / sample_rate.max(1) as f64)
}

/// Endless silence, paced like a real device when `paced`
#[derive(Debug, Clone)]
pub struct SilenceSource {
    sample_rate: u32,
    paced: bool,
}

impl SilenceSource {
    pub fn new(sample_rate: u32, paced: bool) -> Self {
        Self { sample_rate, paced }
    }
}

impl AudioSource for SilenceSource {
    fn read_chunk(&mut self, buf: &mut [i16]) -> Result<usize, AudioError> {
        if self.paced {
            thread::sleep(chunk_duration(buf.len(), self.sample_rate));
        }
        buf.fill(0);
        Ok(buf.len())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Replays a fixed sample buffer, then ends
#[derive(Debug, Clone)]
pub struct ReplaySource {
    samples: Vec<i16>,
    position: usize,
    sample_rate: u32,
    paced: bool,
}

impl ReplaySource {
    pub fn from_samples(samples: Vec<i16>, sample_rate: u32, paced: bool) -> Self {
        Self {
            samples,
            position: 0,
            sample_rate,
            paced,
        }
    }

    /// Load a 16-bit WAV, downmixing to mono
    pub fn from_wav(path: impl AsRef<Path>, paced: bool) -> Result<Self, AudioError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;
        let interleaved = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
        let samples = interleaved
            .chunks(channels)
            .map(|frame| (frame.iter().map(|s| *s as i32).sum::<i32>() / frame.len() as i32) as i16)
            .collect();
        Ok(Self::from_samples(samples, spec.sample_rate, paced))
    }
}

impl AudioSource for ReplaySource {
    fn read_chunk(&mut self, buf: &mut [i16]) -> Result<usize, AudioError> {
        let remaining = &self.samples[self.position..];
        let n = remaining.len().min(buf.len());
        if n == 0 {
            return Ok(0);
        }
        if self.paced {
            thread::sleep(chunk_duration(n, self.sample_rate));
        }
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Backend producing paced silence
#[derive(Debug, Clone)]
pub struct SilenceBackend {
    pub sample_rate: u32,
}

impl AudioBackend for SilenceBackend {
    fn open(&self) -> Result<Box<dyn AudioSource>, AudioError> {
        Ok(Box::new(SilenceSource::new(self.sample_rate, true)))
    }
}

/// Backend replaying a WAV file in real time
#[derive(Debug, Clone)]
pub struct WavReplayBackend {
    pub path: PathBuf,
}

impl AudioBackend for WavReplayBackend {
    fn open(&self) -> Result<Box<dyn AudioSource>, AudioError> {
        Ok(Box::new(ReplaySource::from_wav(&self.path, true)?))
    }
}

// =============================================================================
// SPEECH GATE
// =============================================================================

/// Per-chunk peak amplitude check.
///
/// A speech chunk resets the silence run, so only the silence after the
/// last speech counts against the configured share.
#[derive(Debug, Clone)]
pub struct SpeechGate {
    threshold: i16,
    silent_ratio: f64,
    chunks: usize,
    trailing_silent: usize,
    speech_chunks: usize,
}

impl SpeechGate {
    pub fn new(threshold: i16, silent_ratio: f64) -> Self {
        Self {
            threshold,
            silent_ratio,
            chunks: 0,
            trailing_silent: 0,
            speech_chunks: 0,
        }
    }

    /// Returns true when the chunk counts as speech
    pub fn observe(&mut self, chunk: &[i16]) -> bool {
        let peak = chunk.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
        let speech = peak > self.threshold.unsigned_abs();
        self.chunks += 1;
        if speech {
            self.speech_chunks += 1;
            self.trailing_silent = 0;
        } else {
            self.trailing_silent += 1;
        }
        speech
    }

    /// Spoken when the trailing silence stays below the configured share
    pub fn has_spoken(&self) -> bool {
        self.chunks > 0 && (self.trailing_silent as f64 / self.chunks as f64) < self.silent_ratio
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn speech_chunks(&self) -> usize {
        self.speech_chunks
    }

    pub fn trailing_silent_chunks(&self) -> usize {
        self.trailing_silent
    }
}

// =============================================================================
// CAPTURE TASK
// =============================================================================

/// What the capture task hands back to the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureOutcome {
    /// Any samples were captured
    pub captured: bool,
    pub has_spoken: bool,
    /// Temporary WAV artifact
    pub audio_ref: Option<PathBuf>,
    pub chunks: usize,
    pub speech_chunks: usize,
}

impl CaptureOutcome {
    pub fn empty() -> Self {
        Self {
            captured: false,
            has_spoken: false,
            audio_ref: None,
            chunks: 0,
            speech_chunks: 0,
        }
    }
}

/// Owned handle to a running capture task
#[derive(Debug)]
pub struct CaptureHandle {
    cancel: Arc<AtomicBool>,
    outcome_rx: Receiver<CaptureOutcome>,
    thread: Option<JoinHandle<()>>,
    started_at: Instant,
}

/// Start capturing on a background thread
pub fn start_capture(
    source: Box<dyn AudioSource>,
    max_duration: Duration,
    settings: &AudioSettings,
) -> Result<CaptureHandle, AudioError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel();
    let task_cancel = cancel.clone();
    let settings = settings.clone();

    let thread = thread::Builder::new()
        .name("audio-capture".to_string())
        .spawn(move || {
            let outcome = run_capture(source, &task_cancel, max_duration, &settings);
            deliver_outcome(&tx, outcome);
        })?;

    info!(max_secs = max_duration.as_secs_f64(), "audio capture started");
    Ok(CaptureHandle {
        cancel,
        outcome_rx: rx,
        thread: Some(thread),
        started_at: Instant::now(),
    })
}

impl CaptureHandle {
    /// Request cancellation and wait at most `timeout` for the outcome.
    /// On timeout the task is left to exit on its own and an empty outcome
    /// is returned.
    pub fn stop(mut self, timeout: Duration) -> CaptureOutcome {
        self.cancel.store(true, Ordering::Release);

        match self.outcome_rx.recv_timeout(timeout) {
            Ok(outcome) => {
                if let Some(thread) = self.thread.take() {
                    if thread.join().is_err() {
                        warn!("audio capture thread panicked after reporting");
                    }
                }
                info!(
                    spoken = outcome.has_spoken,
                    chunks = outcome.chunks,
                    elapsed_secs = self.started_at.elapsed().as_secs_f64(),
                    "audio capture stopped"
                );
                outcome
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "audio capture did not stop in time, continuing without it");
                self.thread.take();
                CaptureOutcome::empty()
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("audio capture ended without an outcome");
                if let Some(thread) = self.thread.take() {
                    let _ = thread.join();
                }
                CaptureOutcome::empty()
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
    }
}

/// Hand the outcome to the controller. After a timed-out stop nobody is
/// listening, so the artifact is removed here instead.
fn deliver_outcome(tx: &Sender<CaptureOutcome>, outcome: CaptureOutcome) -> bool {
    match tx.send(outcome) {
        Ok(()) => true,
        Err(SendError(orphan)) => {
            if let Some(path) = &orphan.audio_ref {
                debug!(path = %path.display(), "capture outcome unclaimed");
                remove_artifact(path);
            }
            false
        }
    }
}

fn run_capture(
    mut source: Box<dyn AudioSource>,
    cancel: &AtomicBool,
    max_duration: Duration,
    settings: &AudioSettings,
) -> CaptureOutcome {
    let started = Instant::now();
    let mut gate = SpeechGate::new(settings.speech_amplitude_threshold, settings.silent_chunk_ratio);
    let mut buf = vec![0i16; settings.chunk_samples.max(1)];
    let mut samples: Vec<i16> = Vec::new();

    while !cancel.load(Ordering::Acquire) && started.elapsed() < max_duration {
        match source.read_chunk(&mut buf) {
            Ok(0) => {
                debug!("audio source exhausted");
                break;
            }
            Ok(n) => {
                gate.observe(&buf[..n]);
                samples.extend_from_slice(&buf[..n]);
            }
            Err(e) => {
                warn!(error = %e, "audio read failed, keeping what was captured");
                break;
            }
        }
    }

    if samples.is_empty() {
        warn!("no audio frames captured");
        return CaptureOutcome::empty();
    }

    let written = match &settings.artifact_dir {
        Some(dir) => write_wav_in(dir, &samples, source.sample_rate()),
        None => write_wav(&samples, source.sample_rate()),
    };
    let audio_ref = match written {
        Ok(path) => {
            info!(path = %path.display(), spoken = gate.has_spoken(), "audio saved");
            Some(path)
        }
        Err(e) => {
            warn!(error = %e, "could not save audio");
            None
        }
    };

    CaptureOutcome {
        captured: true,
        has_spoken: gate.has_spoken(),
        audio_ref,
        chunks: gate.chunks(),
        speech_chunks: gate.speech_chunks(),
    }
}

/// Write mono 16-bit PCM to a kept temporary file in the system temp dir
pub fn write_wav(samples: &[i16], sample_rate: u32) -> Result<PathBuf, AudioError> {
    write_wav_in(&std::env::temp_dir(), samples, sample_rate)
}

/// Write mono 16-bit PCM to a kept temporary file under `dir`
pub fn write_wav_in(dir: &Path, samples: &[i16], sample_rate: u32) -> Result<PathBuf, AudioError> {
    let file = tempfile::Builder::new()
        .prefix("stress_audio_")
        .suffix(".wav")
        .tempfile_in(dir)?;
    let (_file, path) = file.keep().map_err(|e| AudioError::Io(e.error))?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(path)
}

/// Delete a temporary artifact; failures are logged and swallowed
pub fn remove_artifact(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => info!(path = %path.display(), "removed temporary audio file"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove temporary audio file"),
    }
}

// =============================================================================
// TESTS
// =============================================================================
