//! Runtime configuration
//!
//! Numeric policy (windows, gains, thresholds) stays in the crate constants;
//! this covers what varies per deployment. Loaded from an optional JSON file,
//! then environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_ORACLE_URL: &str = "STRESSLINE_ORACLE_URL";
pub const ENV_ORACLE_KEY: &str = "STRESSLINE_ORACLE_KEY";

/// Stand-in transcript used when no transcript was supplied for a session
pub const FALLBACK_TRANSCRIPT: &str = "This is a stressful situation and I'm feeling quite anxious about it. \
I'm worried about the outcome and not sure what to do next.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Session length in seconds
    pub session_secs: u64,
    /// Bounded wait for the capture task on stop (milliseconds)
    pub audio_join_timeout_ms: u64,
    pub audio: AudioSettings,
    pub oracle: OracleSettings,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            session_secs: crate::DEFAULT_SESSION_SECS,
            audio_join_timeout_ms: crate::AUDIO_JOIN_TIMEOUT_MS,
            audio: AudioSettings::default(),
            oracle: OracleSettings::default(),
        }
    }
}

/// Capture parameters and the speech gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub sample_rate: u32,
    pub chunk_samples: usize,
    pub speech_amplitude_threshold: i16,
    pub silent_chunk_ratio: f64,
    /// Where temporary WAV artifacts go; system temp dir when unset
    pub artifact_dir: Option<PathBuf>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: crate::AUDIO_SAMPLE_RATE,
            chunk_samples: crate::AUDIO_CHUNK_SAMPLES,
            speech_amplitude_threshold: crate::SPEECH_AMPLITUDE_THRESHOLD,
            silent_chunk_ratio: crate::SILENT_CHUNK_RATIO,
            artifact_dir: None,
        }
    }
}

/// Speech-stress oracle endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    /// generateContent-style endpoint; no URL means no oracle
    pub url: Option<String>,
    /// Sent as the `key` query parameter when present
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub fallback_transcript: String,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: crate::ORACLE_TIMEOUT_SECS,
            fallback_transcript: FALLBACK_TRANSCRIPT.to_string(),
        }
    }
}

impl StressConfig {
    /// Load from a JSON file; missing fields take defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply STRESSLINE_ORACLE_URL / STRESSLINE_ORACLE_KEY
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_ORACLE_URL) {
            if !url.trim().is_empty() {
                self.oracle.url = Some(url);
            }
        }
        if let Ok(key) = std::env::var(ENV_ORACLE_KEY) {
            if !key.trim().is_empty() {
                self.oracle.api_key = Some(key);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "session_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.audio.chunk_samples == 0 {
            return Err(ConfigError::Invalid {
                field: "audio.chunk_samples",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.audio.sample_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "audio.sample_rate",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.oracle.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "oracle.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.audio.silent_chunk_ratio) {
            return Err(ConfigError::Invalid {
                field: "audio.silent_chunk_ratio",
                reason: format!("{} is outside [0, 1]", self.audio.silent_chunk_ratio),
            });
        }
        Ok(())
    }

    pub fn session_duration(&self) -> Duration {
        Duration::from_secs(self.session_secs)
    }

    pub fn audio_join_timeout(&self) -> Duration {
        Duration::from_millis(self.audio_join_timeout_ms)
    }
}
