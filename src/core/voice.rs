//! Voice stress estimator
//!
//! Gated by speech presence. With speech, one oracle request is made with a
//! fixed prompt contract; the reply is read as
//!   1. `stress_score` of the first top-level JSON object,
//!   2. else the first `0.<digits>` in the raw text,
//!   3. else 0.5.
//! Oracle failures of any kind also yield 0.5.

use std::time::Duration;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use crate::{clamp01, VOICE_DEFAULT_STRESS};
use crate::config::OracleSettings;
use crate::types::{ReasonCode, VoiceEstimate};

lazy_static! {
    static ref RE_SCORE: Regex = Regex::new(r"0\.\d+").unwrap();
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle not configured")]
    NotConfigured,
    #[error("oracle request timed out")]
    Timeout,
    #[error("oracle transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("oracle returned status {status}")]
    Status { status: u16, body: String },
}

/// External text-analysis service returning raw reply text
pub trait SpeechStressOracle: Send + Sync {
    fn analyze(&self, prompt: &str) -> Result<String, OracleError>;
}

/// Prompt sent for a transcript
pub fn build_prompt(transcript: &str) -> String {
    format!(
        r#"Analyze this speech transcript for signs of stress in the speaker's language:

"{transcript}"

Look for:
1. Use of stress-indicating words or phrases
2. Speech patterns indicating anxiety or pressure
3. Verbal indicators of nervousness or tension
4. Hesitation, stuttering, or rushed speech
5. Repeated phrases or words indicating worry

After analysis, provide a stress level score from 0.0 to 1.0 where:
- 0.0-0.2: Very low stress
- 0.2-0.4: Low stress
- 0.4-0.6: Moderate stress
- 0.6-0.8: High stress
- 0.8-1.0: Very high stress

Provide your answer in JSON format with a "stress_score" field containing ONLY the numerical value.
For example: {{"stress_score": 0.65}}"#
    )
}

/// Slice of the first balanced `{...}` at top level, string-aware
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Apply the parse chain to a reply. None means "use the default".
pub fn parse_stress_score(text: &str) -> Option<(f64, ReasonCode)> {
    if let Some(score) = first_json_object(text)
        .and_then(|obj| serde_json::from_str::<Value>(obj).ok())
        .and_then(|value| score_field(&value))
    {
        return Some((clamp01(score), ReasonCode::V001_ORACLE_JSON));
    }

    RE_SCORE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|score| (clamp01(score), ReasonCode::V001_ORACLE_TEXT_FALLBACK))
}

/// `stress_score` as a number or a numeric string
fn score_field(value: &Value) -> Option<f64> {
    match value.get("stress_score")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Speech-gated oracle client
pub struct VoiceStressEstimator {
    oracle: Option<Box<dyn SpeechStressOracle>>,
}

impl std::fmt::Debug for VoiceStressEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceStressEstimator")
            .field("oracle", &self.oracle.is_some())
            .finish()
    }
}

impl VoiceStressEstimator {
    pub fn new(oracle: Box<dyn SpeechStressOracle>) -> Self {
        Self { oracle: Some(oracle) }
    }

    /// No oracle: every spoken session falls back to the default
    pub fn disabled() -> Self {
        Self { oracle: None }
    }

    /// HTTP oracle when a URL is configured, disabled otherwise
    pub fn from_settings(settings: &OracleSettings) -> Self {
        match HttpOracle::from_settings(settings) {
            Some(oracle) => Self::new(Box::new(oracle)),
            None => Self::disabled(),
        }
    }

    pub fn estimate(&self, has_spoken: bool, transcript: &str) -> VoiceEstimate {
        if !has_spoken {
            info!("no speech detected, skipping voice analysis");
            return VoiceEstimate {
                stress: 0.0,
                reason: ReasonCode::V001_NO_SPEECH,
            };
        }

        let reply = match &self.oracle {
            Some(oracle) => oracle.analyze(&build_prompt(transcript)),
            None => Err(OracleError::NotConfigured),
        };

        match reply {
            Ok(text) => match parse_stress_score(&text) {
                Some((stress, reason)) => {
                    info!(voice_stress = stress, reason = reason.code(), "voice stress analysed");
                    VoiceEstimate { stress, reason }
                }
                None => {
                    warn!(reply = %truncate(&text, 100), "no stress score in oracle reply, using default");
                    VoiceEstimate {
                        stress: VOICE_DEFAULT_STRESS,
                        reason: ReasonCode::V001_ORACLE_UNPARSEABLE,
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "voice stress oracle failed, using default");
                VoiceEstimate {
                    stress: VOICE_DEFAULT_STRESS,
                    reason: ReasonCode::V001_ORACLE_FAILED,
                }
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

// =============================================================================
// HTTP ORACLE
// =============================================================================

/// generateContent-style HTTP oracle.
///
/// Request: `{"contents":[{"parts":[{"text": prompt}]}]}`. The reply text is
/// `candidates[0].content.parts[0].text` when present, else the raw body.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpOracle {
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            api_key,
            timeout,
        }
    }

    pub fn from_settings(settings: &OracleSettings) -> Option<Self> {
        let url = settings.url.as_ref()?;
        Some(Self::new(
            url.clone(),
            settings.api_key.clone(),
            Duration::from_secs(settings.timeout_secs),
        ))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl SpeechStressOracle for HttpOracle {
    fn analyze(&self, prompt: &str) -> Result<String, OracleError> {
        // Built per call: one request per session, and the blocking client
        // must not be created or dropped inside an async runtime.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let payload = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let mut request = client.post(&self.url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request.send().map_err(map_transport)?;
        let status = response.status();
        let body = response.text().map_err(map_transport)?;

        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        info!(status = status.as_u16(), "oracle responded");
        Ok(extract_reply_text(&body))
    }
}

fn map_transport(e: reqwest::Error) -> OracleError {
    if e.is_timeout() {
        OracleError::Timeout
    } else {
        OracleError::Transport(e)
    }
}

/// Candidate text out of a generateContent body, raw body otherwise
pub fn extract_reply_text(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/candidates/0/content/parts/0/text")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

// =============================================================================
// TESTS
// =============================================================================
