//! Fusion engine: facial + voice → combined stress and label

use serde::{Deserialize, Serialize};
use crate::{clamp01, FACIAL_FUSION_WEIGHT, VOICE_FUSION_WEIGHT};
use crate::types::{StressLevel, StressSource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    pub combined: f64,
    pub level: StressLevel,
    pub source: StressSource,
    /// e.g. "High Stress (facial expression only)"
    pub label: String,
}

/// 60/40 with speech; facial alone, unchanged, without
pub fn fuse(facial: f64, voice: f64, has_spoken: bool) -> FusionResult {
    let (combined, source) = if has_spoken {
        (
            clamp01(facial * FACIAL_FUSION_WEIGHT + voice * VOICE_FUSION_WEIGHT),
            StressSource::FacialAndVoice,
        )
    } else {
        (facial, StressSource::FacialOnly)
    };

    let level = StressLevel::from_score(combined);
    FusionResult {
        combined,
        level,
        source,
        label: format!("{} ({})", level.label(), source.annotation()),
    }
}
