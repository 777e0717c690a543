//! Metric extraction: landmark sub-ranges → eyebrow gap, lip tension
//!
//! Faults never escape `measure`: the affected metric becomes 0 and is
//! not pushed into its window.

use thiserror::Error;
use tracing::{debug, warn};
use crate::MIN_MOUTH_POINTS;
use crate::core::TrailingWindow;
use crate::types::{FaceLandmarks, MeasurementSample, Point};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    #[error("eyebrow range empty (left={left}, right={right})")]
    MissingEyebrow { left: usize, right: usize },
    #[error("mouth has {0} points, need at least {min}", min = MIN_MOUTH_POINTS)]
    TooFewMouthPoints(usize),
    #[error("non-finite landmark coordinate")]
    NonFinite,
}

/// Distance between the inner eyebrow ends (last of left, first of right)
pub fn eye_gap(left_eyebrow: &[Point], right_eyebrow: &[Point]) -> Result<f64, MetricError> {
    let (Some(left), Some(right)) = (left_eyebrow.last(), right_eyebrow.first()) else {
        return Err(MetricError::MissingEyebrow {
            left: left_eyebrow.len(),
            right: right_eyebrow.len(),
        });
    };
    if !left.is_finite() || !right.is_finite() {
        return Err(MetricError::NonFinite);
    }
    Ok(left.distance(right))
}

/// Mouth width / height from its extreme points; 0 when height is 0
pub fn lip_tension(mouth: &[Point]) -> Result<f64, MetricError> {
    if mouth.len() < MIN_MOUTH_POINTS {
        return Err(MetricError::TooFewMouthPoints(mouth.len()));
    }
    if mouth.iter().any(|p| !p.is_finite()) {
        return Err(MetricError::NonFinite);
    }

    // First point wins on ties, like a stable min/max by key
    let pick = |better: fn(&Point, &Point) -> bool| {
        mouth.iter().fold(&mouth[0], |best, p| if better(p, best) { p } else { best })
    };
    let left = pick(|p, b| p.x < b.x);
    let right = pick(|p, b| p.x > b.x);
    let top = pick(|p, b| p.y < b.y);
    let bottom = pick(|p, b| p.y > b.y);

    let width = left.distance(right);
    let height = top.distance(bottom);

    if height > 0.0 {
        Ok(width / height)
    } else {
        Ok(0.0)
    }
}

/// Extract both metrics and push the successful ones into their windows
pub fn measure(
    face: &FaceLandmarks,
    eye_window: &mut TrailingWindow,
    lip_window: &mut TrailingWindow,
) -> MeasurementSample {
    let eye = match eye_gap(face.left_eyebrow(), face.right_eyebrow()) {
        Ok(value) => {
            eye_window.push(value);
            value
        }
        Err(e) => {
            warn!(error = %e, "eye gap measurement failed");
            0.0
        }
    };

    let lip = match lip_tension(face.mouth()) {
        Ok(value) => {
            lip_window.push(value);
            value
        }
        Err(e) => {
            warn!(error = %e, "lip tension measurement failed");
            0.0
        }
    };

    debug!(eye_gap = eye, lip_tension = lip, "frame measured");
    MeasurementSample::new(eye, lip)
}
