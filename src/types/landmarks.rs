//! Face geometry as delivered by the landmark provider
//!
//! 68-point layout:
//! - 17-21: left eyebrow (image left, inner end last)
//! - 22-26: right eyebrow (inner end first)
//! - 48-67: mouth (outer + inner lip)

use serde::{Deserialize, Serialize};
use std::ops::Range;

pub const LANDMARK_COUNT: usize = 68;
pub const LEFT_EYEBROW: Range<usize> = 17..22;
pub const RIGHT_EYEBROW: Range<usize> = 22..27;
pub const MOUTH: Range<usize> = 48..68;

/// A single 2D landmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Landmarks for one detected face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub points: Vec<Point>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn left_eyebrow(&self) -> &[Point] {
        self.range(LEFT_EYEBROW)
    }

    pub fn right_eyebrow(&self) -> &[Point] {
        self.range(RIGHT_EYEBROW)
    }

    pub fn mouth(&self) -> &[Point] {
        self.range(MOUTH)
    }

    /// Sub-range clipped to the points actually present
    fn range(&self, range: Range<usize>) -> &[Point] {
        let end = range.end.min(self.points.len());
        let start = range.start.min(end);
        &self.points[start..end]
    }
}

/// One video frame reduced to its faces. No faces is a valid frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub faces: Vec<FaceLandmarks>,
}

impl Frame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(face: FaceLandmarks) -> Self {
        Self { faces: vec![face] }
    }
}
