//! Session aggregator: per-second buckets → facial stress + trend report
//!
//! Every second counts once regardless of how many frames landed in it.
//! Buckets are keyed by arrival; finalize sorts the keys explicitly.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use crate::clamp01;
use crate::types::{SecondAverage, SessionSummary, Trend, TrendReport};

#[derive(Debug, Clone, Default)]
pub struct SessionAggregator {
    buckets: HashMap<u64, Vec<f64>>,
    frame_count: usize,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a smoothed score to the bucket for `elapsed` (truncated)
    pub fn record(&mut self, elapsed: Duration, stress: f64) {
        self.record_second(elapsed.as_secs(), stress);
    }

    /// Append relative to a session start
    pub fn record_at(&mut self, started_at: Instant, now: Instant, stress: f64) {
        self.record(now.saturating_duration_since(started_at), stress);
    }

    pub fn record_second(&mut self, second: u64, stress: f64) {
        self.buckets.entry(second).or_default().push(stress);
        self.frame_count += 1;
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.frame_count = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Reduce the buckets; does not clear them
    pub fn finalize(&self) -> SessionSummary {
        let mut seconds: Vec<u64> = self
            .buckets
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(second, _)| *second)
            .collect();
        seconds.sort_unstable();

        let averages: Vec<SecondAverage> = seconds
            .iter()
            .map(|second| {
                let values = &self.buckets[second];
                SecondAverage {
                    second: *second,
                    average: values.iter().sum::<f64>() / values.len() as f64,
                }
            })
            .collect();

        let facial_stress = if averages.is_empty() {
            0.0
        } else {
            clamp01(averages.iter().map(|s| s.average).sum::<f64>() / averages.len() as f64)
        };

        SessionSummary {
            facial_stress,
            frame_count: self.frame_count,
            trend: trend_report(averages),
        }
    }
}

/// Peak, minimum and direction over seconds already in ascending order
pub fn trend_report(seconds: Vec<SecondAverage>) -> Option<TrendReport> {
    let first = *seconds.first()?;

    // First occurrence wins on ties
    let mut peak = first;
    let mut minimum = first;
    for s in &seconds[1..] {
        if s.average > peak.average {
            peak = *s;
        }
        if s.average < minimum.average {
            minimum = *s;
        }
    }

    let values: Vec<f64> = seconds.iter().map(|s| s.average).collect();
    Some(TrendReport {
        trend: classify_trend(&values),
        seconds,
        peak,
        minimum,
    })
}

/// Compare the mean of the first half to the mean of the second half.
/// The second half takes the extra element when the count is odd.
pub fn classify_trend(averages: &[f64]) -> Option<Trend> {
    if averages.len() < 2 {
        return None;
    }
    let mid = averages.len() / 2;
    let mean = |xs: &[f64]| xs.iter().sum::<f64>() / xs.len() as f64;
    let first_half = mean(&averages[..mid]);
    let second_half = mean(&averages[mid..]);

    Some(if second_half > first_half {
        Trend::Increasing
    } else if second_half < first_half {
        Trend::Decreasing
    } else {
        Trend::Stable
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_session_is_zero() {
        let summary = SessionAggregator::new().finalize();
        assert_eq!(summary.facial_stress, 0.0);
        assert!(summary.trend.is_none());
    }

    #[test]
    fn test_equal_weight_per_second() {
        let mut agg = SessionAggregator::new();
        // Second 0: many frames at 0.2, second 1: one frame at 0.8
        for _ in 0..10 {
            agg.record_second(0, 0.2);
        }
        agg.record_second(1, 0.8);
        let summary = agg.finalize();
        assert!((summary.facial_stress - 0.5).abs() < 1e-12);
        assert_eq!(summary.frame_count, 11);
    }

    #[test]
    fn test_duplicating_samples_within_second_is_invariant() {
        let mut a = SessionAggregator::new();
        let mut b = SessionAggregator::new();
        for (sec, v) in [(0, 0.1), (0, 0.3), (1, 0.6), (2, 0.9)] {
            a.record_second(sec, v);
            b.record_second(sec, v);
            b.record_second(sec, v);
        }
        assert!((a.finalize().facial_stress - b.finalize().facial_stress).abs() < 1e-12);
    }

    #[test]
    fn test_duplicating_a_second_changes_result() {
        let mut a = SessionAggregator::new();
        a.record_second(0, 0.2);
        a.record_second(1, 0.8);

        let mut b = a.clone();
        b.record_second(2, 0.8);

        assert!((a.finalize().facial_stress - b.finalize().facial_stress).abs() > 1e-3);
    }

    #[test]
    fn test_keys_sorted_regardless_of_arrival() {
        let mut agg = SessionAggregator::new();
        agg.record_second(3, 0.6);
        agg.record_second(0, 0.1);
        agg.record_second(2, 0.5);
        agg.record_second(1, 0.2);

        let report = agg.finalize().trend.unwrap();
        let order: Vec<u64> = report.seconds.iter().map(|s| s.second).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(report.trend, Some(Trend::Increasing));
        assert_eq!(report.peak.second, 3);
        assert_eq!(report.minimum.second, 0);
    }

    #[test]
    fn test_record_truncates_elapsed() {
        let mut agg = SessionAggregator::new();
        agg.record(Duration::from_millis(1999), 0.4);
        agg.record(Duration::from_millis(1000), 0.6);
        let report = agg.finalize().trend.unwrap();
        assert_eq!(report.seconds.len(), 1);
        assert_eq!(report.seconds[0].second, 1);
        assert!((report.seconds[0].average - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(classify_trend(&[0.1, 0.2, 0.5, 0.6]), Some(Trend::Increasing));
        assert_eq!(classify_trend(&[0.6, 0.5, 0.2, 0.1]), Some(Trend::Decreasing));
        assert_eq!(classify_trend(&[0.3, 0.3]), Some(Trend::Stable));
        assert_eq!(classify_trend(&[0.3]), None);
        // Odd count: [0.5] vs [0.1, 0.3]
        assert_eq!(classify_trend(&[0.5, 0.1, 0.3]), Some(Trend::Decreasing));
    }

    #[test]
    fn test_single_second_has_report_without_trend() {
        let mut agg = SessionAggregator::new();
        agg.record_second(0, 0.3);
        let report = agg.finalize().trend.unwrap();
        assert!(report.trend.is_none());
        assert_eq!(report.peak, report.minimum);
    }
}
