//! Normalized position ranges and their time/frame conversions.
//!
//! A loop window is stored as a fraction of total file duration so it stays
//! valid across files of different lengths. All absolute time and frame
//! ranges are derived from a `PositionRange` plus a known duration or frame
//! count and are never stored independently.

use serde::{Deserialize, Serialize};

/// A closed interval in [0, 1] describing loop boundaries as a fraction of
/// total file duration.
///
/// Construction clamps both bounds into [0, 1] and reorders inverted input,
/// so `lower() <= upper()` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct PositionRange {
    lower: f64,
    upper: f64,
}

impl PositionRange {
    pub fn new(a: f64, b: f64) -> Self {
        let a = a.clamp(0.0, 1.0);
        let b = b.clamp(0.0, 1.0);
        if a <= b {
            Self { lower: a, upper: b }
        } else {
            Self { lower: b, upper: a }
        }
    }

    /// The full file, 0...1.
    pub fn full() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
        }
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Fraction of the file covered by this range.
    pub fn size(&self) -> f64 {
        self.upper - self.lower
    }

    /// A degenerate single-point range selects nothing to play.
    pub fn is_empty(&self) -> bool {
        self.size() <= 0.0
    }

    pub fn is_full(&self) -> bool {
        self.lower == 0.0 && self.upper == 1.0
    }

    /// Absolute time window for a file of the given duration, or `None` when
    /// the duration is unknown.
    pub fn to_time_range(&self, duration: Option<f64>) -> Option<TimeRange> {
        let duration = duration?;
        Some(TimeRange {
            start: duration * self.lower,
            end: duration * self.upper,
        })
    }

    /// Frame window for a file with the given total frame count, truncating
    /// toward zero.
    pub fn to_frame_range(&self, total_frames: u64) -> (u64, u64) {
        let start = (self.lower * total_frames as f64) as u64;
        let end = (self.upper * total_frames as f64) as u64;
        (start, end)
    }
}

impl Default for PositionRange {
    fn default() -> Self {
        Self::full()
    }
}

impl From<(f64, f64)> for PositionRange {
    fn from(bounds: (f64, f64)) -> Self {
        Self::new(bounds.0, bounds.1)
    }
}

impl From<PositionRange> for (f64, f64) {
    fn from(range: PositionRange) -> Self {
        (range.lower, range.upper)
    }
}

/// Absolute time window in seconds, derived from a `PositionRange` and a
/// file duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_out_of_range_bounds() {
        let range = PositionRange::new(-0.5, 1.5);
        assert_eq!(range.lower(), 0.0);
        assert_eq!(range.upper(), 1.0);
    }

    #[test]
    fn test_new_reorders_inverted_bounds() {
        let range = PositionRange::new(0.8, 0.2);
        assert_eq!(range.lower(), 0.2);
        assert_eq!(range.upper(), 0.8);
        assert!(range.lower() <= range.upper());
    }

    #[test]
    fn test_degenerate_range_is_empty() {
        assert!(PositionRange::new(0.5, 0.5).is_empty());
        assert!(!PositionRange::new(0.5, 0.6).is_empty());
        assert!(!PositionRange::full().is_empty());
    }

    #[test]
    fn test_to_time_range_requires_duration() {
        let range = PositionRange::new(0.25, 0.75);
        assert!(range.to_time_range(None).is_none());

        let time = range.to_time_range(Some(100.0)).unwrap();
        assert_eq!(time.start, 25.0);
        assert_eq!(time.end, 75.0);
        assert_eq!(time.duration(), 50.0);
    }

    #[test]
    fn test_to_time_range_sorted_regardless_of_input_order() {
        let time = PositionRange::new(0.75, 0.25)
            .to_time_range(Some(10.0))
            .unwrap();
        assert!(time.start <= time.end);
        assert_eq!(time.start, 2.5);
        assert_eq!(time.end, 7.5);
    }

    #[test]
    fn test_to_frame_range_truncates_toward_zero() {
        let range = PositionRange::new(0.333, 0.666);
        let (start, end) = range.to_frame_range(1000);
        assert_eq!(start, 333);
        assert_eq!(end, 666);

        // boundary ranges
        assert_eq!(PositionRange::full().to_frame_range(44100), (0, 44100));
        assert_eq!(PositionRange::new(0.0, 0.0).to_frame_range(44100), (0, 0));
    }

    #[test]
    fn test_serde_round_trip_reclamps() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            v: PositionRange,
        }

        let parsed: Wrapper = toml::from_str("v = [1.5, -0.25]").unwrap();
        assert_eq!(parsed.v.lower(), 0.0);
        assert_eq!(parsed.v.upper(), 1.0);
    }
}
