//! Playhead tracking: mapping transport time into loop-relative position.
//!
//! The tracker is a poll-driven state machine (Idle or Tracking). While
//! tracking, ticks are gated to a display-rate interval and each accepted
//! tick maps the scheduler's elapsed time back into the configured loop
//! window, honoring wrap-around. The mapping mirrors how the scheduler loops
//! a sub-segment: the reported position never leaves the loop bounds and
//! resets to the loop start exactly when the segment repeats.

use std::time::{Duration, Instant};

use super::range::PositionRange;

/// Loop-relative playback location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playhead {
    /// Seconds since file start (inside the loop window when looping).
    pub time: f64,
    /// `time / duration`, in [0, 1].
    pub position: f64,
}

/// Map elapsed transport time to a file-relative playhead time.
///
/// When looping, or when the active range spans less than the full file, the
/// elapsed time wraps inside the loop window. A degenerate (zero-length)
/// window yields `None`.
pub fn playhead_time(
    elapsed: f64,
    duration: f64,
    range: PositionRange,
    looping: bool,
) -> Option<f64> {
    if looping || range.size() < 1.0 {
        let loop_start = range.lower() * duration;
        let loop_duration = range.size() * duration;
        if loop_duration <= 0.0 {
            return None;
        }
        Some(loop_start + elapsed % loop_duration)
    } else {
        Some(elapsed)
    }
}

pub struct PlayheadTracker {
    interval: Duration,
    tracking: bool,
    last_tick: Option<Instant>,
    playhead: Option<Playhead>,
}

impl PlayheadTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            tracking: false,
            last_tick: None,
            playhead: None,
        }
    }

    pub fn start_tracking(&mut self) {
        self.tracking = true;
        self.last_tick = None;
    }

    pub fn stop_tracking(&mut self) {
        self.tracking = false;
        self.last_tick = None;
        self.playhead = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Most recently computed playhead; `None` when idle, when the duration
    /// is unknown, or when the transport reports no running time.
    pub fn playhead(&self) -> Option<Playhead> {
        self.playhead
    }

    /// Poll tick. Recomputes the playhead at most once per interval.
    pub fn tick(
        &mut self,
        elapsed: Option<Duration>,
        duration: Option<f64>,
        range: PositionRange,
        looping: bool,
    ) -> Option<Playhead> {
        if !self.tracking {
            return None;
        }
        if let Some(last) = self.last_tick
            && last.elapsed() < self.interval
        {
            return self.playhead;
        }
        self.last_tick = Some(Instant::now());
        self.playhead = compute(elapsed, duration, range, looping);
        self.playhead
    }
}

fn compute(
    elapsed: Option<Duration>,
    duration: Option<f64>,
    range: PositionRange,
    looping: bool,
) -> Option<Playhead> {
    let elapsed = elapsed?.as_secs_f64();
    let duration = duration?;
    if duration <= 0.0 {
        return None;
    }
    let time = playhead_time(elapsed, duration, range, looping)?;
    Some(Playhead {
        time,
        position: time / duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DURATION: f64 = 100.0;

    fn quarter_range() -> PositionRange {
        PositionRange::new(0.25, 0.75)
    }

    #[test]
    fn test_loop_starts_at_range_lower() {
        let time = playhead_time(0.0, DURATION, quarter_range(), true).unwrap();
        assert_eq!(time, 25.0);
    }

    #[test]
    fn test_loop_advances_within_cycle() {
        let range = quarter_range();
        let mut previous = 0.0;
        // Monotonically non-decreasing within one 50s cycle.
        for elapsed in [0.0, 10.0, 25.0, 40.0, 49.9] {
            let time = playhead_time(elapsed, DURATION, range, true).unwrap();
            assert!(time >= previous);
            previous = time;
        }
    }

    #[test]
    fn test_loop_wraps_to_start_after_cycle() {
        let range = quarter_range();
        let just_before = playhead_time(49.999, DURATION, range, true).unwrap();
        assert!((just_before - 74.999).abs() < 1e-6);

        let wrapped = playhead_time(50.0, DURATION, range, true).unwrap();
        assert_eq!(wrapped, 25.0);

        let second_cycle = playhead_time(120.0, DURATION, range, true).unwrap();
        assert_eq!(second_cycle, 45.0);
    }

    #[test]
    fn test_loop_never_leaves_configured_bounds() {
        let range = quarter_range();
        for i in 0..1000 {
            let elapsed = i as f64 * 0.377;
            let time = playhead_time(elapsed, DURATION, range, true).unwrap();
            assert!((25.0..75.0).contains(&time), "time {time} out of bounds");
        }
    }

    #[test]
    fn test_narrow_range_wraps_even_when_not_looping() {
        // A sub-range schedule still wraps; only full-range one-shots run raw.
        let time = playhead_time(60.0, DURATION, quarter_range(), false).unwrap();
        assert_eq!(time, 35.0);
    }

    #[test]
    fn test_full_range_one_shot_reports_raw_time() {
        let time = playhead_time(42.0, DURATION, PositionRange::full(), false).unwrap();
        assert_eq!(time, 42.0);
    }

    #[test]
    fn test_degenerate_loop_reports_none() {
        let point = PositionRange::new(0.5, 0.5);
        assert!(playhead_time(10.0, DURATION, point, true).is_none());
    }

    #[test]
    fn test_tracker_idle_reports_none() {
        let mut tracker = PlayheadTracker::new(Duration::ZERO);
        let playhead = tracker.tick(
            Some(Duration::from_secs(1)),
            Some(DURATION),
            quarter_range(),
            true,
        );
        assert!(playhead.is_none());
        assert!(!tracker.is_tracking());
    }

    #[test]
    fn test_tracker_maps_position() {
        let mut tracker = PlayheadTracker::new(Duration::ZERO);
        tracker.start_tracking();

        let playhead = tracker
            .tick(
                Some(Duration::from_secs(10)),
                Some(DURATION),
                quarter_range(),
                true,
            )
            .unwrap();
        assert_eq!(playhead.time, 35.0);
        assert_eq!(playhead.position, 0.35);
    }

    #[test]
    fn test_tracker_none_without_duration_or_transport() {
        let mut tracker = PlayheadTracker::new(Duration::ZERO);
        tracker.start_tracking();

        assert!(
            tracker
                .tick(None, Some(DURATION), quarter_range(), true)
                .is_none()
        );
        assert!(
            tracker
                .tick(Some(Duration::from_secs(1)), None, quarter_range(), true)
                .is_none()
        );
    }

    #[test]
    fn test_tracker_stop_clears_playhead() {
        let mut tracker = PlayheadTracker::new(Duration::ZERO);
        tracker.start_tracking();
        tracker.tick(
            Some(Duration::from_secs(1)),
            Some(DURATION),
            quarter_range(),
            true,
        );
        assert!(tracker.playhead().is_some());

        tracker.stop_tracking();
        assert!(tracker.playhead().is_none());
    }

    #[test]
    fn test_tracker_interval_gating_returns_cached_value() {
        let mut tracker = PlayheadTracker::new(Duration::from_secs(60));
        tracker.start_tracking();

        let first = tracker.tick(
            Some(Duration::from_secs(10)),
            Some(DURATION),
            quarter_range(),
            true,
        );
        // Second tick lands inside the interval, so the cached value holds
        // even though elapsed moved.
        let second = tracker.tick(
            Some(Duration::from_secs(20)),
            Some(DURATION),
            quarter_range(),
            true,
        );
        assert_eq!(first, second);
    }
}
