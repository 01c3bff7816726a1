//! Per-channel playback scheduling over the shared output graph.
//!
//! A scheduler owns at most one sink at a time. Scheduling a segment always
//! replaces the current sink, so the newest schedule preempts whatever is
//! playing (interrupt semantics). Looped segments repeat seamlessly; one-shot
//! segments drain and are detected as finished by the owner's poll.
//!
//! rodio has no transport-time query, so the scheduler keeps a pause-aware
//! wall clock started at schedule time. That clock is the playhead tracker's
//! time source.

use std::time::{Duration, Instant};

use rodio::{Source, buffer::SamplesBuffer};

use super::buffer::AudioBuffer;
use super::error::Result;
use super::graph::AudioGraph;

/// Wall clock measuring elapsed playback time since transport start,
/// excluding time spent paused.
#[derive(Debug, Default)]
pub struct TransportClock {
    started: Option<Instant>,
    paused_since: Option<Instant>,
    paused_total: Duration,
}

impl TransportClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.paused_since = None;
        self.paused_total = Duration::ZERO;
    }

    pub fn pause(&mut self) {
        if self.started.is_some() && self.paused_since.is_none() {
            self.paused_since = Some(Instant::now());
        }
    }

    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_since.take() {
            self.paused_total += paused_at.elapsed();
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Elapsed play time, or `None` if the transport never started.
    pub fn elapsed(&self) -> Option<Duration> {
        let started = self.started?;
        let paused = self.paused_total
            + self
                .paused_since
                .map(|p| p.elapsed())
                .unwrap_or(Duration::ZERO);
        Some(started.elapsed().saturating_sub(paused))
    }
}

pub struct PlaybackScheduler {
    sink: Option<rodio::Sink>,
    clock: TransportClock,
    muted: bool,
    looped: bool,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self {
            sink: None,
            clock: TransportClock::new(),
            muted: false,
            looped: false,
        }
    }

    /// Schedule a segment for playback, preempting any current schedule.
    ///
    /// With `looped` the segment repeats indefinitely with seamless
    /// wraparound; otherwise it plays once and `finished()` turns true when
    /// it drains. Empty segments are a silent no-op.
    pub fn schedule(&mut self, graph: &mut AudioGraph, segment: &AudioBuffer, looped: bool) -> Result<()> {
        if segment.frames() == 0 || segment.channels() == 0 {
            log::debug!("empty segment, nothing to schedule");
            return Ok(());
        }

        // Interrupt semantics: drop the old sink before building the new one.
        if let Some(old) = self.sink.take() {
            old.stop();
        }

        let sink = graph.new_sink()?;
        sink.set_volume(if self.muted { 0.0 } else { 1.0 });

        let source = SamplesBuffer::new(
            segment.channels(),
            segment.sample_rate(),
            segment.samples().to_vec(),
        );
        if looped {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }
        sink.play();

        self.sink = Some(sink);
        self.looped = looped;
        self.clock.start();

        log::debug!(
            "scheduled {} frames ({})",
            segment.frames(),
            if looped { "looping" } else { "one-shot" }
        );
        Ok(())
    }

    /// Pause, preserving position for resume.
    pub fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        self.clock.pause();
    }

    /// Resume a paused schedule without rescheduling.
    pub fn unpause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
        self.clock.resume();
    }

    /// Stop and reset the transport to the segment start.
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.clock.reset();
        self.looped = false;
    }

    /// Gain passthrough: 0 when muted, unity otherwise. Survives sink
    /// replacement on the next schedule.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(sink) = &self.sink {
            sink.set_volume(if muted { 0.0 } else { 1.0 });
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_scheduled(&self) -> bool {
        self.sink.is_some()
    }

    /// True once a one-shot segment has played to completion.
    pub fn finished(&self) -> bool {
        !self.looped && self.sink.as_ref().map(|s| s.empty()).unwrap_or(false)
    }

    /// Elapsed time since transport start, or `None` when nothing is
    /// scheduled.
    pub fn elapsed(&self) -> Option<Duration> {
        if self.sink.is_some() {
            self.clock.elapsed()
        } else {
            None
        }
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_clock_none_before_start() {
        let clock = TransportClock::new();
        assert!(clock.elapsed().is_none());
    }

    #[test]
    fn test_clock_advances_after_start() {
        let mut clock = TransportClock::new();
        clock.start();
        sleep(Duration::from_millis(15));
        let elapsed = clock.elapsed().unwrap();
        assert!(elapsed >= Duration::from_millis(10));
    }

    #[test]
    fn test_clock_pause_freezes_elapsed() {
        let mut clock = TransportClock::new();
        clock.start();
        sleep(Duration::from_millis(10));
        clock.pause();
        let at_pause = clock.elapsed().unwrap();
        sleep(Duration::from_millis(20));
        let while_paused = clock.elapsed().unwrap();
        // Paused time must not count toward elapsed (small scheduling slack).
        assert!(while_paused < at_pause + Duration::from_millis(5));

        clock.resume();
        sleep(Duration::from_millis(10));
        assert!(clock.elapsed().unwrap() > while_paused);
    }

    #[test]
    fn test_clock_reset_clears_start() {
        let mut clock = TransportClock::new();
        clock.start();
        clock.reset();
        assert!(clock.elapsed().is_none());
    }

    #[test]
    fn test_scheduler_initial_state() {
        let scheduler = PlaybackScheduler::new();
        assert!(!scheduler.is_scheduled());
        assert!(!scheduler.finished());
        assert!(!scheduler.is_muted());
        assert!(scheduler.elapsed().is_none());
    }

    #[test]
    fn test_empty_segment_is_noop() {
        let mut scheduler = PlaybackScheduler::new();
        let mut graph = AudioGraph::new();
        let empty = AudioBuffer::new(44100, 2, vec![]);

        // Must not attempt to start the output stream.
        scheduler.schedule(&mut graph, &empty, true).unwrap();
        assert!(!graph.is_running());
        assert!(!scheduler.is_scheduled());
    }

    #[test]
    fn test_mute_flag_retained_without_sink() {
        let mut scheduler = PlaybackScheduler::new();
        scheduler.set_muted(true);
        assert!(scheduler.is_muted());
        scheduler.set_muted(false);
        assert!(!scheduler.is_muted());
    }
}
