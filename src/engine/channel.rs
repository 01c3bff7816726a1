//! Per-channel player state machine.
//!
//! A `ChannelPlayer` binds file loading, loop-range configuration, the
//! playback scheduler and the playhead tracker together for one channel. All
//! state lives on the owning thread: file decoding and waveform rendering
//! run on background threads but deliver their results over channels that
//! are drained only in `tick()`, so `PlayerState` and the playhead are never
//! written from anywhere else. Results that arrive for a file that has since
//! been replaced or unloaded are discarded by generation comparison.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::thread;

use image::{Rgba, RgbaImage};

use crate::config::{ChannelConfig, ConfigStore};
use crate::constants::{
    PLAYHEAD_TICK, WAVEFORM_COLOR, WAVEFORM_HEIGHT, WAVEFORM_OVERSAMPLING, WAVEFORM_WIDTH,
};
use crate::files::FileLibrary;
use crate::render::{WaveformStyle, render_waveform};

use super::buffer::{AudioBuffer, decode_file};
use super::dual::AudioChannel;
use super::error::EngineError;
use super::graph::AudioGraph;
use super::playhead::{Playhead, PlayheadTracker};
use super::range::{PositionRange, TimeRange};
use super::scheduler::PlaybackScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    AwaitingFile,
    Loading,
    Stopped,
    Paused,
    Playing,
}

struct LoadedFile {
    path: PathBuf,
    buffer: Arc<AudioBuffer>,
}

struct LoadResult {
    generation: u64,
    outcome: Result<(PathBuf, AudioBuffer), EngineError>,
}

struct RenderResult {
    generation: u64,
    image: RgbaImage,
}

pub struct ChannelPlayer {
    channel: AudioChannel,
    state: PlayerState,
    looping: bool,
    muted: bool,
    position_range: PositionRange,
    file: Option<LoadedFile>,
    scheduler: PlaybackScheduler,
    tracker: PlayheadTracker,
    segment_cache: Option<((u64, u64), AudioBuffer)>,
    config: Rc<dyn ConfigStore>,
    library: FileLibrary,
    waveform: Option<RgbaImage>,
    waveform_style: WaveformStyle,
    // Bumped on every load/unload; async results carrying an older value
    // are stale and dropped on arrival.
    generation: u64,
    load_rx: Option<mpsc::Receiver<LoadResult>>,
    render_rx: Option<mpsc::Receiver<RenderResult>>,
}

impl ChannelPlayer {
    pub fn new(channel: AudioChannel, config: Rc<dyn ConfigStore>, library: FileLibrary) -> Self {
        Self {
            channel,
            state: PlayerState::AwaitingFile,
            looping: true,
            muted: false,
            position_range: PositionRange::full(),
            file: None,
            scheduler: PlaybackScheduler::new(),
            tracker: PlayheadTracker::new(PLAYHEAD_TICK),
            segment_cache: None,
            config,
            library,
            waveform: None,
            waveform_style: WaveformStyle::Line,
            generation: 0,
            load_rx: None,
            render_rx: None,
        }
    }

    pub fn channel(&self) -> AudioChannel {
        self.channel
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn position_range(&self) -> PositionRange {
        self.position_range
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path.as_path())
    }

    pub fn duration(&self) -> Option<f64> {
        self.file.as_ref().map(|f| f.buffer.duration_secs())
    }

    /// Absolute loop window, recomputed on read from the position range and
    /// the loaded file's duration.
    pub fn time_range(&self) -> Option<TimeRange> {
        self.position_range.to_time_range(self.duration())
    }

    pub fn playhead(&self) -> Option<Playhead> {
        self.tracker.playhead()
    }

    pub fn waveform_image(&self) -> Option<&RgbaImage> {
        self.waveform.as_ref()
    }

    pub fn set_waveform_style(&mut self, style: WaveformStyle) {
        self.waveform_style = style;
    }

    /// Restore the channel's persisted configuration and re-load its clip
    /// when one is recorded and still present on disk.
    pub fn restore(&mut self) {
        let Some(config) = self.config.load(self.channel) else {
            return;
        };
        self.position_range = config.position_range;
        self.looping = config.loop_enabled;
        if let Some(path) = config.file {
            if path.exists() {
                self.begin_load(path);
            } else {
                log::warn!(
                    "channel {}: configured file {} is gone",
                    self.channel,
                    path.display()
                );
            }
        }
    }

    /// Begin loading a clip. The player enters `Loading` immediately; the
    /// import and decode run off-thread and the outcome lands in `tick()`.
    pub fn load_file(&mut self, path: &Path) {
        self.begin_load(path.to_path_buf());
    }

    fn begin_load(&mut self, path: PathBuf) {
        // A new load always supersedes the current file before progressing.
        self.scheduler.stop();
        self.tracker.stop_tracking();
        self.file = None;
        self.segment_cache = None;
        self.waveform = None;
        self.render_rx = None;
        self.generation += 1;
        self.state = PlayerState::Loading;

        let (tx, rx) = mpsc::channel();
        self.load_rx = Some(rx);

        let generation = self.generation;
        let library = self.library.clone();
        thread::spawn(move || {
            let outcome = library
                .import(&path)
                .and_then(|stored| decode_file(&stored).map(|buffer| (stored, buffer)));
            let _ = tx.send(LoadResult { generation, outcome });
        });
    }

    /// Unload the channel entirely: back to `AwaitingFile` with the default
    /// full-range looping configuration.
    pub fn unload(&mut self) {
        self.scheduler.stop();
        self.tracker.stop_tracking();
        self.generation += 1;
        self.file = None;
        self.segment_cache = None;
        self.waveform = None;
        self.load_rx = None;
        self.render_rx = None;
        self.position_range = PositionRange::full();
        self.looping = true;
        self.state = PlayerState::AwaitingFile;
        if let Err(e) = self.config.clear(self.channel) {
            log::error!("channel {}: failed to clear configuration: {e}", self.channel);
        }
    }

    /// Schedule the current loop segment and start playing.
    ///
    /// No-op unless stopped or paused, when the requested segment is empty,
    /// or when the output graph cannot be started (logged, state unchanged).
    pub fn play(&mut self, graph: &mut AudioGraph) {
        if !matches!(self.state, PlayerState::Stopped | PlayerState::Paused) {
            return;
        }
        let Some(file) = &self.file else {
            return;
        };

        let total = file.buffer.frames();
        let (start, end) = self.position_range.to_frame_range(total);
        if total == 0 || start == end || file.buffer.channels() == 0 {
            log::debug!("channel {}: empty segment, nothing to play", self.channel);
            return;
        }

        let key = (start, end);
        let cache_hit = matches!(&self.segment_cache, Some((cached, _)) if *cached == key);
        if !cache_hit {
            match file.buffer.segment(start, end) {
                Some(segment) => self.segment_cache = Some((key, segment)),
                None => {
                    log::warn!(
                        "channel {}: segment {start}..{end} out of bounds",
                        self.channel
                    );
                    return;
                }
            }
        }
        let Some((_, segment)) = &self.segment_cache else {
            return;
        };

        let looping = self.looping;
        match self.scheduler.schedule(graph, segment, looping) {
            Ok(()) => {
                self.state = PlayerState::Playing;
                self.tracker.start_tracking();
            }
            Err(e) => {
                // Play request is dropped; no user-visible error path.
                log::error!("channel {}: {e}", self.channel);
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state != PlayerState::Playing {
            return;
        }
        self.scheduler.pause();
        self.tracker.stop_tracking();
        self.state = PlayerState::Paused;
    }

    pub fn unpause(&mut self) {
        if self.state != PlayerState::Paused {
            return;
        }
        self.scheduler.unpause();
        self.tracker.start_tracking();
        self.state = PlayerState::Playing;
    }

    /// Stop playback, persisting the channel's loop configuration.
    pub fn stop(&mut self) {
        if !matches!(
            self.state,
            PlayerState::Playing | PlayerState::Paused | PlayerState::Stopped
        ) {
            return;
        }
        self.scheduler.stop();
        self.tracker.stop_tracking();
        self.persist_config();
        self.state = PlayerState::Stopped;
    }

    /// Move the loop window. While playing this stops, recomputes the
    /// segment, and re-enters playback inside the new bounds.
    pub fn set_position_range(&mut self, graph: &mut AudioGraph, range: PositionRange) {
        if range == self.position_range {
            return;
        }
        let was_playing = self.state == PlayerState::Playing;
        self.position_range = range;
        self.segment_cache = None;
        if matches!(self.state, PlayerState::Playing | PlayerState::Paused) {
            self.stop();
        }
        if was_playing {
            self.play(graph);
        }
    }

    /// Loop flag takes effect on the next schedule; the playhead mapping
    /// picks it up immediately.
    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn toggle_loop(&mut self) {
        self.looping = !self.looping;
    }

    /// Mute is a gain passthrough on the channel's output; it never touches
    /// the player state.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.scheduler.set_muted(muted);
    }

    pub fn toggle_mute(&mut self) {
        let muted = !self.muted;
        self.set_muted(muted);
    }

    /// Drive the player: apply finished async work and update the playhead.
    /// Call this at display rate from the owning thread.
    pub fn tick(&mut self) {
        self.pump_load();
        self.pump_render();

        if self.state == PlayerState::Playing && self.scheduler.finished() {
            // One-shot segment drained; the completion lands here, on the
            // owning thread.
            self.stop();
        }

        if self.state == PlayerState::Playing {
            let elapsed = self.scheduler.elapsed();
            let duration = self.duration();
            self.tracker
                .tick(elapsed, duration, self.position_range, self.looping);
        }
    }

    fn pump_load(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(result) => {
                if result.generation != self.generation {
                    log::debug!("channel {}: discarding stale load result", self.channel);
                    return;
                }
                match result.outcome {
                    Ok((path, buffer)) => {
                        log::info!(
                            "channel {}: loaded {} ({:.2}s)",
                            self.channel,
                            path.display(),
                            buffer.duration_secs()
                        );
                        let buffer = Arc::new(buffer);
                        self.file = Some(LoadedFile {
                            path,
                            buffer: buffer.clone(),
                        });
                        self.state = PlayerState::Stopped;
                        self.begin_waveform_render(buffer);
                    }
                    Err(e) => {
                        log::error!("channel {}: {e}", self.channel);
                        self.state = PlayerState::AwaitingFile;
                    }
                }
            }
            Err(TryRecvError::Empty) => {
                self.load_rx = Some(rx);
            }
            Err(TryRecvError::Disconnected) => {
                log::error!("channel {}: file load aborted", self.channel);
                if self.state == PlayerState::Loading {
                    self.state = PlayerState::AwaitingFile;
                }
            }
        }
    }

    fn begin_waveform_render(&mut self, buffer: Arc<AudioBuffer>) {
        let (tx, rx) = mpsc::channel();
        self.render_rx = Some(rx);

        let generation = self.generation;
        let style = self.waveform_style;
        thread::spawn(move || {
            let image = render_waveform(
                &buffer,
                WAVEFORM_WIDTH,
                WAVEFORM_HEIGHT,
                style,
                Rgba(WAVEFORM_COLOR),
                WAVEFORM_OVERSAMPLING,
            );
            let _ = tx.send(RenderResult { generation, image });
        });
    }

    fn pump_render(&mut self) {
        let Some(rx) = self.render_rx.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(result) => {
                if result.generation != self.generation {
                    log::debug!("channel {}: discarding stale waveform", self.channel);
                    return;
                }
                self.waveform = Some(result.image);
            }
            Err(TryRecvError::Empty) => {
                self.render_rx = Some(rx);
            }
            Err(TryRecvError::Disconnected) => {
                log::warn!("channel {}: waveform render aborted", self.channel);
            }
        }
    }

    fn persist_config(&self) {
        let Some(file) = &self.file else {
            return;
        };
        let config = ChannelConfig {
            file: Some(file.path.clone()),
            position_range: self.position_range,
            loop_enabled: self.looping,
        };
        if let Err(e) = self.config.save(self.channel, &config) {
            log::error!("channel {}: failed to persist configuration: {e}", self.channel);
        }
    }
}
