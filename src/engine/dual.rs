//! The dual-channel engine: two players, one output graph, exclusive solo.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::ConfigStore;
use crate::files::FileLibrary;

use super::channel::{ChannelPlayer, PlayerState};
use super::graph::AudioGraph;
use super::range::PositionRange;

/// One of exactly two playback slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioChannel {
    A,
    B,
}

impl AudioChannel {
    pub const ALL: [AudioChannel; 2] = [AudioChannel::A, AudioChannel::B];

    /// Cyclic advance, A -> B -> A.
    pub fn next(self) -> Self {
        match self {
            AudioChannel::A => AudioChannel::B,
            AudioChannel::B => AudioChannel::A,
        }
    }

    /// Stable key used by the configuration store.
    pub fn key(self) -> &'static str {
        match self {
            AudioChannel::A => "a",
            AudioChannel::B => "b",
        }
    }

    pub fn index(self) -> usize {
        match self {
            AudioChannel::A => 0,
            AudioChannel::B => 1,
        }
    }
}

impl fmt::Display for AudioChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioChannel::A => write!(f, "A"),
            AudioChannel::B => write!(f, "B"),
        }
    }
}

/// Owns the shared output graph and exactly two channel players.
///
/// Channel selection is an exclusive solo: the selected channel is unmuted
/// and every other channel is muted; selecting no channel mutes both.
pub struct DualChannelEngine {
    graph: AudioGraph,
    players: [ChannelPlayer; 2],
    selected: Option<AudioChannel>,
}

impl DualChannelEngine {
    pub fn new(config: Rc<dyn ConfigStore>, library: FileLibrary) -> Self {
        let players = [
            ChannelPlayer::new(AudioChannel::A, config.clone(), library.clone()),
            ChannelPlayer::new(AudioChannel::B, config, library),
        ];
        let mut engine = Self {
            graph: AudioGraph::new(),
            players,
            selected: None,
        };
        engine.select_channel(Some(AudioChannel::A));
        engine
    }

    pub fn player(&self, channel: AudioChannel) -> &ChannelPlayer {
        &self.players[channel.index()]
    }

    pub fn player_mut(&mut self, channel: AudioChannel) -> &mut ChannelPlayer {
        &mut self.players[channel.index()]
    }

    /// Restore each channel's persisted configuration.
    pub fn restore(&mut self) {
        for player in &mut self.players {
            player.restore();
        }
    }

    pub fn selected_channel(&self) -> Option<AudioChannel> {
        self.selected
    }

    /// Solo the given channel, or mute everything with `None`.
    pub fn select_channel(&mut self, channel: Option<AudioChannel>) {
        self.selected = channel;
        for player in &mut self.players {
            player.set_muted(Some(player.channel()) != channel);
        }
        match channel {
            Some(channel) => log::info!("channel {channel} selected"),
            None => log::info!("all channels muted"),
        }
    }

    /// Advance the selection cyclically (A -> B -> A). With nothing
    /// selected, selects A.
    pub fn select_next_channel(&mut self) {
        let next = match self.selected {
            Some(channel) => channel.next(),
            None => AudioChannel::A,
        };
        self.select_channel(Some(next));
    }

    /// True when at least one channel is playing.
    pub fn any_playing(&self) -> bool {
        self.players
            .iter()
            .any(|p| p.state() == PlayerState::Playing)
    }

    /// True when every channel is playing.
    pub fn all_playing(&self) -> bool {
        self.players
            .iter()
            .all(|p| p.state() == PlayerState::Playing)
    }

    pub fn load_file(&mut self, channel: AudioChannel, path: &Path) {
        self.players[channel.index()].load_file(path);
    }

    pub fn unload(&mut self, channel: AudioChannel) {
        self.players[channel.index()].unload();
    }

    pub fn play(&mut self, channel: AudioChannel) {
        self.players[channel.index()].play(&mut self.graph);
    }

    pub fn pause(&mut self, channel: AudioChannel) {
        self.players[channel.index()].pause();
    }

    pub fn unpause(&mut self, channel: AudioChannel) {
        self.players[channel.index()].unpause();
    }

    pub fn stop(&mut self, channel: AudioChannel) {
        self.players[channel.index()].stop();
    }

    pub fn set_position_range(&mut self, channel: AudioChannel, range: PositionRange) {
        self.players[channel.index()].set_position_range(&mut self.graph, range);
    }

    pub fn set_loop(&mut self, channel: AudioChannel, looping: bool) {
        self.players[channel.index()].set_loop(looping);
    }

    pub fn toggle_loop(&mut self, channel: AudioChannel) {
        self.players[channel.index()].toggle_loop();
    }

    pub fn play_all(&mut self) {
        for player in &mut self.players {
            player.play(&mut self.graph);
        }
    }

    pub fn stop_all(&mut self) {
        for player in &mut self.players {
            player.stop();
        }
    }

    pub fn pause_all(&mut self) {
        for player in &mut self.players {
            player.pause();
        }
    }

    pub fn unpause_all(&mut self) {
        for player in &mut self.players {
            player.unpause();
        }
    }

    pub fn set_all_ranges(&mut self, range: PositionRange) {
        for player in &mut self.players {
            player.set_position_range(&mut self.graph, range);
        }
    }

    /// Stop both players and tear the shared output stream down.
    pub fn shutdown(&mut self) {
        for player in &mut self.players {
            player.stop();
        }
        self.graph.stop();
    }

    /// Drive both players; call at display rate from the owning thread.
    pub fn tick(&mut self) {
        for player in &mut self.players {
            player.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_cycles() {
        assert_eq!(AudioChannel::A.next(), AudioChannel::B);
        assert_eq!(AudioChannel::B.next(), AudioChannel::A);
        assert_eq!(AudioChannel::A.next().next(), AudioChannel::A);
    }

    #[test]
    fn test_channel_keys_are_distinct() {
        assert_eq!(AudioChannel::A.key(), "a");
        assert_eq!(AudioChannel::B.key(), "b");
        assert_ne!(AudioChannel::A.index(), AudioChannel::B.index());
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(AudioChannel::A.to_string(), "A");
        assert_eq!(AudioChannel::B.to_string(), "B");
    }
}
