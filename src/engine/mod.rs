//! Dual-channel playback engine.
//!
//! Two independent channel players share one lazily started output graph.
//! Each player loads a clip fully into memory, extracts the segment selected
//! by its normalized position range, and schedules it looped or one-shot; a
//! display-rate poller maps transport time back into loop-relative playhead
//! position.

pub mod buffer;
pub mod channel;
pub mod dual;
pub mod error;
pub mod graph;
pub mod playhead;
pub mod range;
pub mod scheduler;

pub use buffer::{AudioBuffer, decode_file};
pub use channel::{ChannelPlayer, PlayerState};
pub use dual::{AudioChannel, DualChannelEngine};
pub use error::{EngineError, Result};
pub use graph::AudioGraph;
pub use playhead::{Playhead, PlayheadTracker};
pub use range::{PositionRange, TimeRange};
pub use scheduler::PlaybackScheduler;
