//! Error types for the playback engine.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the playback engine.
///
/// Zero-length segments are deliberately not represented here: an empty
/// requested range means "nothing to play" and transport operations treat it
/// as a silent no-op rather than an error.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("cannot access audio file {path}: {source}")]
    FileAccess { path: PathBuf, source: io::Error },

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("audio output could not be started: {0}")]
    GraphStart(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
