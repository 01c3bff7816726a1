//! Project-wide constants used across multiple modules.
//!
//! This module centralizes constant definitions to avoid duplication and ensure
//! consistency across the codebase.

use std::time::Duration;

/// Supported audio file extensions
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac"];

/// Playhead poll interval, bounded by a typical display refresh rate
pub const PLAYHEAD_TICK: Duration = Duration::from_millis(16);

/// Default waveform raster width in pixels
pub const WAVEFORM_WIDTH: u32 = 800;

/// Default waveform raster height in pixels
pub const WAVEFORM_HEIGHT: u32 = 120;

/// Envelope oversampling factor for waveform rendering
pub const WAVEFORM_OVERSAMPLING: usize = 8;

/// Default waveform stroke color (RGBA)
pub const WAVEFORM_COLOR: [u8; 4] = [0x3a, 0xa0, 0xff, 0xff];

/// File name for persisted per-channel player configuration
pub const CONFIG_FILE_NAME: &str = "players.toml";
