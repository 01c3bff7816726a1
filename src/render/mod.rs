pub mod waveform;

pub use waveform::{WaveformStyle, amplitude_envelope, render_waveform};
