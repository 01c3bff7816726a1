//! Decoded audio buffers and looped-segment extraction.
//!
//! Files are decoded fully into memory as interleaved f32 samples so that a
//! loop segment can be copied out and scheduled with seamless wraparound.
//! Supports WAV (via hound) and FLAC (via claxon); samples are normalized to
//! [-1, 1] according to the source bit depth.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::error::{EngineError, Result};

/// A fully decoded audio clip: interleaved f32 samples plus format info.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Interleaved samples, frame-major.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frames(&self) -> u64 {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() as u64 / self.channels as u64
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / self.sample_rate as f64
        }
    }

    /// Copy out the frames in `start..end`, preserving channel count and
    /// sample format.
    ///
    /// Returns `None` if the range is inverted or exceeds the source frame
    /// length. No resampling or format conversion is performed.
    pub fn segment(&self, start: u64, end: u64) -> Option<AudioBuffer> {
        if self.channels == 0 || start > end || end > self.frames() {
            return None;
        }

        let ch = self.channels as usize;
        let from = start as usize * ch;
        let to = end as usize * ch;

        Some(AudioBuffer {
            sample_rate: self.sample_rate,
            channels: self.channels,
            samples: self.samples[from..to].to_vec(),
        })
    }
}

/// Decode a whole audio file into memory, dispatching on file extension.
pub fn decode_file(path: &Path) -> Result<AudioBuffer> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "wav" => decode_wav(path),
        "flac" => decode_flac(path),
        _ => Err(EngineError::UnsupportedFormat(ext)),
    }
}

fn decode_wav(path: &Path) -> Result<AudioBuffer> {
    let file = File::open(path).map_err(|source| EngineError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader =
        hound::WavReader::new(BufReader::new(file)).map_err(|e| EngineError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let spec = reader.spec();

    let decode_err = |e: hound::Error| EngineError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(decode_err)?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => {
                let raw: Vec<i16> = reader
                    .samples::<i16>()
                    .collect::<std::result::Result<_, _>>()
                    .map_err(decode_err)?;
                raw.into_iter().map(|s| s as f32 / 32768.0).collect()
            }
            24 => {
                let raw: Vec<i32> = reader
                    .samples::<i32>()
                    .collect::<std::result::Result<_, _>>()
                    .map_err(decode_err)?;
                raw.into_iter().map(|s| s as f32 / 8388608.0).collect()
            }
            32 => {
                let raw: Vec<i32> = reader
                    .samples::<i32>()
                    .collect::<std::result::Result<_, _>>()
                    .map_err(decode_err)?;
                raw.into_iter().map(|s| s as f32 / 2147483648.0).collect()
            }
            8 => {
                let raw: Vec<i8> = reader
                    .samples::<i8>()
                    .collect::<std::result::Result<_, _>>()
                    .map_err(decode_err)?;
                raw.into_iter().map(|s| s as f32 / 128.0).collect()
            }
            bits => {
                return Err(EngineError::Decode {
                    path: path.to_path_buf(),
                    reason: format!("unsupported bit depth: {bits}"),
                });
            }
        },
    };

    log::info!(
        "decoded WAV {}: {} Hz, {} channels, {} bits, {} frames",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        samples.len() as u64 / spec.channels.max(1) as u64
    );

    Ok(AudioBuffer::new(spec.sample_rate, spec.channels, samples))
}

fn decode_flac(path: &Path) -> Result<AudioBuffer> {
    let mut reader = claxon::FlacReader::open(path).map_err(|e| EngineError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let info = reader.streaminfo();
    let scale = (1i64 << (info.bits_per_sample - 1)) as f32;

    let mut samples = Vec::new();
    for sample in reader.samples() {
        let sample = sample.map_err(|e| EngineError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        samples.push(sample as f32 / scale);
    }

    log::info!(
        "decoded FLAC {}: {} Hz, {} channels, {} frames",
        path.display(),
        info.sample_rate,
        info.channels,
        samples.len() as u64 / info.channels.max(1) as u64
    );

    Ok(AudioBuffer::new(
        info.sample_rate,
        info.channels as u16,
        samples,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_buffer(frames: u64) -> AudioBuffer {
        // Left channel counts up, right channel counts down, so segment
        // boundaries are easy to verify.
        let mut samples = Vec::new();
        for i in 0..frames {
            samples.push(i as f32);
            samples.push(-(i as f32));
        }
        AudioBuffer::new(44100, 2, samples)
    }

    #[test]
    fn test_frames_and_duration() {
        let buffer = stereo_buffer(44100);
        assert_eq!(buffer.frames(), 44100);
        assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);

        let empty = AudioBuffer::new(44100, 0, vec![]);
        assert_eq!(empty.frames(), 0);
    }

    #[test]
    fn test_segment_copies_exact_frames() {
        let buffer = stereo_buffer(100);
        let segment = buffer.segment(10, 20).unwrap();

        assert_eq!(segment.frames(), 10);
        assert_eq!(segment.channels(), 2);
        assert_eq!(segment.sample_rate(), 44100);
        assert_eq!(segment.samples()[0], 10.0);
        assert_eq!(segment.samples()[1], -10.0);
        assert_eq!(segment.samples()[18], 19.0);
        assert_eq!(segment.samples()[19], -19.0);
    }

    #[test]
    fn test_segment_rejects_invalid_ranges() {
        let buffer = stereo_buffer(100);
        assert!(buffer.segment(20, 10).is_none());
        assert!(buffer.segment(0, 101).is_none());
        assert!(buffer.segment(0, 100).is_some());
    }

    #[test]
    fn test_segment_zero_length_is_empty() {
        let buffer = stereo_buffer(100);
        let segment = buffer.segment(50, 50).unwrap();
        assert_eq!(segment.frames(), 0);
    }

    #[test]
    fn test_decode_wav_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..8000u32 {
            let t = i as f32 / 8000.0;
            let sample = (t * 440.0 * 2.0 * std::f32::consts::PI).sin();
            writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let buffer = decode_file(&path).unwrap();
        assert_eq!(buffer.sample_rate(), 8000);
        assert_eq!(buffer.channels(), 1);
        assert_eq!(buffer.frames(), 8000);
        assert!((buffer.duration_secs() - 1.0).abs() < 1e-6);
        assert!(buffer.samples().iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_decode_unsupported_extension() {
        let err = decode_file(Path::new("clip.mp3")).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_file(Path::new("/nonexistent/clip.wav")).unwrap_err();
        assert!(matches!(err, EngineError::FileAccess { .. }));
    }
}
