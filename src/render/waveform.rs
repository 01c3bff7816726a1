//! Waveform envelope sampling and raster rendering.
//!
//! The envelope is computed once per clip: the file is mixed down to mono,
//! oversampled into per-column peak bins, and normalized by the observed peak
//! absolute amplitude (falling back to 1.0 for a silent file). The rendering
//! styles differ only in how that envelope is drawn, never in how it is
//! computed. Rendering runs on a background thread; see
//! `ChannelPlayer::tick` for how stale results are discarded.

use image::{Rgba, RgbaImage};

use crate::engine::AudioBuffer;

/// How the amplitude envelope is rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformStyle {
    /// Polyline through the envelope peaks.
    Line,
    /// One mirrored vertical bar per column.
    Bars,
    /// Bars on every other column.
    Striped,
    /// Bars with alpha fading toward the peaks.
    Gradient,
}

/// Peak-normalized amplitude envelope, one value per output column.
///
/// `oversampling` splits each column into that many bins and keeps the
/// loudest, so narrow transients survive the downsampling.
pub fn amplitude_envelope(buffer: &AudioBuffer, columns: usize, oversampling: usize) -> Vec<f32> {
    if columns == 0 {
        return Vec::new();
    }
    if buffer.frames() == 0 || buffer.channels() == 0 {
        return vec![0.0; columns];
    }

    let oversampling = oversampling.max(1);
    let bins = columns * oversampling;
    let ch = buffer.channels() as usize;

    let mono: Vec<f32> = buffer
        .samples()
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect();

    let samples_per_bin = mono.len().div_ceil(bins).max(1);
    let peaks: Vec<f32> = mono
        .chunks(samples_per_bin)
        .map(|chunk| chunk.iter().fold(0.0f32, |acc, &s| acc.max(s.abs())))
        .collect();

    let mut envelope: Vec<f32> = peaks
        .chunks(oversampling)
        .map(|chunk| chunk.iter().copied().fold(0.0, f32::max))
        .collect();
    envelope.resize(columns, 0.0);

    let peak = envelope.iter().copied().fold(0.0f32, f32::max);
    let norm = if peak > 0.0 { peak } else { 1.0 };
    for value in &mut envelope {
        *value /= norm;
    }
    envelope
}

/// Rasterize a clip's amplitude envelope into an RGBA image.
pub fn render_waveform(
    buffer: &AudioBuffer,
    width: u32,
    height: u32,
    style: WaveformStyle,
    color: Rgba<u8>,
    oversampling: usize,
) -> RgbaImage {
    let mut image = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return image;
    }

    let envelope = amplitude_envelope(buffer, width as usize, oversampling);
    let mid = (height - 1) as f32 / 2.0;

    match style {
        WaveformStyle::Line => {
            let mut previous: Option<(i64, i64)> = None;
            for (x, &amp) in envelope.iter().enumerate() {
                let y = (mid - amp * mid).round() as i64;
                let point = (x as i64, y);
                if let Some(last) = previous {
                    draw_line(&mut image, last, point, color);
                }
                previous = Some(point);
            }
        }
        WaveformStyle::Bars | WaveformStyle::Striped => {
            let stride = if style == WaveformStyle::Striped { 2 } else { 1 };
            for (x, &amp) in envelope.iter().enumerate().step_by(stride) {
                let half = amp * mid;
                draw_vline(
                    &mut image,
                    x as u32,
                    (mid - half).round() as i64,
                    (mid + half).round() as i64,
                    color,
                );
            }
        }
        WaveformStyle::Gradient => {
            for (x, &amp) in envelope.iter().enumerate() {
                let half = amp * mid;
                if half <= 0.0 {
                    continue;
                }
                let top = (mid - half).round() as i64;
                let bottom = (mid + half).round() as i64;
                for y in top.max(0)..=bottom.min(height as i64 - 1) {
                    let distance = (y as f32 - mid).abs() / mid.max(1.0);
                    let alpha = (color.0[3] as f32 * (1.0 - distance)).round() as u8;
                    let faded = Rgba([color.0[0], color.0[1], color.0[2], alpha]);
                    image.put_pixel(x as u32, y as u32, faded);
                }
            }
        }
    }

    image
}

fn draw_vline(image: &mut RgbaImage, x: u32, y0: i64, y1: i64, color: Rgba<u8>) {
    let (top, bottom) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
    for y in top.max(0)..=bottom.min(image.height() as i64 - 1) {
        image.put_pixel(x, y as u32, color);
    }
}

/// Bresenham segment between two points, clipped to the image.
fn draw_line(image: &mut RgbaImage, from: (i64, i64), to: (i64, i64), color: Rgba<u8>) {
    let (mut x, mut y) = from;
    let (x1, y1) = to;
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
            image.put_pixel(x as u32, y as u32, color);
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
