//! WAV fixture generation
//!
//! Files are 16-bit integer PCM in a temporary directory that lives as
//! long as the returned [`WavFixture`].

use hound::{WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A generated WAV file and the directory holding it
pub struct WavFixture {
    _dir: TempDir,
    pub path: PathBuf,
}

impl WavFixture {
    pub fn bytes(&self) -> Vec<u8> {
        std::fs::read(&self.path).expect("Failed to read fixture")
    }
}

/// Write `frames` frames, asking `frame(index, channel)` for each sample
fn write_wav<F>(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    frames: usize,
    mut frame: F,
) -> Result<(), hound::Error>
where
    F: FnMut(usize, u16) -> f32,
{
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for i in 0..frames {
        for ch in 0..channels {
            let value = frame(i, ch).clamp(-1.0, 1.0);
            writer.write_sample((value * i16::MAX as f32) as i16)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

fn fixture<F>(name: &str, sample_rate: u32, channels: u16, frames: usize, frame: F) -> WavFixture
where
    F: FnMut(usize, u16) -> f32,
{
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    write_wav(&path, sample_rate, channels, frames, frame).expect("Failed to write WAV");
    WavFixture { _dir: dir, path }
}

/// Sine wave, identical on every channel (fully center-panned)
pub fn write_sine_wav(
    sample_rate: u32,
    channels: u16,
    seconds: f32,
    frequency_hz: f32,
    amplitude: f32,
) -> WavFixture {
    let frames = (sample_rate as f32 * seconds) as usize;
    fixture("sine.wav", sample_rate, channels, frames, |i, _| {
        let t = i as f32 / sample_rate as f32;
        amplitude * (2.0 * PI * frequency_hz * t).sin()
    })
}

/// Same value on every frame of every channel
pub fn write_constant_wav(sample_rate: u32, channels: u16, seconds: f32, value: f32) -> WavFixture {
    let frames = (sample_rate as f32 * seconds) as usize;
    fixture("constant.wav", sample_rate, channels, frames, |_, _| value)
}

/// Left channel ramps up from 0, right channel is its negation
///
/// Sample values identify their frame, which makes slices checkable.
pub fn write_ramp_wav(sample_rate: u32, seconds: f32) -> WavFixture {
    let frames = (sample_rate as f32 * seconds) as usize;
    fixture("ramp.wav", sample_rate, 2, frames, |i, ch| {
        let value = i as f32 / frames as f32;
        if ch == 0 {
            value
        } else {
            -value
        }
    })
}
