//! Immutable decoded audio
//!
//! A [`SampleBuffer`] holds planar f32 channel data at a fixed sample rate.
//! It is never mutated after construction; playback shares it through
//! `Arc<SampleBuffer>` and slicing always copies into a new buffer.

use crate::audio::types::AudioFrame;
use crate::error::{Error, Result};

/// Planar PCM audio, one or two channels of equal length
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl SampleBuffer {
    /// Build a buffer from per-channel sample vectors
    ///
    /// # Errors
    /// - `UnsupportedChannelLayout` unless there are exactly 1 or 2 channels
    /// - `InvalidBuffer` for a zero sample rate or channels of unequal length
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if !(1..=2).contains(&channels.len()) {
            return Err(Error::UnsupportedChannelLayout { channels: channels.len() });
        }
        if sample_rate == 0 {
            return Err(Error::InvalidBuffer("sample rate must be positive".to_string()));
        }
        let length = channels[0].len();
        if channels.iter().any(|c| c.len() != length) {
            return Err(Error::InvalidBuffer("channels differ in length".to_string()));
        }
        Ok(Self { sample_rate, channels })
    }

    /// Build a buffer from interleaved samples
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(sample_rate: u32, channel_count: usize, samples: &[f32]) -> Result<Self> {
        if !(1..=2).contains(&channel_count) {
            return Err(Error::UnsupportedChannelLayout { channels: channel_count });
        }
        let frames = samples.len() / channel_count;
        let channels = (0..channel_count)
            .map(|ch| {
                samples
                    .chunks_exact(channel_count)
                    .take(frames)
                    .map(|frame| frame[ch])
                    .collect()
            })
            .collect();
        Self::new(sample_rate, channels)
    }

    /// Zero-filled buffer of `length` frames
    pub fn silent(sample_rate: u32, channel_count: usize, length: usize) -> Result<Self> {
        Self::new(sample_rate, vec![vec![0.0; length]; channel_count])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn number_of_channels(&self) -> usize {
        self.channels.len()
    }

    /// Frame count
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel, `None` when out of range
    pub fn channel_data(&self, channel: usize) -> Option<&[f32]> {
        self.channels.get(channel).map(Vec::as_slice)
    }

    /// Stereo frame at `index`; mono is duplicated, past-the-end is silent
    #[inline]
    pub fn frame(&self, index: usize) -> AudioFrame {
        let left = match self.channels[0].get(index) {
            Some(sample) => *sample,
            None => return AudioFrame::zero(),
        };
        match self.channels.get(1) {
            Some(right) => AudioFrame::new(left, right[index]),
            None => AudioFrame::mono(left),
        }
    }

    /// Stereo frame at fractional `position` (in frames), linearly interpolated
    ///
    /// Negative positions and positions at or past the last frame read as
    /// silence beyond the edge, so a window's final frame fades toward zero
    /// rather than wrapping.
    #[inline]
    pub fn frame_at(&self, position: f64) -> AudioFrame {
        if position < 0.0 || position >= self.len() as f64 {
            return AudioFrame::zero();
        }
        let index = position as usize;
        let frac = (position - index as f64) as f32;
        let current = self.frame(index);
        if frac == 0.0 {
            current
        } else {
            current.lerp(self.frame(index + 1), frac)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    #[test]
    fn test_new_validates_layout() {
        assert!(SampleBuffer::new(44100, vec![ramp(4)]).is_ok());
        assert!(SampleBuffer::new(44100, vec![ramp(4), ramp(4)]).is_ok());

        assert!(matches!(
            SampleBuffer::new(44100, vec![]),
            Err(Error::UnsupportedChannelLayout { channels: 0 })
        ));
        assert!(matches!(
            SampleBuffer::new(44100, vec![ramp(4); 6]),
            Err(Error::UnsupportedChannelLayout { channels: 6 })
        ));
        assert!(matches!(
            SampleBuffer::new(44100, vec![ramp(4), ramp(3)]),
            Err(Error::InvalidBuffer(_))
        ));
        assert!(matches!(SampleBuffer::new(0, vec![ramp(4)]), Err(Error::InvalidBuffer(_))));
    }

    #[test]
    fn test_duration_and_len() {
        let buffer = SampleBuffer::silent(8000, 2, 16000).unwrap();
        assert_eq!(buffer.len(), 16000);
        assert_eq!(buffer.number_of_channels(), 2);
        assert!((buffer.duration() - 2.0).abs() < 1e-12);
        assert!(!buffer.is_empty());
        assert!(SampleBuffer::silent(8000, 1, 0).unwrap().is_empty());
    }

    #[test]
    fn test_from_interleaved() {
        let buffer = SampleBuffer::from_interleaved(48000, 2, &[1.0, -1.0, 2.0, -2.0, 3.0]).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.channel_data(0).unwrap(), &[1.0, 2.0]);
        assert_eq!(buffer.channel_data(1).unwrap(), &[-1.0, -2.0]);
        assert!(buffer.channel_data(2).is_none());
    }

    #[test]
    fn test_mono_frames_duplicate() {
        let buffer = SampleBuffer::new(100, vec![vec![0.5, 0.25]]).unwrap();
        assert_eq!(buffer.frame(1), AudioFrame::mono(0.25));
        assert_eq!(buffer.frame(2), AudioFrame::zero());
    }

    #[test]
    fn test_frame_at_interpolates() {
        let buffer = SampleBuffer::new(100, vec![ramp(4), ramp(4)]).unwrap();
        assert_eq!(buffer.frame_at(1.0), AudioFrame::new(1.0, 1.0));
        assert_eq!(buffer.frame_at(1.5), AudioFrame::new(1.5, 1.5));
        // last frame blends toward silence
        assert_eq!(buffer.frame_at(3.5), AudioFrame::new(1.5, 1.5));
        assert_eq!(buffer.frame_at(4.0), AudioFrame::zero());
        assert_eq!(buffer.frame_at(-0.5), AudioFrame::zero());
    }
}
