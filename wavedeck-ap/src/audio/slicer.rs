//! Time-range extraction and sprite sets
//!
//! Slicing converts seconds to frames with `floor(time * sample_rate)` and
//! clamps rather than rejects: a NaN or negative start becomes frame 0, a
//! NaN or too-large end becomes the buffer length, and an end before the
//! start yields an empty slice. The result never aliases the source data.

use crate::audio::buffer::SampleBuffer;
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Named slices of one buffer, keyed by sprite name
pub type SpriteSet = BTreeMap<String, SampleBuffer>;

/// Copy the frames between `start` and `end` seconds into a new buffer
///
/// # Arguments
/// * `buffer` - Source buffer
/// * `start` - Start time in seconds (clamped into the buffer)
/// * `end` - End time in seconds (clamped to `[start, duration]`)
///
/// # Errors
/// `UnsupportedChannelLayout` if the source is not mono or stereo
///
/// # Examples
///
/// ```
/// use wavedeck_ap::{slice, SampleBuffer};
///
/// let buffer = SampleBuffer::silent(1000, 2, 2000).unwrap();
/// let half = slice(&buffer, 0.5, 1.5).unwrap();
/// assert_eq!(half.len(), 1000);
///
/// // Out-of-range bounds clamp instead of failing
/// let all = slice(&buffer, -3.0, f64::NAN).unwrap();
/// assert_eq!(all.len(), 2000);
/// ```
pub fn slice(buffer: &SampleBuffer, start: f64, end: f64) -> Result<SampleBuffer> {
    let channels = buffer.number_of_channels();
    if !(1..=2).contains(&channels) {
        return Err(Error::UnsupportedChannelLayout { channels });
    }

    let (start_frame, end_frame) = frame_bounds(buffer, start, end);

    let data = (0..channels)
        .map(|ch| {
            buffer
                .channel_data(ch)
                .map(|samples| samples[start_frame..end_frame].to_vec())
                .unwrap_or_default()
        })
        .collect();

    SampleBuffer::new(buffer.sample_rate(), data)
}

/// Clamped `[start, end)` frame indices for a seconds range
fn frame_bounds(buffer: &SampleBuffer, start: f64, end: f64) -> (usize, usize) {
    let length = buffer.len() as f64;
    let rate = buffer.sample_rate() as f64;

    let start_frame = (start * rate).floor();
    let start_frame = if start_frame.is_nan() || start_frame < 0.0 {
        0.0
    } else {
        start_frame.min(length)
    };

    let end_frame = (end * rate).floor();
    let end_frame = if end_frame.is_nan() || end_frame > length {
        length
    } else {
        end_frame.max(start_frame)
    };

    (start_frame as usize, end_frame as usize)
}

/// Slice every named range of a buffer
///
/// Entries whose bounds are not exactly two values are skipped with a
/// warning; the remaining entries are sliced.
pub fn sprite<'a, I>(buffer: &SampleBuffer, ranges: I) -> Result<SpriteSet>
where
    I: IntoIterator<Item = (&'a str, &'a [f64])>,
{
    let mut sprites = SpriteSet::new();
    for (name, bounds) in ranges {
        match bounds {
            [start, end] => {
                sprites.insert(name.to_string(), slice(buffer, *start, *end)?);
            }
            _ => warn!(
                "Skipping sprite '{}': expected 2 bounds, got {}",
                name,
                bounds.len()
            ),
        }
    }
    Ok(sprites)
}

/// Slice every well-formed entry of a JSON sprite map
///
/// The map looks like `{"intro": [0, 1.5], "hit": ["2.0", 2.25]}`. Bounds
/// may be numbers or numeric strings. Any entry that is not a two-element
/// array of such bounds is dropped, and a value that is not an object at
/// all yields an empty set.
pub fn sprite_from_json(buffer: &SampleBuffer, ranges: &Value) -> Result<SpriteSet> {
    let Some(map) = ranges.as_object() else {
        warn!("Sprite map is not an object; nothing to slice");
        return Ok(SpriteSet::new());
    };

    let parsed: Vec<(&str, [f64; 2])> = map
        .iter()
        .filter_map(|(name, value)| match parse_bounds(value) {
            Some(bounds) => Some((name.as_str(), bounds)),
            None => {
                warn!("Skipping malformed sprite '{}': {}", name, value);
                None
            }
        })
        .collect();

    sprite(buffer, parsed.iter().map(|(name, bounds)| (*name, &bounds[..])))
}

fn parse_bounds(value: &Value) -> Option<[f64; 2]> {
    match value.as_array()?.as_slice() {
        [start, end] => Some([parse_bound(start)?, parse_bound(end)?]),
        _ => None,
    }
}

fn parse_bound(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
