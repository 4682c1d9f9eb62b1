//! Parameter metadata table
//!
//! Single source of truth for parameter names, aliases, defaults and
//! accepted ranges. Setters in the engine consult `range` and `clamp`
//! rather than hardcoding limits.

use super::{ParamKey, ParamValue};
use std::ops::RangeInclusive;

/// Static description of one engine parameter
#[derive(Debug)]
pub struct ParamMetadata {
    pub param: ParamKey,
    /// Canonical normalized name
    pub key: &'static str,
    /// Other normalized names that resolve to this parameter
    pub aliases: &'static [&'static str],
    pub default_value: f64,
    /// Accepted numeric range, if bounded
    pub range: Option<RangeInclusive<f64>>,
    /// Out-of-range values are clamped instead of rejected
    pub clamps: bool,
    pub read_only: bool,
    pub description: &'static str,
}

static METADATA: [ParamMetadata; 11] = [
    ParamMetadata {
        param: ParamKey::PlaybackRate,
        key: "playbackrate",
        aliases: &["rate", "playback_rate"],
        default_value: 1.0,
        range: Some(0.0..=1024.0),
        clamps: false,
        read_only: false,
        description: "Speed multiplier for buffer traversal",
    },
    ParamMetadata {
        param: ParamKey::Loop,
        key: "loop",
        aliases: &["looping"],
        default_value: 0.0,
        range: None,
        clamps: false,
        read_only: false,
        description: "Restart the active window when it ends",
    },
    ParamMetadata {
        param: ParamKey::CurrentTime,
        key: "currenttime",
        aliases: &["current_time", "position"],
        default_value: 0.0,
        range: None,
        clamps: false,
        read_only: false,
        description: "Playback position in seconds",
    },
    ParamMetadata {
        param: ParamKey::Duration,
        key: "duration",
        aliases: &[],
        default_value: 0.0,
        range: None,
        clamps: false,
        read_only: true,
        description: "Length of the loaded buffer in seconds",
    },
    ParamMetadata {
        param: ParamKey::SampleRate,
        key: "samplerate",
        aliases: &["sample_rate"],
        default_value: 44100.0,
        range: None,
        clamps: false,
        read_only: true,
        description: "Sample rate of the loaded buffer",
    },
    ParamMetadata {
        param: ParamKey::Channels,
        key: "channels",
        aliases: &["numberofchannels"],
        default_value: 0.0,
        range: None,
        clamps: false,
        read_only: true,
        description: "Channel count of the loaded buffer",
    },
    ParamMetadata {
        param: ParamKey::VocalCancelerDepth,
        key: "vocalcanceler.depth",
        aliases: &["depth", "vocalcanceler", "vocal_canceler.depth"],
        default_value: 0.0,
        range: Some(0.0..=1.0),
        clamps: true,
        read_only: false,
        description: "Cross-channel subtraction amount",
    },
    ParamMetadata {
        param: ParamKey::EnvelopeAttack,
        key: "envelope.attack",
        aliases: &["attack"],
        default_value: 0.0,
        range: Some(0.0..=f64::MAX),
        clamps: true,
        read_only: false,
        description: "Attack ramp length in seconds",
    },
    ParamMetadata {
        param: ParamKey::EnvelopeDecay,
        key: "envelope.decay",
        aliases: &["decay"],
        default_value: 0.01,
        range: Some(0.0..=f64::MAX),
        clamps: true,
        read_only: false,
        description: "Decay length in seconds (stored only)",
    },
    ParamMetadata {
        param: ParamKey::EnvelopeSustain,
        key: "envelope.sustain",
        aliases: &["sustain"],
        default_value: 1.0,
        range: Some(0.0..=1.0),
        clamps: true,
        read_only: false,
        description: "Gain held after the attack",
    },
    ParamMetadata {
        param: ParamKey::EnvelopeRelease,
        key: "envelope.release",
        aliases: &["release"],
        default_value: 0.01,
        range: Some(0.0..=f64::MAX),
        clamps: true,
        read_only: false,
        description: "Release ramp length in seconds",
    },
];

impl ParamMetadata {
    /// Metadata for every parameter
    pub fn all() -> &'static [ParamMetadata] {
        &METADATA
    }

    pub fn lookup(param: ParamKey) -> &'static ParamMetadata {
        // Table order follows ParamKey::all()
        &METADATA[ParamKey::all()
            .iter()
            .position(|k| *k == param)
            .unwrap_or_default()]
    }

    /// Validate a value against this parameter's range
    ///
    /// # Returns
    /// - `Ok(value)` unchanged when in range or unbounded
    /// - `Ok(clamped)` when out of range and the parameter clamps
    /// - `Err` when out of range and the parameter rejects, or the value is NaN
    pub fn check(&self, value: f64) -> Result<f64, String> {
        if value.is_nan() {
            return Err(format!("{}: value is not a number", self.key));
        }
        let Some(range) = &self.range else {
            return Ok(value);
        };
        if range.contains(&value) {
            Ok(value)
        } else if self.clamps {
            Ok(value.clamp(*range.start(), *range.end()))
        } else {
            Err(format!(
                "{}: value {} out of range [{}, {}]",
                self.key,
                value,
                range.start(),
                range.end()
            ))
        }
    }

    pub fn default(&self) -> ParamValue {
        if self.param == ParamKey::Loop {
            ParamValue::Bool(self.default_value != 0.0)
        } else {
            ParamValue::Number(self.default_value)
        }
    }
}
