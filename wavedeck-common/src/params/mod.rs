//! Engine parameter keys, values and bulk configuration
//!
//! Parameters are addressed by name from the control surface
//! (`PlaybackEngine::set`/`get`). Names are matched case-insensitively and
//! with hyphens ignored, so `playbackRate`, `playback-rate` and
//! `PLAYBACKRATE` all resolve to [`ParamKey::PlaybackRate`].
//!
//! # Usage
//!
//! ```rust
//! use wavedeck_common::params::{ParamKey, ParamValue};
//!
//! let key: ParamKey = "Playback-Rate".parse().unwrap();
//! assert_eq!(key, ParamKey::PlaybackRate);
//! assert_eq!(ParamValue::from(2.0).as_f64(), 2.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod metadata;

pub use metadata::ParamMetadata;

/// Lowercase a parameter name and strip hyphens
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Named engine parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKey {
    PlaybackRate,
    Loop,
    CurrentTime,
    Duration,
    SampleRate,
    Channels,
    VocalCancelerDepth,
    EnvelopeAttack,
    EnvelopeDecay,
    EnvelopeSustain,
    EnvelopeRelease,
}

impl ParamKey {
    /// Canonical name as reported by `params()`
    pub fn as_str(&self) -> &'static str {
        self.metadata().key
    }

    /// Static description of this parameter
    pub fn metadata(&self) -> &'static ParamMetadata {
        ParamMetadata::lookup(*self)
    }

    /// True for keys that can be read but not set
    pub fn is_read_only(&self) -> bool {
        self.metadata().read_only
    }

    /// All keys in the order bulk configuration applies them
    pub fn all() -> &'static [ParamKey] {
        &[
            ParamKey::PlaybackRate,
            ParamKey::Loop,
            ParamKey::CurrentTime,
            ParamKey::Duration,
            ParamKey::SampleRate,
            ParamKey::Channels,
            ParamKey::VocalCancelerDepth,
            ParamKey::EnvelopeAttack,
            ParamKey::EnvelopeDecay,
            ParamKey::EnvelopeSustain,
            ParamKey::EnvelopeRelease,
        ]
    }
}

impl FromStr for ParamKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_key(s);
        ParamMetadata::all()
            .iter()
            .find(|m| m.key == normalized || m.aliases.contains(&normalized.as_str()))
            .map(|m| m.param)
            .ok_or_else(|| crate::Error::InvalidInput(format!("unknown parameter: {}", s)))
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dynamically typed parameter value
///
/// Numbers and booleans convert into each other the permissive way:
/// any non-zero number is `true`, and `true` reads as `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            ParamValue::Number(v) => v,
            ParamValue::Bool(true) => 1.0,
            ParamValue::Bool(false) => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match *self {
            ParamValue::Bool(b) => b,
            ParamValue::Number(v) => v != 0.0 && !v.is_nan(),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Number(v as f64)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Number(v as f64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl FromStr for ParamValue {
    type Err = crate::Error;

    /// Parses `true`/`false` (any case) or a float
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return Ok(ParamValue::Bool(true));
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Ok(ParamValue::Bool(false));
        }
        trimmed
            .parse::<f64>()
            .map(ParamValue::Number)
            .map_err(|_| crate::Error::InvalidInput(format!("not a number or boolean: {}", s)))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Number(v) => write!(f, "{}", v),
        }
    }
}

/// Bulk parameter configuration
///
/// Every field is optional; absent fields leave the engine untouched.
/// Deserializes from TOML or JSON with the same field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub playback_rate: Option<f64>,
    #[serde(rename = "loop", alias = "looping")]
    pub looping: Option<bool>,
    pub current_time: Option<f64>,
    pub vocal_canceler_depth: Option<f32>,
    pub attack: Option<f64>,
    pub decay: Option<f64>,
    pub sustain: Option<f32>,
    pub release: Option<f64>,
}

impl EngineParams {
    /// Record one key/value pair
    ///
    /// Returns `false` (and records nothing) for read-only keys.
    pub fn insert(&mut self, key: ParamKey, value: ParamValue) -> bool {
        match key {
            ParamKey::PlaybackRate => self.playback_rate = Some(value.as_f64()),
            ParamKey::Loop => self.looping = Some(value.as_bool()),
            ParamKey::CurrentTime => self.current_time = Some(value.as_f64()),
            ParamKey::VocalCancelerDepth => self.vocal_canceler_depth = Some(value.as_f64() as f32),
            ParamKey::EnvelopeAttack => self.attack = Some(value.as_f64()),
            ParamKey::EnvelopeDecay => self.decay = Some(value.as_f64()),
            ParamKey::EnvelopeSustain => self.sustain = Some(value.as_f64() as f32),
            ParamKey::EnvelopeRelease => self.release = Some(value.as_f64()),
            ParamKey::Duration | ParamKey::SampleRate | ParamKey::Channels => return false,
        }
        true
    }

    /// Build from name/value pairs, skipping names that do not resolve
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, ParamValue)>,
    {
        let mut params = EngineParams::default();
        for (name, value) in pairs {
            match name.parse::<ParamKey>() {
                Ok(key) => {
                    params.insert(key, value);
                }
                Err(_) => tracing::debug!("Ignoring unknown parameter '{}'", name),
            }
        }
        params
    }

    /// Present fields as key/value pairs in application order
    pub fn entries(&self) -> Vec<(ParamKey, ParamValue)> {
        let mut out = Vec::new();
        if let Some(v) = self.playback_rate {
            out.push((ParamKey::PlaybackRate, v.into()));
        }
        if let Some(v) = self.looping {
            out.push((ParamKey::Loop, v.into()));
        }
        if let Some(v) = self.current_time {
            out.push((ParamKey::CurrentTime, v.into()));
        }
        if let Some(v) = self.vocal_canceler_depth {
            out.push((ParamKey::VocalCancelerDepth, v.into()));
        }
        if let Some(v) = self.attack {
            out.push((ParamKey::EnvelopeAttack, v.into()));
        }
        if let Some(v) = self.decay {
            out.push((ParamKey::EnvelopeDecay, v.into()));
        }
        if let Some(v) = self.sustain {
            out.push((ParamKey::EnvelopeSustain, v.into()));
        }
        if let Some(v) = self.release {
            out.push((ParamKey::EnvelopeRelease, v.into()));
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Vocal canceler section of a [`ParamsSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VocalCancelerSnapshot {
    pub depth: f32,
}

/// Envelope section of a [`ParamsSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSnapshot {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f32,
    pub release: f64,
}

/// Point-in-time view of every engine parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamsSnapshot {
    pub playback_rate: f64,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub current_time: f64,
    pub duration: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub vocal_canceler: VocalCancelerSnapshot,
    pub envelope: EnvelopeSnapshot,
}

impl ParamsSnapshot {
    /// Read one value by key
    pub fn get(&self, key: ParamKey) -> ParamValue {
        match key {
            ParamKey::PlaybackRate => self.playback_rate.into(),
            ParamKey::Loop => self.looping.into(),
            ParamKey::CurrentTime => self.current_time.into(),
            ParamKey::Duration => self.duration.into(),
            ParamKey::SampleRate => self.sample_rate.into(),
            ParamKey::Channels => ParamValue::Number(self.channels as f64),
            ParamKey::VocalCancelerDepth => self.vocal_canceler.depth.into(),
            ParamKey::EnvelopeAttack => self.envelope.attack.into(),
            ParamKey::EnvelopeDecay => self.envelope.decay.into(),
            ParamKey::EnvelopeSustain => self.envelope.sustain.into(),
            ParamKey::EnvelopeRelease => self.envelope.release.into(),
        }
    }
}
