//! Parameter surface - key/value access and typed accessors
//!
//! String keys go through [`ParamKey`] parsing, so `Playback-Rate`,
//! `playbackrate` and `rate` all name the same parameter. Unknown keys,
//! read-only keys and out-of-range values are logged and ignored; nothing
//! here returns an error.

use super::core::PlaybackEngine;
use crate::playback::clock::Clock;
use tracing::{debug, warn};
use wavedeck_common::params::{EnvelopeSnapshot, VocalCancelerSnapshot};
use wavedeck_common::{EngineParams, FadeCurve, ParamKey, ParamValue, ParamsSnapshot};

impl PlaybackEngine {
    // ========================================================================
    // Key/value access
    // ========================================================================

    /// Read one parameter by name; `None` for unknown names
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        match name.parse::<ParamKey>() {
            Ok(key) => Some(self.params().get(key)),
            Err(_) => {
                debug!("Unknown parameter '{}'", name);
                None
            }
        }
    }

    /// Set one parameter by name
    ///
    /// Returns whether the value was applied.
    pub fn param(&mut self, name: &str, value: impl Into<ParamValue>) -> bool {
        match name.parse::<ParamKey>() {
            Ok(key) => self.set_param(key, value.into()),
            Err(_) => {
                debug!("Ignoring unknown parameter '{}'", name);
                false
            }
        }
    }

    pub fn set_param(&mut self, key: ParamKey, value: ParamValue) -> bool {
        if key.is_read_only() {
            debug!("Ignoring write to read-only parameter '{}'", key.as_str());
            return false;
        }

        if key == ParamKey::Loop {
            self.set_looping(value.as_bool());
            return true;
        }

        let value = match key.metadata().check(value.as_f64()) {
            Ok(value) => value,
            Err(reason) => {
                warn!("Rejected parameter value: {}", reason);
                return false;
            }
        };

        match key {
            ParamKey::PlaybackRate => self.set_playback_rate(value),
            ParamKey::CurrentTime => self.set_current_time(value),
            ParamKey::VocalCancelerDepth => {
                self.set_depth(value as f32);
                true
            }
            ParamKey::EnvelopeAttack => {
                self.envelope.set_attack(value);
                true
            }
            ParamKey::EnvelopeDecay => {
                self.envelope.set_decay(value);
                true
            }
            ParamKey::EnvelopeSustain => {
                self.envelope.set_sustain(value as f32);
                true
            }
            ParamKey::EnvelopeRelease => {
                self.envelope.set_release(value);
                true
            }
            ParamKey::Loop | ParamKey::Duration | ParamKey::SampleRate | ParamKey::Channels => {
                false
            }
        }
    }

    /// Apply every set field of `params`
    ///
    /// Returns the number of values applied.
    pub fn set_params(&mut self, params: &EngineParams) -> usize {
        params
            .entries()
            .into_iter()
            .filter(|(key, value)| self.set_param(*key, *value))
            .count()
    }

    /// Snapshot of every parameter
    pub fn params(&self) -> ParamsSnapshot {
        let envelope = self.envelope.params();
        ParamsSnapshot {
            playback_rate: self.playback_rate,
            looping: self.looping,
            current_time: self.current_time(),
            duration: self.duration(),
            sample_rate: self.sample_rate(),
            channels: self.channels(),
            vocal_canceler: VocalCancelerSnapshot {
                depth: self.canceler.depth(),
            },
            envelope: EnvelopeSnapshot {
                attack: envelope.attack,
                decay: envelope.decay,
                sustain: envelope.sustain,
                release: envelope.release,
            },
        }
    }

    // ========================================================================
    // Transport parameters
    // ========================================================================

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    /// Change the rate; the scheduled release moves so it still lands at
    /// the end of the buffer
    pub fn set_playback_rate(&mut self, rate: f64) -> bool {
        let rate = match ParamKey::PlaybackRate.metadata().check(rate) {
            Ok(rate) => rate,
            Err(reason) => {
                warn!("Rejected playback rate: {}", reason);
                return false;
            }
        };

        self.playback_rate = rate;
        if let Some(cycle) = &self.current {
            cycle.set_playback_rate(rate);
        }
        debug!("Playback rate set to {}", rate);

        self.reanchor_release();
        true
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
        debug!("Loop {}", if looping { "enabled" } else { "disabled" });
    }

    /// Position in seconds; live while playing
    pub fn current_time(&self) -> f64 {
        match &self.current {
            Some(cycle) if !self.paused => cycle.position(),
            _ => self.position,
        }
    }

    /// Relocate while paused, restart at `seconds` while playing
    pub fn set_current_time(&mut self, seconds: f64) -> bool {
        let Some(buffer) = &self.buffer else {
            debug!("currentTime ignored: no buffer loaded");
            return false;
        };
        let duration = buffer.duration();
        if !(0.0..=duration).contains(&seconds) {
            warn!("currentTime {} outside [0, {}]", seconds, duration);
            return false;
        }

        if self.paused {
            self.position = seconds;
        } else {
            self.stop();
            self.start(seconds, None);
        }
        true
    }

    /// Buffer duration in seconds; 0 without a buffer
    pub fn duration(&self) -> f64 {
        self.buffer.as_ref().map_or(0.0, |b| b.duration())
    }

    /// Buffer sample rate, or the configured default without a buffer
    pub fn sample_rate(&self) -> u32 {
        self.buffer
            .as_ref()
            .map_or(self.default_sample_rate, |b| b.sample_rate())
    }

    pub fn channels(&self) -> u16 {
        self.buffer
            .as_ref()
            .map_or(0, |b| b.number_of_channels() as u16)
    }

    // ========================================================================
    // Processing parameters
    // ========================================================================

    pub fn depth(&self) -> f32 {
        self.canceler.depth()
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.canceler.set_depth(depth);
    }

    /// Attack length in seconds
    pub fn fade_in(&self) -> f64 {
        self.envelope.params().attack
    }

    pub fn set_fade_in(&mut self, seconds: f64) {
        self.envelope.set_attack(seconds);
        self.reanchor_release();
    }

    /// Release length in seconds
    pub fn fade_out(&self) -> f64 {
        self.envelope.params().release
    }

    pub fn set_fade_out(&mut self, seconds: f64) {
        self.envelope.set_release(seconds);
        self.reanchor_release();
    }

    pub fn set_fade_curve(&mut self, curve: FadeCurve) {
        self.envelope.set_curve(curve);
    }

    /// Move the scheduled release to `now + (duration - position) / rate`
    ///
    /// Only while playing; a paused engine may still be rendering its
    /// release tail, which must not move.
    fn reanchor_release(&mut self) {
        if self.paused {
            return;
        }
        let now = self.clock.now();
        let remaining = self.duration() - self.current_time();
        self.envelope
            .schedule_stop(now + remaining / self.playback_rate, true);
    }
}
