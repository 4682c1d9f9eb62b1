//! Attack/release envelope scheduled on the device clock
//!
//! # Phases
//!
//! Each start/stop cycle schedules gain automation at absolute clock times:
//! - **Attack-Hold**: gain ramps from 0 to `sustain` over `attack` seconds,
//!   then holds at `sustain`
//! - **Release**: gain ramps from whatever level it holds at the release
//!   start down to 0 over `release` seconds
//!
//! A zero-length ramp is a jump, the limit of a linear ramp of length 0.
//! `decay` is stored and reported but does not shape the gain.
//!
//! # Architecture
//!
//! The control side builds an immutable [`GainSchedule`] and publishes it
//! through an `ArcSwap`. The renderer loads the current schedule once per
//! block and evaluates it per frame.

use crate::playback::clock::Clock;
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::debug;
use wavedeck_common::config::EnvelopeConfig;
use wavedeck_common::FadeCurve;

/// Envelope configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    /// Attack ramp length in seconds
    pub attack: f64,
    /// Decay time in seconds (not applied)
    pub decay: f64,
    /// Gain held after the attack, 0.0..=1.0
    pub sustain: f32,
    /// Release ramp length in seconds
    pub release: f64,
    pub curve: FadeCurve,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        EnvelopeConfig::default().into()
    }
}

impl From<EnvelopeConfig> for EnvelopeParams {
    fn from(config: EnvelopeConfig) -> Self {
        Self {
            attack: config.attack,
            decay: config.decay,
            sustain: config.sustain,
            release: config.release,
            curve: config.curve,
        }
    }
}

/// Scheduled release ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub start: f64,
    pub end: f64,
    /// Gain at `start`, the ramp's starting level
    pub from_level: f32,
}

/// Immutable gain automation for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainSchedule {
    pub attack_start: f64,
    pub attack_end: f64,
    pub sustain: f32,
    pub release: Option<Release>,
    pub curve: FadeCurve,
}

impl GainSchedule {
    /// Schedule that is silent at every time
    pub fn silent() -> Self {
        Self {
            attack_start: 0.0,
            attack_end: 0.0,
            sustain: 0.0,
            release: None,
            curve: FadeCurve::Linear,
        }
    }

    /// Gain at absolute time `t`
    #[inline]
    pub fn gain_at(&self, t: f64) -> f32 {
        if let Some(release) = &self.release {
            if t >= release.start {
                if t >= release.end {
                    return 0.0;
                }
                let progress = ((t - release.start) / (release.end - release.start)) as f32;
                return release.from_level * self.curve.calculate_fade_out(progress);
            }
        }
        self.attack_gain(t)
    }

    /// Gain from the attack-hold phase alone
    #[inline]
    fn attack_gain(&self, t: f64) -> f32 {
        if t < self.attack_start {
            0.0
        } else if t >= self.attack_end {
            self.sustain
        } else {
            let progress = ((t - self.attack_start) / (self.attack_end - self.attack_start)) as f32;
            self.sustain * self.curve.calculate_fade_in(progress)
        }
    }

    /// True once the gain is 0 for good
    pub fn is_finished_at(&self, t: f64) -> bool {
        self.release.is_some_and(|r| t >= r.end)
    }
}

/// Control-side envelope
///
/// Owns the parameters and publishes schedules for the renderer.
#[derive(Debug)]
pub struct EnvelopeController {
    params: EnvelopeParams,
    schedule: Arc<ArcSwap<GainSchedule>>,
}

impl EnvelopeController {
    pub fn new(params: EnvelopeParams) -> Self {
        Self {
            params,
            schedule: Arc::new(ArcSwap::from_pointee(GainSchedule::silent())),
        }
    }

    /// Handle the renderer reads schedules from
    pub fn shared(&self) -> Arc<ArcSwap<GainSchedule>> {
        Arc::clone(&self.schedule)
    }

    pub fn params(&self) -> EnvelopeParams {
        self.params
    }

    /// Currently published schedule
    pub fn schedule(&self) -> GainSchedule {
        **self.schedule.load()
    }

    pub fn set_attack(&mut self, seconds: f64) {
        self.params.attack = seconds.max(0.0);
    }

    pub fn set_decay(&mut self, seconds: f64) {
        self.params.decay = seconds.max(0.0);
    }

    pub fn set_sustain(&mut self, level: f32) {
        self.params.sustain = level.clamp(0.0, 1.0);
    }

    pub fn set_release(&mut self, seconds: f64) {
        self.params.release = seconds.max(0.0);
    }

    pub fn set_curve(&mut self, curve: FadeCurve) {
        self.params.curve = curve;
    }

    /// Begin an attack at `now`, discarding any previous automation
    pub fn schedule_start(&self, now: f64) {
        let attack = self.params.attack.max(0.0);
        self.schedule.store(Arc::new(GainSchedule {
            attack_start: now,
            attack_end: now + attack,
            sustain: self.params.sustain,
            release: None,
            curve: self.params.curve,
        }));
    }

    /// Schedule a release beginning at `at`
    ///
    /// With `cancel_previous`, any release already scheduled is discarded
    /// and the new ramp starts from the gain the envelope holds at `at`
    /// (which includes an in-progress release). Without it, an existing
    /// release is kept and the request ignored.
    ///
    /// A non-finite `at` (rate 0 makes the end unreachable) clears the
    /// release so the gain holds.
    pub fn schedule_stop(&self, at: f64, cancel_previous: bool) {
        let current = self.schedule();

        if !cancel_previous && current.release.is_some() {
            debug!("Release already scheduled; keeping it");
            return;
        }

        let release = if at.is_finite() {
            Some(Release {
                start: at,
                end: at + self.params.release.max(0.0),
                from_level: current.gain_at(at),
            })
        } else {
            None
        };

        self.schedule.store(Arc::new(GainSchedule { release, ..current }));
    }

    /// Gain right now on `clock`
    pub fn current_gain(&self, clock: &dyn Clock) -> f32 {
        self.schedule.load().gain_at(clock.now())
    }
}
