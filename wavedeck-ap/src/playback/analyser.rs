//! Analysis collaborator
//!
//! The engine reports lifecycle and position changes to an [`Analyser`]
//! but never reads anything back except whether the time overview is in
//! sprite mode, which decides where a loop restarts.

use crate::audio::SampleBuffer;

/// Observation domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Time,
    Fft,
}

pub trait Analyser: Send {
    fn start(&mut self, domain: Domain);

    fn stop(&mut self, domain: Domain);

    /// Build the overview of one channel of a newly installed buffer
    fn time_overview(&mut self, channel: usize, buffer: &SampleBuffer);

    /// Move the overview cursor of one channel to `position` seconds
    fn update_time_overview(&mut self, channel: usize, position: f64);

    /// Loop restarts use the sprite window instead of the whole buffer
    fn is_sprite_mode(&self) -> bool {
        false
    }
}

/// Analyser that observes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnalyser;

impl Analyser for NullAnalyser {
    fn start(&mut self, _domain: Domain) {}
    fn stop(&mut self, _domain: Domain) {}
    fn time_overview(&mut self, _channel: usize, _buffer: &SampleBuffer) {}
    fn update_time_overview(&mut self, _channel: usize, _position: f64) {}
}

/// Per-channel peak overview with a playback cursor
///
/// Each channel is reduced to `bins` absolute peak values. Mono buffers
/// produce an empty overview for channel 1.
#[derive(Debug, Clone)]
pub struct OverviewAnalyser {
    bins: usize,
    sprite_mode: bool,
    running: [bool; 2],
    peaks: [Vec<f32>; 2],
    cursor: [f64; 2],
    duration: f64,
}

impl OverviewAnalyser {
    pub fn new(bins: usize) -> Self {
        Self {
            bins: bins.max(1),
            sprite_mode: false,
            running: [false; 2],
            peaks: [Vec::new(), Vec::new()],
            cursor: [0.0; 2],
            duration: 0.0,
        }
    }

    pub fn with_sprite_mode(mut self, sprite_mode: bool) -> Self {
        self.sprite_mode = sprite_mode;
        self
    }

    pub fn set_sprite_mode(&mut self, sprite_mode: bool) {
        self.sprite_mode = sprite_mode;
    }

    pub fn is_running(&self, domain: Domain) -> bool {
        self.running[domain as usize]
    }

    pub fn peaks(&self, channel: usize) -> &[f32] {
        self.peaks.get(channel).map(Vec::as_slice).unwrap_or_default()
    }

    /// Cursor position in seconds
    pub fn cursor(&self, channel: usize) -> f64 {
        self.cursor.get(channel).copied().unwrap_or_default()
    }

    /// Cursor as a fraction of the buffer duration
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.cursor[0] / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for OverviewAnalyser {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl Analyser for OverviewAnalyser {
    fn start(&mut self, domain: Domain) {
        self.running[domain as usize] = true;
    }

    fn stop(&mut self, domain: Domain) {
        self.running[domain as usize] = false;
    }

    fn time_overview(&mut self, channel: usize, buffer: &SampleBuffer) {
        let Some(slot) = self.peaks.get_mut(channel) else {
            return;
        };
        slot.clear();
        self.duration = buffer.duration();

        let Some(samples) = buffer.channel_data(channel) else {
            return;
        };
        if samples.is_empty() {
            return;
        }

        let chunk = samples.len().div_ceil(self.bins);
        slot.extend(
            samples
                .chunks(chunk)
                .map(|c| c.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))),
        );
    }

    fn update_time_overview(&mut self, channel: usize, position: f64) {
        if let Some(cursor) = self.cursor.get_mut(channel) {
            *cursor = position;
        }
    }

    fn is_sprite_mode(&self) -> bool {
        self.sprite_mode
    }
}
