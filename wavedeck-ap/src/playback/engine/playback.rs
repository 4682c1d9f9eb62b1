//! Transport control - start, stop, end, toggle and loop transitions
//!
//! `start()` on a paused engine publishes a fresh [`ActiveCycle`]; the
//! renderer picks it up at its next block. `stop()` marks the cycle stopped
//! and schedules the release, so the tail keeps sounding until the ramp
//! reaches zero. Every call that does not apply in the current state is a
//! logged no-op.

use super::core::PlaybackEngine;
use crate::playback::analyser::Domain;
use crate::playback::clock::Clock;
use crate::playback::cycle::ActiveCycle;
use crate::playback::events::{EngineEvent, ProcessorCommand};
use crate::playback::renderer::BlockProcessor;
use ringbuf::traits::Producer;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the renderer should run for a new cycle
enum ProcessorChoice {
    /// Leave the renderer's processor as it is
    Keep,
    /// Built-in transform-and-advance
    Default,
    Install(Box<dyn BlockProcessor>),
}

/// Resolve the `[start, end)` window for a start request
///
/// An end past the buffer is clamped to `duration`; a missing, negative or
/// NaN end means "until the end of the buffer". A start outside
/// `[0, end]` falls back to 0.
pub(super) fn resolve_window(start: f64, end: Option<f64>, duration: f64) -> (f64, f64) {
    let end = match end {
        Some(end) if end >= 0.0 => end.min(duration),
        _ => duration,
    };
    let start = if (0.0..=end).contains(&start) { start } else { 0.0 };
    (start, end)
}

impl PlaybackEngine {
    /// Start playing `[start, end)` seconds of the loaded buffer
    ///
    /// No-op without a buffer or while already playing. The renderer keeps
    /// the built-in processor (or returns to it after a custom one).
    pub fn start(&mut self, start: f64, end: Option<f64>) {
        self.begin(start, end, ProcessorChoice::Default);
    }

    /// Like [`start`](Self::start), with `processor` rendering every block
    /// of this cycle and of its loop restarts
    pub fn start_with(&mut self, start: f64, end: Option<f64>, processor: Box<dyn BlockProcessor>) {
        self.begin(start, end, ProcessorChoice::Install(processor));
    }

    /// Stop playing and remember the position for the next start
    ///
    /// The release ramp starts now; the renderer plays the tail out and
    /// then goes silent. No-op without a buffer or while paused.
    pub fn stop(&mut self) {
        if self.buffer.is_none() {
            debug!("stop() ignored: no buffer loaded");
            return;
        }
        if self.paused {
            debug!("stop() ignored: already paused");
            return;
        }

        let now = self.clock.now();
        self.envelope.schedule_stop(now, true);

        if let Some(cycle) = &self.current {
            self.position = cycle.position().clamp(0.0, self.duration());
            cycle.mark_stopped();
        }

        self.analyser.stop(Domain::Time);
        self.analyser.stop(Domain::Fft);
        self.paused = true;

        info!("Stopped at {:.3}s", self.position);
        self.notifications.fire(&EngineEvent::Stop {
            position: self.position,
        });
    }

    /// Stop, rewind to 0 and fire `ended`
    pub fn end(&mut self) {
        self.stop();
        self.position = 0.0;

        info!("Ended");
        self.notifications.fire(&EngineEvent::Ended { position: 0.0 });
    }

    /// Start if paused, stop otherwise
    pub fn toggle(&mut self, start: f64, end: Option<f64>) {
        if self.paused {
            self.start(start, end);
        } else {
            self.stop();
        }
    }

    /// Resume from the stored position until the end of the buffer
    pub fn resume(&mut self) {
        self.start(self.position, None);
    }

    pub fn is_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    /// A cycle has been started at least once
    ///
    /// Stays true across a later [`ready`](Self::ready); the next start
    /// plays the new buffer.
    pub fn is_source(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Loop or end after the renderer reached the window boundary
    pub(super) fn on_boundary(&mut self) {
        if !self.looping {
            self.end();
            return;
        }

        let (start, end) = if self.analyser.is_sprite_mode() {
            (self.loop_start, self.loop_end)
        } else {
            (0.0, self.duration())
        };

        info!("Loop restart at {:.3}s", start);
        self.stop();
        self.begin(start, Some(end), ProcessorChoice::Keep);
    }

    fn begin(&mut self, start: f64, end: Option<f64>, processor: ProcessorChoice) {
        let Some(buffer) = self.buffer.clone() else {
            debug!("start() ignored: no buffer loaded");
            return;
        };
        if !self.paused {
            debug!("start() ignored: already playing");
            return;
        }

        let (window_start, window_end) = resolve_window(start, end, buffer.duration());

        match processor {
            ProcessorChoice::Keep => {}
            ProcessorChoice::Default => {
                if self.custom_processor {
                    self.send_command(ProcessorCommand::UseDefault);
                    self.custom_processor = false;
                }
            }
            ProcessorChoice::Install(processor) => {
                self.send_command(ProcessorCommand::Install(processor));
                self.custom_processor = true;
            }
        }

        self.generation += 1;
        self.position = window_start;
        self.loop_start = window_start;
        self.loop_end = window_end;

        // Schedule before publishing so the first block of the new cycle
        // already sees the attack.
        let now = self.clock.now();
        self.envelope.schedule_start(now);
        self.envelope
            .schedule_stop(now + (window_end - window_start) / self.playback_rate, true);

        let cycle = Arc::new(ActiveCycle::new(
            self.generation,
            buffer,
            window_start,
            window_end,
            self.playback_rate,
        ));
        self.cycles.store(Some(Arc::clone(&cycle)));
        self.previous = self.current.replace(cycle);

        self.analyser.start(Domain::Time);
        self.analyser.start(Domain::Fft);
        self.paused = false;

        info!(
            "Started [{:.3}s, {:.3}s) at rate {}",
            window_start, window_end, self.playback_rate
        );
        self.notifications.fire(&EngineEvent::Start {
            position: window_start,
        });
    }

    fn send_command(&mut self, command: ProcessorCommand) {
        if self.commands.try_push(command).is_err() {
            warn!("Processor command ring full; renderer not consuming");
        }
    }
}
