//! Active playback cycle shared with the renderer
//!
//! Each `start()` creates a new [`ActiveCycle`] and publishes it with a
//! single pointer swap. The buffer and window are fixed for the cycle's
//! life; rate, position and the stopped flag are atomics the two sides
//! exchange without locks. The generation number tags every event the
//! renderer sends back so stale events from a replaced cycle are dropped.

use crate::audio::SampleBuffer;
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wavedeck_common::AtomicF64;

/// Slot the engine publishes cycles into and the renderer reads from
pub type CycleSlot = Arc<ArcSwapOption<ActiveCycle>>;

#[derive(Debug)]
pub struct ActiveCycle {
    pub generation: u64,
    pub buffer: Arc<SampleBuffer>,
    /// Seconds into the buffer where the source starts reading
    pub window_start: f64,
    pub loop_start: f64,
    /// Seconds; position is compared against `floor(loop_end)`
    pub loop_end: f64,
    playback_rate: AtomicF64,
    position: AtomicF64,
    stopped: AtomicBool,
}

impl ActiveCycle {
    pub fn new(
        generation: u64,
        buffer: Arc<SampleBuffer>,
        window_start: f64,
        loop_end: f64,
        playback_rate: f64,
    ) -> Self {
        Self {
            generation,
            buffer,
            window_start,
            loop_start: window_start,
            loop_end,
            playback_rate: AtomicF64::new(playback_rate),
            position: AtomicF64::new(window_start),
            stopped: AtomicBool::new(false),
        }
    }

    /// Position limit the renderer checks against
    pub fn boundary(&self) -> f64 {
        self.loop_end.floor()
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate.load(Ordering::Relaxed)
    }

    pub fn set_playback_rate(&self, rate: f64) {
        self.playback_rate.store(rate, Ordering::Relaxed);
    }

    /// Live position in seconds
    pub fn position(&self) -> f64 {
        self.position.load(Ordering::Acquire)
    }

    pub(crate) fn store_position(&self, position: f64) {
        self.position.store(position, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Freeze the cycle; the renderer plays out the release tail only
    pub fn mark_stopped(&self) {
        self.stopped.store(true, Ordering::Release);
    }
}

pub fn new_slot() -> CycleSlot {
    Arc::new(ArcSwapOption::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(start: f64, end: f64) -> ActiveCycle {
        let buffer = Arc::new(SampleBuffer::silent(100, 2, 500).unwrap());
        ActiveCycle::new(1, buffer, start, end, 1.0)
    }

    #[test]
    fn test_new_cycle_starts_at_window() {
        let c = cycle(1.25, 4.0);
        assert_eq!(c.position(), 1.25);
        assert_eq!(c.loop_start, 1.25);
        assert!(!c.is_stopped());
    }

    #[test]
    fn test_boundary_floors_loop_end() {
        assert_eq!(cycle(0.0, 4.9).boundary(), 4.0);
        assert_eq!(cycle(0.0, 5.0).boundary(), 5.0);
    }

    #[test]
    fn test_slot_swap() {
        let slot = new_slot();
        assert!(slot.load().is_none());

        slot.store(Some(Arc::new(cycle(0.0, 5.0))));
        let seen = slot.load_full().unwrap();
        seen.mark_stopped();
        seen.set_playback_rate(2.0);

        let again = slot.load_full().unwrap();
        assert!(again.is_stopped());
        assert_eq!(again.playback_rate(), 2.0);
    }
}
