//! Device clock
//!
//! Envelope automation and scheduled stop times are absolute times on the
//! output device's clock: frames rendered divided by the output sample
//! rate. Only the renderer advances it.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use wavedeck_common::AtomicF64;

/// Monotonic time source in seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Clock advanced by rendered frames
///
/// Cloning shares the underlying time; the renderer holds the writing
/// clone and the engine reads through its own.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    seconds: Arc<AtomicF64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `frames` at `sample_rate`
    pub fn advance_frames(&self, frames: usize, sample_rate: u32) {
        if sample_rate > 0 {
            self.advance(frames as f64 / sample_rate as f64);
        }
    }

    /// Advance by `seconds`
    ///
    /// Single writer: load and store need no read-modify-write.
    pub fn advance(&self, seconds: f64) {
        let now = self.seconds.load(Ordering::Acquire);
        self.seconds.store(now + seconds, Ordering::Release);
    }
}

impl Clock for FrameClock {
    fn now(&self) -> f64 {
        self.seconds.load(Ordering::Acquire)
    }
}
