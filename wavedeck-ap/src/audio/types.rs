//! Core audio frame type

/// One stereo sample instant
///
/// The engine renders stereo internally; mono buffers are up-mixed with
/// the same value on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioFrame {
    pub left: f32,
    pub right: f32,
}

impl AudioFrame {
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Silent frame
    pub const fn zero() -> Self {
        Self { left: 0.0, right: 0.0 }
    }

    /// Same sample on both sides
    pub const fn mono(sample: f32) -> Self {
        Self { left: sample, right: sample }
    }

    /// Average of both sides, for mono output devices
    pub fn downmix(self) -> f32 {
        0.5 * (self.left + self.right)
    }

    /// Linear blend toward `next` by `frac` (0.0 = self, 1.0 = next)
    pub fn lerp(self, next: AudioFrame, frac: f32) -> Self {
        Self {
            left: self.left + (next.left - self.left) * frac,
            right: self.right + (next.right - self.right) * frac,
        }
    }
}
