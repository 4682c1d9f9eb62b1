//! Vocal canceler
//!
//! Subtracts a scaled copy of the opposite channel from each channel,
//! suppressing content panned to the center of the stereo image.

use std::sync::atomic::Ordering;
use wavedeck_common::params::ParamKey;
use wavedeck_common::AtomicF32;

/// Cross-channel subtraction of `depth` × other
///
/// `depth` is written by the control side and read lock-free by the
/// renderer once per block.
#[derive(Debug, Default)]
pub struct VocalCanceler {
    depth: AtomicF32,
}

impl VocalCanceler {
    pub fn new(depth: f32) -> Self {
        let canceler = Self::default();
        canceler.set_depth(depth);
        canceler
    }

    pub fn depth(&self) -> f32 {
        self.depth.load(Ordering::Relaxed)
    }

    /// Set depth, clamped to 0.0..=1.0; NaN is ignored
    pub fn set_depth(&self, depth: f32) {
        if let Ok(depth) = ParamKey::VocalCancelerDepth.metadata().check(depth as f64) {
            self.depth.store(depth as f32, Ordering::Relaxed);
        }
    }

    /// `main - depth × other` at the current depth
    #[inline]
    pub fn process(&self, main: f32, other: f32) -> f32 {
        cancel(main, other, self.depth())
    }
}

/// `main - depth × other`
#[inline]
pub fn cancel(main: f32, other: f32, depth: f32) -> f32 {
    main - depth * other
}

/// Both output channels of one frame, each computed from the original pair
#[inline]
pub fn cancel_frame(left: f32, right: f32, depth: f32) -> (f32, f32) {
    (cancel(left, right, depth), cancel(right, left, depth))
}
