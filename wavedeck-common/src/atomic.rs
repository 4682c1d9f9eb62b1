//! Lock-free float cells
//!
//! Floats stored as their bit pattern in an atomic integer. Used for
//! parameters the control side writes and the audio callback reads
//! every block without taking a lock.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.0.load(order))
    }

    #[inline]
    pub fn store(&self, value: f32, order: Ordering) {
        self.0.store(value.to_bits(), order);
    }
}

#[derive(Debug, Default)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self, order: Ordering) -> f64 {
        f64::from_bits(self.0.load(order))
    }

    #[inline]
    pub fn store(&self, value: f64, order: Ordering) {
        self.0.store(value.to_bits(), order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_store_and_load() {
        let cell = AtomicF32::new(0.25);
        assert_eq!(cell.load(Ordering::Relaxed), 0.25);
        cell.store(-1.5, Ordering::Relaxed);
        assert_eq!(cell.load(Ordering::Relaxed), -1.5);

        let wide = AtomicF64::new(1e-12);
        assert_eq!(wide.load(Ordering::Acquire), 1e-12);
    }

    #[test]
    fn test_default_is_zero() {
        assert_eq!(AtomicF32::default().load(Ordering::Relaxed), 0.0);
        assert_eq!(AtomicF64::default().load(Ordering::Relaxed), 0.0);
    }

    #[test]
    fn test_visible_across_threads() {
        let cell = Arc::new(AtomicF64::new(0.0));
        let writer = Arc::clone(&cell);
        std::thread::spawn(move || writer.store(42.5, Ordering::Release))
            .join()
            .unwrap();
        assert_eq!(cell.load(Ordering::Acquire), 42.5);
    }
}
