//! Test helper modules for wavedeck-ap integration tests
//!
//! - `wav`: deterministic WAV fixtures written with hound
//! - engine setup with a block size and output rate that keep positions
//!   exact in binary floating point

#![allow(dead_code)]

pub mod wav;

pub use wav::{write_constant_wav, write_ramp_wav, write_sine_wav, WavFixture};

use wavedeck_ap::Renderer;
use wavedeck_common::config::PlayerConfig;

/// Output rate used by engine tests (a power of two, so `1 / RATE` is exact)
pub const RATE: u32 = 1024;

/// Frames per rendered block
pub const BLOCK: usize = 128;

/// Config with test block size and output rate, instant attack and release
pub fn test_config() -> PlayerConfig {
    let mut config = PlayerConfig::default();
    config.output.block_size = BLOCK;
    config.output.default_sample_rate = RATE;
    config.envelope.attack = 0.0;
    config.envelope.release = 0.0;
    config
}

/// Render `blocks` blocks and collect the stereo output
pub fn render(renderer: &mut Renderer, blocks: usize) -> (Vec<f32>, Vec<f32>) {
    let mut left = Vec::with_capacity(blocks * renderer.block_size());
    let mut right = Vec::with_capacity(blocks * renderer.block_size());
    for _ in 0..blocks {
        let (l, r) = renderer.render_next_block();
        left.extend_from_slice(l);
        right.extend_from_slice(r);
    }
    (left, right)
}
