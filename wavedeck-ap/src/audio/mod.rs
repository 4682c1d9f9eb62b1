//! Audio data, decoding and device output

pub mod buffer;
pub mod decoder;
pub mod output;
pub mod slicer;
pub mod types;

pub use buffer::SampleBuffer;
pub use decoder::{decode_file, Decode, SymphoniaDecoder};
pub use output::AudioOutput;
pub use slicer::{slice, sprite, sprite_from_json, SpriteSet};
pub use types::AudioFrame;
