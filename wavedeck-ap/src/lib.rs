//! # wavedeck Audio Player Library (wavedeck-ap)
//!
//! Single-track playback engine: decode a clip into memory, slice it into
//! sprites, and play any window of it with an attack/release envelope,
//! variable playback rate, looping and a vocal canceler.
//!
//! **Architecture:** symphonia decoding, a control-side [`PlaybackEngine`]
//! and a real-time [`Renderer`] owned by the cpal output callback. The two
//! sides share state through `arc-swap` handles and atomics and exchange
//! messages over `ringbuf` SPSC rings.

pub mod audio;
pub mod error;
pub mod playback;

pub use audio::{slice, sprite, AudioOutput, Decode, SampleBuffer, SymphoniaDecoder};
pub use error::{Error, Result};
pub use playback::{EngineEvent, PlaybackEngine, Renderer};
