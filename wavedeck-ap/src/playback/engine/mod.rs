//! Playback engine
//!
//! **Module Structure:**
//! - `core.rs`: struct definition, construction, buffer loading, event pump
//! - `playback.rs`: transport (start, stop, end, toggle) and loop transitions
//! - `params.rs`: key/value parameter surface and typed accessors
//!
//! The engine is the control-side half. It never renders audio itself: it
//! publishes an [`ActiveCycle`](crate::playback::cycle::ActiveCycle) per
//! `start()` and reacts to the [`RenderEvent`](crate::playback::events::RenderEvent)s
//! the [`Renderer`](crate::playback::renderer::Renderer) sends back.

mod core;
mod params;
mod playback;

pub use core::PlaybackEngine;

/// Capacity of the renderer → engine event ring
///
/// At the smallest block size one `pump()` every 10 ms sees a handful of
/// events per block; this leaves room for stalls of several seconds.
pub const EVENT_RING_CAPACITY: usize = 1024;

/// Capacity of the engine → renderer processor command ring
pub const COMMAND_RING_CAPACITY: usize = 16;
