//! Playback engine, real-time renderer and their shared state

pub mod analyser;
pub mod clock;
pub mod cycle;
pub mod engine;
pub mod envelope;
pub mod events;
pub mod renderer;
pub mod vocal_canceler;

pub use analyser::{Analyser, Domain, NullAnalyser, OverviewAnalyser};
pub use clock::{Clock, FrameClock};
pub use engine::PlaybackEngine;
pub use envelope::{EnvelopeController, EnvelopeParams, GainSchedule};
pub use events::{Callback, Callbacks, EngineEvent, NotificationKey};
pub use renderer::{BlockContext, BlockProcessor, Renderer};
pub use vocal_canceler::VocalCanceler;
