//! Core playback engine - state, loading and event pump
//!
//! **Responsibilities:**
//! - PlaybackEngine struct definition and initialization
//! - Buffer loading (`ready`, `ready_buffer`, `settle`)
//! - Draining renderer events (`pump`) into notifications and transitions
//! - Buffer slicing helpers that require a loaded buffer

use super::{COMMAND_RING_CAPACITY, EVENT_RING_CAPACITY};
use crate::audio::{slicer, Decode, SampleBuffer, SpriteSet, SymphoniaDecoder};
use crate::error::{Error, Result};
use crate::playback::analyser::{Analyser, NullAnalyser};
use crate::playback::clock::FrameClock;
use crate::playback::cycle::{new_slot, ActiveCycle, CycleSlot};
use crate::playback::envelope::{EnvelopeController, EnvelopeParams};
use crate::playback::events::{
    Callback, Callbacks, EngineEvent, Notifications, ProcessorCommand, RenderEvent,
};
use crate::playback::renderer::{Renderer, RendererParts};
use crate::playback::vocal_canceler::VocalCanceler;
use ringbuf::traits::{Consumer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};
use wavedeck_common::config::PlayerConfig;

/// Single-track playback engine
///
/// Owns the loaded buffer, the transport state and the parameter set. The
/// paired [`Renderer`] (see [`PlaybackEngine::take_renderer`]) produces the
/// audio; the engine learns about its progress only through [`pump`].
///
/// [`pump`]: PlaybackEngine::pump
pub struct PlaybackEngine {
    pub(super) default_sample_rate: u32,
    pub(super) clock: FrameClock,
    pub(super) buffer: Option<Arc<SampleBuffer>>,

    /// Resume position while paused
    pub(super) position: f64,
    pub(super) paused: bool,
    pub(super) looping: bool,
    pub(super) playback_rate: f64,

    /// Window of the current (or last) cycle
    pub(super) loop_start: f64,
    pub(super) loop_end: f64,

    pub(super) generation: u64,
    pub(super) cycles: CycleSlot,
    pub(super) current: Option<Arc<ActiveCycle>>,
    /// Last replaced cycle, kept so its final drop happens here and not on
    /// the audio thread
    pub(super) previous: Option<Arc<ActiveCycle>>,
    /// A caller-supplied block processor is installed in the renderer
    pub(super) custom_processor: bool,

    pub(super) envelope: EnvelopeController,
    pub(super) canceler: Arc<VocalCanceler>,
    pub(super) analyser: Box<dyn Analyser>,
    pub(super) notifications: Notifications,

    pub(super) events: HeapCons<RenderEvent>,
    pub(super) commands: HeapProd<ProcessorCommand>,
    pub(super) renderer: Option<Renderer>,

    pub(super) decoder: Arc<dyn Decode>,
    pub(super) decode_tx: mpsc::UnboundedSender<Result<SampleBuffer>>,
    pub(super) decode_rx: mpsc::UnboundedReceiver<Result<SampleBuffer>>,
    pub(super) pending_decodes: usize,
}

impl PlaybackEngine {
    /// Create an idle engine and its renderer
    ///
    /// Runtime parameters (rate, loop, depth, envelope) start from the
    /// config's defaults.
    pub fn new(config: &PlayerConfig) -> Self {
        let clock = FrameClock::new();
        let cycles = new_slot();
        let envelope = EnvelopeController::new(EnvelopeParams::from(config.envelope));
        let canceler = Arc::new(VocalCanceler::new(config.vocal_canceler.depth));

        let (event_tx, event_rx) = HeapRb::<RenderEvent>::new(EVENT_RING_CAPACITY).split();
        let (command_tx, command_rx) =
            HeapRb::<ProcessorCommand>::new(COMMAND_RING_CAPACITY).split();

        let renderer = Renderer::new(RendererParts {
            cycles: Arc::clone(&cycles),
            schedule: envelope.shared(),
            canceler: Arc::clone(&canceler),
            clock: clock.clone(),
            events: event_tx,
            commands: command_rx,
            block_size: config.output.block_size,
            output_sample_rate: config.output.default_sample_rate,
        });

        let (decode_tx, decode_rx) = mpsc::unbounded_channel();

        debug!(
            "Engine created: block_size={}, default_sample_rate={}",
            config.output.block_size, config.output.default_sample_rate
        );

        Self {
            default_sample_rate: config.output.default_sample_rate,
            clock,
            buffer: None,
            position: 0.0,
            paused: true,
            looping: config.playback.looping,
            playback_rate: config.playback.playback_rate,
            loop_start: 0.0,
            loop_end: 0.0,
            generation: 0,
            cycles,
            current: None,
            previous: None,
            custom_processor: false,
            envelope,
            canceler,
            analyser: Box::new(NullAnalyser),
            notifications: Notifications::new(),
            events: event_rx,
            commands: command_tx,
            renderer: Some(renderer),
            decoder: Arc::new(SymphoniaDecoder::new()),
            decode_tx,
            decode_rx,
            pending_decodes: 0,
        }
    }

    /// Replace the decoder used by [`ready`](Self::ready)
    pub fn with_decoder(mut self, decoder: Arc<dyn Decode>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Replace the analysis observer
    pub fn with_analyser(mut self, analyser: Box<dyn Analyser>) -> Self {
        self.analyser = analyser;
        self
    }

    /// Hand the renderer to the audio output
    ///
    /// Returns `None` after the first call.
    pub fn take_renderer(&mut self) -> Option<Renderer> {
        self.renderer.take()
    }

    /// Device clock shared with the renderer
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn analyser(&self) -> &dyn Analyser {
        self.analyser.as_ref()
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Register one callback by (case- and hyphen-insensitive) name
    ///
    /// Returns false for unknown names.
    pub fn setup(&mut self, name: &str, callback: Callback) -> bool {
        self.notifications.setup(name, callback)
    }

    /// Register several callbacks at once
    pub fn setup_callbacks(&mut self, callbacks: Callbacks) {
        self.notifications.apply(callbacks);
    }

    /// Receive every notification except per-frame updates
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.notifications.subscribe()
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Decode `bytes` and install the result as the current buffer
    ///
    /// The `decode` notification fires immediately. Inside a tokio runtime
    /// decoding runs on the blocking pool and the buffer is installed by a
    /// later [`pump`](Self::pump) or [`settle`](Self::settle); outside one
    /// it runs inline and is installed on the next pump.
    pub fn ready(&mut self, bytes: Vec<u8>) {
        self.notifications.fire(&EngineEvent::Decode { bytes: bytes.len() });
        debug!("Decoding {} bytes", bytes.len());

        let decoder = Arc::clone(&self.decoder);
        let tx = self.decode_tx.clone();
        self.pending_decodes += 1;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || {
                    let _ = tx.send(decoder.decode(bytes));
                });
            }
            Err(_) => {
                let _ = tx.send(decoder.decode(bytes));
            }
        }
    }

    /// Wait until every pending decode has been applied
    ///
    /// Returns the last decode error, if any. Errors have already been
    /// reported through the `error` notification.
    pub async fn settle(&mut self) -> Result<()> {
        let mut outcome = Ok(());
        while self.pending_decodes > 0 {
            let Some(result) = self.decode_rx.recv().await else {
                break;
            };
            self.pending_decodes -= 1;
            if let Err(e) = self.apply_decode(result) {
                outcome = Err(e);
            }
        }
        outcome
    }

    /// Install an already decoded buffer
    ///
    /// A playing cycle keeps the buffer it started with; the new buffer is
    /// used from the next `start()`.
    pub fn ready_buffer(&mut self, buffer: impl Into<Arc<SampleBuffer>>) -> Arc<SampleBuffer> {
        let buffer: Arc<SampleBuffer> = buffer.into();

        self.analyser.time_overview(0, &buffer);
        self.analyser.time_overview(1, &buffer);

        let duration = buffer.duration();
        if self.paused {
            self.loop_start = 0.0;
            self.loop_end = duration;
            self.position = self.position.clamp(0.0, duration);
        }

        self.buffer = Some(Arc::clone(&buffer));

        info!(
            "Buffer ready: {:.3}s, {} Hz, {} channel(s)",
            duration,
            buffer.sample_rate(),
            buffer.number_of_channels()
        );
        self.notifications.fire(&EngineEvent::Ready {
            buffer: Arc::clone(&buffer),
        });

        buffer
    }

    fn apply_decode(&mut self, result: Result<SampleBuffer>) -> Result<()> {
        match result {
            Ok(buffer) => {
                self.ready_buffer(buffer);
                Ok(())
            }
            Err(e) => {
                error!("Decode failed: {}", e);
                self.notifications.fire(&EngineEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    // ========================================================================
    // Event pump
    // ========================================================================

    /// Apply finished decodes and drain renderer events
    ///
    /// Call this regularly from the control thread. Per-frame `update`
    /// notifications, loop restarts and `ended` are all delivered from here.
    ///
    /// The renderer goes silent once a cycle reaches its window boundary and
    /// stays silent until the next `pump()` restarts or ends it, so the gap
    /// at a loop point is up to one pump interval. Pump at least once per
    /// output block (the CLI pumps every 10 ms) for a seamless loop.
    pub fn pump(&mut self) {
        while let Ok(result) = self.decode_rx.try_recv() {
            self.pending_decodes = self.pending_decodes.saturating_sub(1);
            let _ = self.apply_decode(result);
        }

        while let Some(event) = self.events.try_pop() {
            match event {
                RenderEvent::Progress {
                    generation,
                    start_position,
                    step,
                    frames,
                } => {
                    if generation != self.generation || self.paused {
                        continue;
                    }
                    // The renderer has moved on to the current cycle
                    self.previous = None;

                    for k in 1..=frames {
                        let position = start_position + k as f64 * step;
                        self.notifications.fire(&EngineEvent::Update { position });
                    }

                    let position = start_position + frames as f64 * step;
                    self.analyser.update_time_overview(0, position);
                    self.analyser.update_time_overview(1, position);
                }
                RenderEvent::Boundary { generation } => {
                    if generation != self.generation || self.paused {
                        continue;
                    }
                    self.on_boundary();
                }
                RenderEvent::Retired(processor) => drop(processor),
            }
        }
    }

    // ========================================================================
    // Buffer helpers
    // ========================================================================

    pub fn buffer(&self) -> Option<&Arc<SampleBuffer>> {
        self.buffer.as_ref()
    }

    /// Copy `[start, end)` seconds of the loaded buffer
    pub fn slice(&self, start: f64, end: f64) -> Result<SampleBuffer> {
        let buffer = self.loaded()?;
        slicer::slice(buffer, start, end)
    }

    /// Slice named ranges of the loaded buffer; malformed ranges are skipped
    pub fn sprite<'a, I>(&self, ranges: I) -> Result<SpriteSet>
    where
        I: IntoIterator<Item = (&'a str, &'a [f64])>,
    {
        let buffer = self.loaded()?;
        slicer::sprite(buffer, ranges)
    }

    /// Slice named ranges given as a JSON object of `name: [start, end]`
    pub fn sprite_from_json(&self, ranges: &serde_json::Value) -> Result<SpriteSet> {
        let buffer = self.loaded()?;
        slicer::sprite_from_json(buffer, ranges)
    }

    pub(super) fn loaded(&self) -> Result<&SampleBuffer> {
        match self.buffer.as_deref() {
            Some(buffer) => Ok(buffer),
            None => {
                debug!("No buffer loaded");
                Err(Error::NoBufferLoaded)
            }
        }
    }
}
