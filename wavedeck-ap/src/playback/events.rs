//! Engine notifications and renderer → engine messages
//!
//! Two kinds of events live here:
//! - [`EngineEvent`]: user-facing notifications (`decode`, `ready`, `start`,
//!   `stop`, `update`, `ended`, `error`) delivered to registered callbacks
//!   and, except for `update`, broadcast to subscribers
//! - [`RenderEvent`]: internal messages the renderer pushes over the SPSC
//!   ring, drained by `PlaybackEngine::pump`

use crate::audio::SampleBuffer;
use crate::playback::renderer::BlockProcessor;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;
use wavedeck_common::params::normalize_key;

/// Notification delivered to callbacks
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Raw bytes accepted for decoding
    Decode { bytes: usize },
    /// Buffer decoded and installed
    Ready { buffer: Arc<SampleBuffer> },
    /// Cycle started at `position` seconds
    Start { position: f64 },
    /// Cycle stopped; `position` is where the next start resumes
    Stop { position: f64 },
    /// Position advanced by one frame
    Update { position: f64 },
    /// Window finished without looping; position reset
    Ended { position: f64 },
    /// Decoding failed
    Error { message: String },
}

impl EngineEvent {
    pub fn key(&self) -> NotificationKey {
        match self {
            EngineEvent::Decode { .. } => NotificationKey::Decode,
            EngineEvent::Ready { .. } => NotificationKey::Ready,
            EngineEvent::Start { .. } => NotificationKey::Start,
            EngineEvent::Stop { .. } => NotificationKey::Stop,
            EngineEvent::Update { .. } => NotificationKey::Update,
            EngineEvent::Ended { .. } => NotificationKey::Ended,
            EngineEvent::Error { .. } => NotificationKey::Error,
        }
    }

    /// Position carried by the event, if any
    pub fn position(&self) -> Option<f64> {
        match self {
            EngineEvent::Start { position }
            | EngineEvent::Stop { position }
            | EngineEvent::Update { position }
            | EngineEvent::Ended { position } => Some(*position),
            _ => None,
        }
    }
}

/// Notification names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKey {
    Decode,
    Ready,
    Start,
    Stop,
    Update,
    Ended,
    Error,
}

impl NotificationKey {
    const ALL: [NotificationKey; 7] = [
        NotificationKey::Decode,
        NotificationKey::Ready,
        NotificationKey::Start,
        NotificationKey::Stop,
        NotificationKey::Update,
        NotificationKey::Ended,
        NotificationKey::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKey::Decode => "decode",
            NotificationKey::Ready => "ready",
            NotificationKey::Start => "start",
            NotificationKey::Stop => "stop",
            NotificationKey::Update => "update",
            NotificationKey::Ended => "ended",
            NotificationKey::Error => "error",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for NotificationKey {
    type Err = wavedeck_common::Error;

    /// Case-insensitive, hyphens ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s);
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == key)
            .ok_or_else(|| wavedeck_common::Error::InvalidInput(format!("unknown notification: {}", s)))
    }
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification callback
pub type Callback = Box<dyn FnMut(&EngineEvent) + Send>;

/// Bulk callback configuration; `None` fields leave the slot untouched
#[derive(Default)]
pub struct Callbacks {
    pub decode: Option<Callback>,
    pub ready: Option<Callback>,
    pub start: Option<Callback>,
    pub stop: Option<Callback>,
    pub update: Option<Callback>,
    pub ended: Option<Callback>,
    pub error: Option<Callback>,
}

/// Callback registry plus broadcast channel
///
/// Unset callbacks are no-ops.
pub struct Notifications {
    callbacks: [Option<Callback>; 7],
    event_tx: broadcast::Sender<EngineEvent>,
}

impl Default for Notifications {
    fn default() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            callbacks: Default::default(),
            event_tx,
        }
    }
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: NotificationKey, callback: Callback) {
        self.callbacks[key.index()] = Some(callback);
    }

    /// Register a callback by name
    ///
    /// Returns false, registering nothing, for unrecognized names.
    pub fn setup(&mut self, name: &str, callback: Callback) -> bool {
        match name.parse::<NotificationKey>() {
            Ok(key) => {
                self.set(key, callback);
                true
            }
            Err(_) => {
                debug!("Ignoring unknown notification '{}'", name);
                false
            }
        }
    }

    /// Install every callback set in `callbacks`
    pub fn apply(&mut self, callbacks: Callbacks) {
        let Callbacks { decode, ready, start, stop, update, ended, error } = callbacks;
        let slots = [
            (NotificationKey::Decode, decode),
            (NotificationKey::Ready, ready),
            (NotificationKey::Start, start),
            (NotificationKey::Stop, stop),
            (NotificationKey::Update, update),
            (NotificationKey::Ended, ended),
            (NotificationKey::Error, error),
        ];
        for (key, callback) in slots {
            if let Some(callback) = callback {
                self.set(key, callback);
            }
        }
    }

    /// Invoke the callback for `event` and broadcast it
    ///
    /// `update` is not broadcast; it fires once per rendered frame.
    pub fn fire(&mut self, event: &EngineEvent) {
        let key = event.key();
        if let Some(callback) = self.callbacks[key.index()].as_mut() {
            callback(event);
        }
        if key != NotificationKey::Update && self.event_tx.receiver_count() > 0 {
            let _ = self.event_tx.send(event.clone());
        }
    }

    /// Receive every notification except `update`
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }
}

/// Renderer → engine message
pub enum RenderEvent {
    /// Frames advanced during one block
    ///
    /// Positions after each frame are `start_position + k × step` for
    /// `k` in `1..=frames`.
    Progress {
        generation: u64,
        start_position: f64,
        step: f64,
        frames: usize,
    },
    /// Position reached the cycle's boundary
    Boundary { generation: u64 },
    /// Replaced processor, to be dropped off the audio thread
    Retired(Box<dyn BlockProcessor>),
}

impl fmt::Debug for RenderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderEvent::Progress { generation, start_position, step, frames } => f
                .debug_struct("Progress")
                .field("generation", generation)
                .field("start_position", start_position)
                .field("step", step)
                .field("frames", frames)
                .finish(),
            RenderEvent::Boundary { generation } => {
                f.debug_struct("Boundary").field("generation", generation).finish()
            }
            RenderEvent::Retired(_) => f.write_str("Retired(..)"),
        }
    }
}

/// Engine → renderer processor selection
pub enum ProcessorCommand {
    /// Use this processor from the next block on
    Install(Box<dyn BlockProcessor>),
    /// Return to the built-in transform-and-advance processor
    UseDefault,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<EngineEvent>>>, Callback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, Box::new(move |e: &EngineEvent| sink.lock().unwrap().push(e.clone())))
    }

    #[test]
    fn test_keys_ignore_case_and_hyphens() {
        assert_eq!("Ended".parse::<NotificationKey>().unwrap(), NotificationKey::Ended);
        assert_eq!("UP-DATE".parse::<NotificationKey>().unwrap(), NotificationKey::Update);
        assert!("finished".parse::<NotificationKey>().is_err());
    }

    #[test]
    fn test_index_matches_declaration_order() {
        for (i, key) in NotificationKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
    }

    #[test]
    fn test_unset_callbacks_are_noops() {
        let mut notifications = Notifications::new();
        notifications.fire(&EngineEvent::Start { position: 0.0 });
    }

    #[test]
    fn test_setup_by_name() {
        let mut notifications = Notifications::new();
        let (seen, callback) = recorder();
        assert!(notifications.setup("Stop", callback));

        notifications.fire(&EngineEvent::Start { position: 1.0 });
        notifications.fire(&EngineEvent::Stop { position: 2.0 });

        assert_eq!(*seen.lock().unwrap(), vec![EngineEvent::Stop { position: 2.0 }]);
    }

    #[test]
    fn test_setup_unknown_name_is_ignored() {
        let mut notifications = Notifications::new();
        let (_, callback) = recorder();
        assert!(!notifications.setup("progress", callback));
    }

    #[test]
    fn test_apply_bulk_keeps_unset_slots() {
        let mut notifications = Notifications::new();
        let (seen_start, start) = recorder();
        notifications.set(NotificationKey::Start, start);

        let (seen_ended, ended) = recorder();
        notifications.apply(Callbacks { ended: Some(ended), ..Default::default() });

        notifications.fire(&EngineEvent::Start { position: 0.0 });
        notifications.fire(&EngineEvent::Ended { position: 0.0 });
        assert_eq!(seen_start.lock().unwrap().len(), 1);
        assert_eq!(seen_ended.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_broadcast_skips_updates() {
        let mut notifications = Notifications::new();
        let mut rx = notifications.subscribe();

        notifications.fire(&EngineEvent::Update { position: 0.1 });
        notifications.fire(&EngineEvent::Ended { position: 0.0 });

        assert_eq!(rx.try_recv().unwrap(), EngineEvent::Ended { position: 0.0 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_positions() {
        assert_eq!(EngineEvent::Update { position: 1.5 }.position(), Some(1.5));
        assert_eq!(EngineEvent::Decode { bytes: 3 }.position(), None);
    }
}
