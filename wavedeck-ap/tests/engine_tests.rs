//! Integration tests for PlaybackEngine
//!
//! Each test decodes a generated WAV through the real decoder, then drives
//! the renderer block by block the way the output callback would, pumping
//! the engine in between.
//!
//! Fixtures use a 1024 Hz sample rate and 128-frame blocks so every
//! position the renderer reports is exact.

mod helpers;

use helpers::{render, test_config, write_constant_wav, write_ramp_wav, write_sine_wav, BLOCK, RATE};
use std::sync::{Arc, Mutex};
use wavedeck_ap::playback::{Clock, NotificationKey, OverviewAnalyser};
use wavedeck_ap::{EngineEvent, PlaybackEngine, Renderer};
use wavedeck_common::config::PlayerConfig;

/// Decode `bytes` into a fresh engine and take its renderer
async fn loaded(config: &PlayerConfig, bytes: Vec<u8>) -> (PlaybackEngine, Renderer) {
    load_into(PlaybackEngine::new(config), bytes).await
}

async fn load_into(mut engine: PlaybackEngine, bytes: Vec<u8>) -> (PlaybackEngine, Renderer) {
    let renderer = engine.take_renderer().unwrap();
    engine.ready(bytes);
    engine.settle().await.unwrap();
    (engine, renderer)
}

fn record(engine: &mut PlaybackEngine, name: &str) -> Arc<Mutex<Vec<EngineEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    assert!(engine.setup(
        name,
        Box::new(move |event| sink.lock().unwrap().push(event.clone()))
    ));
    events
}

fn block_seconds() -> f64 {
    BLOCK as f64 / RATE as f64
}

// ============================================================================
// Loading and notifications
// ============================================================================

#[tokio::test]
async fn test_decode_ready_start_update_sequence() {
    let fixture = write_ramp_wav(RATE, 2.0);
    let mut engine = PlaybackEngine::new(&test_config());
    let mut renderer = engine.take_renderer().unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    for name in ["decode", "ready", "start", "update"] {
        let sink = Arc::clone(&order);
        engine.setup(
            name,
            Box::new(move |event| {
                let mut order = sink.lock().unwrap();
                // Collapse consecutive updates
                if order.last() != Some(&event.key()) {
                    order.push(event.key());
                }
            }),
        );
    }

    engine.ready(fixture.bytes());
    engine.settle().await.unwrap();
    assert!(engine.is_buffer());
    assert_eq!(engine.duration(), 2.0);
    assert_eq!(engine.sample_rate(), RATE);
    assert_eq!(engine.channels(), 2);

    engine.start(0.0, None);
    render(&mut renderer, 2);
    engine.pump();

    assert_eq!(
        *order.lock().unwrap(),
        vec![
            NotificationKey::Decode,
            NotificationKey::Ready,
            NotificationKey::Start,
            NotificationKey::Update,
        ]
    );
    assert_eq!(engine.current_time(), 2.0 * block_seconds());
}

#[tokio::test]
async fn test_decode_failure_fires_error() {
    let mut engine = PlaybackEngine::new(&test_config());
    let errors = record(&mut engine, "error");

    engine.ready(b"RIFF but not really".to_vec());
    assert!(engine.settle().await.is_err());

    assert!(!engine.is_buffer());
    assert_eq!(errors.lock().unwrap().len(), 1);

    // Control calls stay harmless without a buffer
    engine.start(0.0, None);
    engine.stop();
    assert!(engine.is_paused());
}

#[tokio::test]
async fn test_broadcast_skips_updates() {
    let fixture = write_ramp_wav(RATE, 1.0);
    let (mut engine, mut renderer) = loaded(&test_config(), fixture.bytes()).await;
    let mut rx = engine.subscribe();

    engine.start(0.0, None);
    render(&mut renderer, 9);
    engine.pump();

    let mut keys = Vec::new();
    while let Ok(event) = rx.try_recv() {
        keys.push(event.key());
    }
    assert_eq!(
        keys,
        vec![
            NotificationKey::Start,
            NotificationKey::Stop,
            NotificationKey::Ended
        ]
    );
}

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn test_start_and_stop_twice_are_noops() {
    let fixture = write_ramp_wav(RATE, 2.0);
    let (mut engine, mut renderer) = loaded(&test_config(), fixture.bytes()).await;
    let starts = record(&mut engine, "start");
    let stops = record(&mut engine, "stop");

    engine.start(0.5, None);
    engine.start(1.0, None);
    render(&mut renderer, 1);
    engine.stop();
    let position = engine.current_time();
    engine.stop();

    assert_eq!(starts.lock().unwrap().len(), 1);
    assert_eq!(stops.lock().unwrap().len(), 1);
    assert_eq!(engine.current_time(), position);
    assert_eq!(position, 0.5 + block_seconds());
}

#[tokio::test]
async fn test_window_end_stops_at_floor_of_loop_end() {
    let fixture = write_constant_wav(RATE, 2, 4.0, 0.5);
    let (mut engine, mut renderer) = loaded(&test_config(), fixture.bytes()).await;
    let ended = record(&mut engine, "ended");
    let updates = record(&mut engine, "update");

    // floor(1.5) = 1.0: the window plays for exactly one second
    engine.start(0.0, Some(1.5));
    let (left, _) = render(&mut renderer, 9);
    engine.pump();

    let audible = left.iter().filter(|s| s.abs() > 0.1).count();
    assert_eq!(audible, RATE as usize);
    assert_eq!(updates.lock().unwrap().len(), RATE as usize);
    assert_eq!(ended.lock().unwrap().len(), 1);
    assert!(engine.is_paused());
    assert_eq!(engine.current_time(), 0.0);
}

#[tokio::test]
async fn test_loop_restart_stays_within_buffer() {
    let fixture = write_ramp_wav(RATE, 1.0);
    let mut config = test_config();
    config.playback.looping = true;
    let (mut engine, mut renderer) = loaded(&config, fixture.bytes()).await;
    let starts = record(&mut engine, "start");
    let updates = record(&mut engine, "update");
    let duration = engine.duration();

    engine.start(0.5, None);
    for _ in 0..40 {
        render(&mut renderer, 1);
        engine.pump();
        let position = engine.current_time();
        assert!(
            (0.0..duration).contains(&position) || position == duration.floor(),
            "position {} outside [0, {})",
            position,
            duration
        );
    }

    let starts = starts.lock().unwrap();
    assert!(starts.len() >= 4, "expected several loop restarts, got {}", starts.len());
    assert_eq!(starts[0].position(), Some(0.5));
    for start in &starts[1..] {
        assert_eq!(start.position(), Some(0.0));
    }
    assert!(updates
        .lock()
        .unwrap()
        .iter()
        .all(|u| u.position().unwrap() <= duration));
    assert!(!engine.is_paused());
}

#[tokio::test]
async fn test_window_end_past_buffer_is_clamped() {
    let fixture = write_ramp_wav(RATE, 2.0);
    let (mut engine, mut renderer) = loaded(&test_config(), fixture.bytes()).await;
    let starts = record(&mut engine, "start");
    let ended = record(&mut engine, "ended");
    let updates = record(&mut engine, "update");
    let duration = engine.duration();

    engine.start(0.0, Some(10.0));
    for _ in 0..40 {
        render(&mut renderer, 1);
        engine.pump();
        assert!(engine.current_time() <= duration, "position {}", engine.current_time());
    }

    assert_eq!(ended.lock().unwrap().len(), 1);
    assert!(updates
        .lock()
        .unwrap()
        .iter()
        .all(|u| u.position().unwrap() <= duration));

    // A start past the buffer falls back to 0
    engine.start(5.0, Some(10.0));
    assert_eq!(starts.lock().unwrap()[1].position(), Some(0.0));
    assert_eq!(engine.current_time(), 0.0);
}

#[tokio::test]
async fn test_sprite_mode_loop_restarts_at_window_start() {
    let fixture = write_ramp_wav(RATE, 4.0);
    let mut config = test_config();
    config.playback.looping = true;
    let engine = PlaybackEngine::new(&config)
        .with_analyser(Box::new(OverviewAnalyser::default().with_sprite_mode(true)));
    let (mut engine, mut renderer) = load_into(engine, fixture.bytes()).await;
    let starts = record(&mut engine, "start");

    // Boundary at floor(2.5) = 2.0: one second, eight blocks per pass
    engine.start(1.0, Some(2.5));
    for _ in 0..30 {
        render(&mut renderer, 1);
        engine.pump();
        let position = engine.current_time();
        assert!((1.0..2.5).contains(&position), "position {} outside [1, 2.5)", position);
    }

    let starts = starts.lock().unwrap();
    assert!(starts.len() >= 3, "expected loop restarts, got {}", starts.len());
    assert!(starts.iter().all(|s| s.position() == Some(1.0)));
    assert!(!engine.is_paused());
}

#[tokio::test]
async fn test_loop_restart_without_sprite_mode_returns_to_zero() {
    let fixture = write_ramp_wav(RATE, 4.0);
    let mut config = test_config();
    config.playback.looping = true;
    let (mut engine, mut renderer) = loaded(&config, fixture.bytes()).await;
    let starts = record(&mut engine, "start");

    engine.start(1.0, Some(2.5));
    for _ in 0..10 {
        render(&mut renderer, 1);
        engine.pump();
    }

    let starts = starts.lock().unwrap();
    assert_eq!(starts.len(), 2);
    assert_eq!(starts[0].position(), Some(1.0));
    assert_eq!(starts[1].position(), Some(0.0));
    assert!(!engine.is_paused());
}

#[tokio::test]
async fn test_playback_rate_two_doubles_progress_and_moves_release() {
    let fixture = write_ramp_wav(RATE, 4.0);
    let (mut engine, mut renderer) = loaded(&test_config(), fixture.bytes()).await;

    engine.start(0.0, None);
    render(&mut renderer, 8);
    engine.pump();
    assert_eq!(engine.current_time(), 1.0);

    assert!(engine.param("playbackRate", 2.0));
    let now = engine.clock().now();
    assert_eq!(now, 1.0);

    render(&mut renderer, 4);
    engine.pump();
    // Four blocks at double speed cover one second of audio
    assert_eq!(engine.current_time(), 2.0);

    let snapshot = engine.params();
    assert_eq!(snapshot.playback_rate, 2.0);
    assert_eq!(engine.get("rate").map(|v| v.as_f64()), Some(2.0));
}

#[tokio::test]
async fn test_rejected_rate_keeps_previous() {
    let fixture = write_ramp_wav(RATE, 1.0);
    let (mut engine, _renderer) = loaded(&test_config(), fixture.bytes()).await;
    engine.start(0.0, None);

    assert!(!engine.param("playbackrate", 4096.0));
    assert!(!engine.param("playbackrate", -1.0));
    assert_eq!(engine.playback_rate(), 1.0);
}

#[tokio::test]
async fn test_rate_and_loop_survive_restart() {
    let fixture = write_ramp_wav(RATE, 2.0);
    let (mut engine, mut renderer) = loaded(&test_config(), fixture.bytes()).await;

    engine.param("loop", true);
    engine.param("rate", 0.5);
    engine.start(0.0, None);
    render(&mut renderer, 2);
    engine.stop();
    engine.start(0.0, None);

    assert!(engine.looping());
    assert_eq!(engine.playback_rate(), 0.5);
    render(&mut renderer, 2);
    engine.pump();
    assert_eq!(engine.current_time(), block_seconds());
}

// ============================================================================
// Envelope
// ============================================================================

#[tokio::test]
async fn test_stop_during_attack_ramps_down_without_jump() {
    let fixture = write_constant_wav(RATE, 2, 4.0, 0.5);
    let mut config = test_config();
    config.envelope.attack = 1.0;
    config.envelope.release = 0.05;
    let (mut engine, mut renderer) = loaded(&config, fixture.bytes()).await;

    engine.start(0.0, None);
    let (before, _) = render(&mut renderer, 2);
    engine.stop();
    let (after, _) = render(&mut renderer, 2);

    let last = *before.last().unwrap();
    let first = after[0];
    // Halfway through a quarter of the attack, gain is about 0.25
    assert!((last - 0.125).abs() < 0.01, "last sample before stop {}", last);
    assert!((first - last).abs() < 0.01, "jump from {} to {}", last, first);

    // Monotone fade to silence
    assert!(after.windows(2).all(|w| w[1] <= w[0] + 1e-6));
    assert_eq!(after[BLOCK + BLOCK / 2], 0.0);

    let (tail, _) = render(&mut renderer, 2);
    assert!(tail.iter().all(|s| *s == 0.0));
}

#[tokio::test]
async fn test_fade_out_setter_reanchors_release_only() {
    let fixture = write_constant_wav(RATE, 2, 4.0, 0.5);
    let (mut engine, mut renderer) = loaded(&test_config(), fixture.bytes()).await;

    engine.set_fade_in(0.25);
    engine.start(0.0, None);
    render(&mut renderer, 4);
    engine.set_fade_out(0.5);

    assert_eq!(engine.fade_in(), 0.25);
    assert_eq!(engine.fade_out(), 0.5);
    let snapshot = engine.params();
    assert_eq!(snapshot.envelope.attack, 0.25);
    assert_eq!(snapshot.envelope.release, 0.5);

    // Attack finished before the change and stays finished
    let (left, _) = render(&mut renderer, 1);
    assert!(left.iter().all(|s| (s - 0.5).abs() < 0.01));
}

// ============================================================================
// Vocal canceler
// ============================================================================

#[tokio::test]
async fn test_full_depth_cancels_centered_input() {
    let fixture = write_sine_wav(RATE, 2, 2.0, 110.0, 0.8);
    let (mut engine, mut renderer) = loaded(&test_config(), fixture.bytes()).await;

    assert!(engine.param("vocalcanceler.depth", 1.0));
    engine.start(0.0, None);
    let (left, right) = render(&mut renderer, 8);

    assert!(left.iter().all(|s| s.abs() < 1e-6));
    assert!(right.iter().all(|s| s.abs() < 1e-6));
}

#[tokio::test]
async fn test_zero_depth_passes_centered_input() {
    let fixture = write_sine_wav(RATE, 2, 2.0, 110.0, 0.8);
    let (mut engine, mut renderer) = loaded(&test_config(), fixture.bytes()).await;

    engine.param("depth", 0.0);
    engine.start(0.0, None);
    let (left, right) = render(&mut renderer, 8);

    let peak = left.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    assert!(peak > 0.7);
    assert_eq!(left, right);
}

#[tokio::test]
async fn test_mono_buffer_plays_on_both_channels() {
    let fixture = write_constant_wav(RATE, 1, 1.0, 0.5);
    let (mut engine, mut renderer) = loaded(&test_config(), fixture.bytes()).await;
    assert_eq!(engine.channels(), 1);

    engine.start(0.0, None);
    let (left, right) = render(&mut renderer, 1);
    assert!(left.iter().all(|s| (s - 0.5).abs() < 0.001));
    assert_eq!(left, right);
}

// ============================================================================
// Sprites
// ============================================================================

#[tokio::test]
async fn test_sprite_buffer_plays_as_its_own_clip() {
    let fixture = write_ramp_wav(RATE, 4.0);
    let (mut engine, mut renderer) = loaded(&test_config(), fixture.bytes()).await;
    let ended = record(&mut engine, "ended");

    let ranges = serde_json::json!({"hit": [1, 2]});
    let mut sprites = engine.sprite_from_json(&ranges).unwrap();
    let hit = sprites.remove("hit").unwrap();
    engine.ready_buffer(hit);
    assert_eq!(engine.duration(), 1.0);

    engine.start(0.0, None);
    let (left, _) = render(&mut renderer, 9);
    engine.pump();

    // First frame of the sprite is frame 1024 of the source ramp
    assert!((left[0] - 0.25).abs() < 0.001, "first sample {}", left[0]);
    assert_eq!(ended.lock().unwrap().len(), 1);
}
