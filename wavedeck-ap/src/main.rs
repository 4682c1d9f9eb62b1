//! Audio Player (wavedeck-ap) - Main entry point
//!
//! Plays one audio file (or one sprite of it) through the default or a
//! named output device, with the engine's envelope, rate, loop and vocal
//! canceler settings taken from the config file and the command line.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wavedeck_ap::{AudioOutput, EngineEvent, PlaybackEngine, SymphoniaDecoder};
use wavedeck_common::config::PlayerConfig;
use wavedeck_common::EngineParams;

/// Command-line arguments for wavedeck-ap
#[derive(Parser, Debug)]
#[command(name = "wavedeck-ap")]
#[command(about = "Single-track audio player with envelope, looping and vocal canceler")]
#[command(version)]
struct Args {
    /// Audio file to play
    #[arg(required_unless_present = "list_devices")]
    file: Option<PathBuf>,

    /// Config file (overrides WAVEDECK_CONFIG and the platform default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output device name
    #[arg(short, long, env = "WAVEDECK_DEVICE")]
    device: Option<String>,

    /// Start of the play window in seconds
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// End of the play window in seconds (default: end of file)
    #[arg(long)]
    end: Option<f64>,

    /// Restart from the beginning of the clip instead of ending
    #[arg(long = "loop")]
    looping: bool,

    /// Playback rate, 0..=1024
    #[arg(long)]
    rate: Option<f64>,

    /// Vocal canceler depth, 0..=1
    #[arg(long)]
    depth: Option<f32>,

    /// Attack time in seconds
    #[arg(long)]
    attack: Option<f64>,

    /// Release time in seconds
    #[arg(long)]
    release: Option<f64>,

    /// Named range NAME=START:END (repeatable)
    #[arg(long = "sprite", value_parser = parse_sprite)]
    sprites: Vec<(String, [f64; 2])>,

    /// Play one of the --sprite ranges as its own buffer
    #[arg(long)]
    play_sprite: Option<String>,

    /// Print the parameter snapshot as JSON before playing
    #[arg(long)]
    dump_params: bool,

    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,
}

impl Args {
    fn engine_params(&self) -> EngineParams {
        EngineParams {
            playback_rate: self.rate,
            looping: self.looping.then_some(true),
            vocal_canceler_depth: self.depth,
            attack: self.attack,
            release: self.release,
            ..Default::default()
        }
    }
}

/// Parse `NAME=START:END`
fn parse_sprite(s: &str) -> std::result::Result<(String, [f64; 2]), String> {
    let (name, range) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=START:END, got '{}'", s))?;
    let (start, end) = range
        .split_once(':')
        .ok_or_else(|| format!("expected START:END after '{}='", name))?;
    let start: f64 = start
        .trim()
        .parse()
        .map_err(|e| format!("bad start '{}': {}", start, e))?;
    let end: f64 = end
        .trim()
        .parse()
        .map_err(|e| format!("bad end '{}': {}", end, e))?;
    if name.is_empty() {
        return Err("sprite name is empty".to_string());
    }
    Ok((name.to_string(), [start, end]))
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("wavedeck_ap={level},wavedeck_common={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config =
        PlayerConfig::resolve(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging.level);

    info!(
        "Starting wavedeck-ap {} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if args.list_devices {
        for name in AudioOutput::list_devices().context("Failed to list output devices")? {
            println!("{}", name);
        }
        return Ok(());
    }

    let file = args.file.clone().context("No input file given")?;
    let bytes = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    info!("Loaded {} ({} bytes)", file.display(), bytes.len());

    let mut engine =
        PlaybackEngine::new(&config).with_decoder(Arc::new(SymphoniaDecoder::for_path(&file)));
    engine.set_params(&args.engine_params());

    engine.ready(bytes);
    engine
        .settle()
        .await
        .with_context(|| format!("Failed to decode {}", file.display()))?;

    if let Some(name) = &args.play_sprite {
        let mut sprites = engine
            .sprite(args.sprites.iter().map(|(n, r)| (n.as_str(), &r[..])))
            .context("Failed to slice sprites")?;
        let buffer = sprites
            .remove(name)
            .with_context(|| format!("No --sprite named '{}'", name))?;
        info!("Playing sprite '{}' ({:.3}s)", name, buffer.duration());
        engine.ready_buffer(buffer);
    }

    if args.dump_params {
        println!("{}", serde_json::to_string_pretty(&engine.params())?);
    }

    let device = args.device.as_deref().or(config.device_name());
    let mut output =
        AudioOutput::open(device, engine.sample_rate()).context("Failed to open audio output")?;
    let renderer = engine
        .take_renderer()
        .context("Renderer already attached to an output")?;
    output.start(renderer).context("Failed to start audio stream")?;

    let mut events = engine.subscribe();
    engine.start(args.start, args.end);

    let mut tick = tokio::time::interval(Duration::from_millis(10));
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut reported_errors = 0;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                engine.pump();
                let errors = output.error_count();
                if errors > reported_errors {
                    warn!("Audio output reported {} stream error(s)", errors - reported_errors);
                    reported_errors = errors;
                }
            }
            event = events.recv() => match event {
                Ok(EngineEvent::Ended { .. }) => {
                    info!("Playback finished");
                    break;
                }
                Ok(event) => debug!("Engine event: {:?}", event.key()),
                Err(RecvError::Lagged(n)) => debug!("Missed {} engine events", n),
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, shutting down");
                engine.stop();
                break;
            }
        }
    }

    output.stop().context("Failed to stop audio stream")?;
    info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sprite() {
        assert_eq!(parse_sprite("intro=0:1.5").unwrap(), ("intro".to_string(), [0.0, 1.5]));
        assert!(parse_sprite("intro").is_err());
        assert!(parse_sprite("intro=1").is_err());
        assert!(parse_sprite("intro=a:2").is_err());
        assert!(parse_sprite("=0:1").is_err());
    }

    #[test]
    fn test_engine_params_from_flags() {
        let args = Args::parse_from(["wavedeck-ap", "song.wav", "--loop", "--rate", "2"]);
        let params = args.engine_params();
        assert_eq!(params.playback_rate, Some(2.0));
        assert_eq!(params.looping, Some(true));
        assert_eq!(params.attack, None);
    }

    #[test]
    fn test_file_optional_with_list_devices() {
        let args = Args::parse_from(["wavedeck-ap", "--list-devices"]);
        assert!(args.file.is_none());
        assert!(Args::try_parse_from(["wavedeck-ap"]).is_err());
    }
}
