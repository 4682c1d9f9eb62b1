//! Player configuration file and path resolution
//!
//! Configuration is read from a TOML file. Every section and field has a
//! default, so an empty file (or no file at all) yields a working player.
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [output]
//! device = "default"
//! block_size = 2048
//! default_sample_rate = 44100
//!
//! [envelope]
//! attack = 0.0
//! decay = 0.01
//! sustain = 1.0
//! release = 0.01
//! curve = "linear"
//!
//! [vocal_canceler]
//! depth = 0.0
//!
//! [playback]
//! playback_rate = 1.0
//! loop = false
//! ```

use crate::fade_curves::FadeCurve;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "WAVEDECK_CONFIG";

/// Smallest and largest accepted render block, in frames
pub const BLOCK_SIZE_RANGE: std::ops::RangeInclusive<usize> = 256..=16384;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    pub envelope: EnvelopeConfig,
    pub vocal_canceler: VocalCancelerConfig,
    pub playback: PlaybackConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Audio output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output device name, `None` or "default" for the system default
    pub device: Option<String>,
    /// Frames per render block
    pub block_size: usize,
    /// Sample rate reported while no buffer is loaded
    pub default_sample_rate: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            device: None,
            block_size: 2048,
            default_sample_rate: 44100,
        }
    }
}

/// Envelope defaults applied at engine construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f32,
    pub release: f64,
    pub curve: FadeCurve,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack: 0.0,
            decay: 0.01,
            sustain: 1.0,
            release: 0.01,
            curve: FadeCurve::Linear,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocalCancelerConfig {
    pub depth: f32,
}

/// Initial playback parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub playback_rate: f64,
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { playback_rate: 1.0, looping: false }
    }
}

impl PlayerConfig {
    /// Parse and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PlayerConfig = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve and load configuration, falling back to defaults
    ///
    /// A file named explicitly (CLI or environment) must load; a missing or
    /// broken file at the platform default location only logs a warning.
    ///
    /// # Arguments
    /// * `cli_arg` - Path from the `--config` flag, if given
    pub fn resolve(cli_arg: Option<&Path>) -> Result<Self> {
        let env_value = std::env::var(CONFIG_ENV_VAR).ok();
        match resolve_config_path(cli_arg, env_value.as_deref()) {
            ConfigSource::Explicit(path) => {
                info!("Using config file {}", path.display());
                Self::load(&path)
            }
            ConfigSource::PlatformDefault(path) if path.exists() => match Self::load(&path) {
                Ok(config) => {
                    info!("Using config file {}", path.display());
                    Ok(config)
                }
                Err(e) => {
                    warn!("Ignoring config file {}: {}", path.display(), e);
                    Ok(Self::default())
                }
            },
            ConfigSource::PlatformDefault(_) | ConfigSource::Defaults => {
                debug!("No config file found, using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if !BLOCK_SIZE_RANGE.contains(&self.output.block_size) {
            return Err(Error::Config(format!(
                "output.block_size {} out of range [{}, {}]",
                self.output.block_size,
                BLOCK_SIZE_RANGE.start(),
                BLOCK_SIZE_RANGE.end()
            )));
        }
        if self.output.default_sample_rate == 0 {
            return Err(Error::Config("output.default_sample_rate must be positive".to_string()));
        }
        if !(0.0..=1024.0).contains(&self.playback.playback_rate) {
            return Err(Error::Config(format!(
                "playback.playback_rate {} out of range [0, 1024]",
                self.playback.playback_rate
            )));
        }
        let env = &self.envelope;
        if env.attack < 0.0 || env.decay < 0.0 || env.release < 0.0 {
            return Err(Error::Config("envelope times must not be negative".to_string()));
        }
        if !(0.0..=1.0).contains(&env.sustain) {
            return Err(Error::Config(format!(
                "envelope.sustain {} out of range [0, 1]",
                env.sustain
            )));
        }
        Ok(())
    }

    /// Output device name, treating "default" as unset
    pub fn device_name(&self) -> Option<&str> {
        self.output
            .device
            .as_deref()
            .filter(|name| !name.is_empty() && *name != "default")
    }
}

/// Where configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named by `--config` or the environment
    Explicit(PathBuf),
    /// Platform config directory; may not exist
    PlatformDefault(PathBuf),
    /// No candidate path at all
    Defaults,
}

/// Config path priority:
/// 1. Command-line argument
/// 2. Environment variable value
/// 3. `<platform config dir>/wavedeck/config.toml`
pub fn resolve_config_path(cli_arg: Option<&Path>, env_value: Option<&str>) -> ConfigSource {
    if let Some(path) = cli_arg {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    if let Some(path) = env_value.filter(|v| !v.is_empty()) {
        return ConfigSource::Explicit(PathBuf::from(path));
    }

    match default_config_path() {
        Some(path) => ConfigSource::PlatformDefault(path),
        None => ConfigSource::Defaults,
    }
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wavedeck").join("config.toml"))
}
