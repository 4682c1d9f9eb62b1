//! # wavedeck Common Library
//!
//! Shared code for the wavedeck playback engine and its tools:
//! - Error type for configuration and input validation
//! - Envelope ramp curve definitions
//! - Parameter keys, values and the bulk configuration struct
//! - Lock-free float cells for control → real-time handoff
//! - TOML configuration loading

pub mod atomic;
pub mod config;
pub mod error;
pub mod fade_curves;
pub mod params;

pub use atomic::{AtomicF32, AtomicF64};
pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
pub use params::{EngineParams, ParamKey, ParamValue, ParamsSnapshot};
