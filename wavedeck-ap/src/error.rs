//! Error types for wavedeck-ap
//!
//! Only decode failures and unsupported channel layouts are reported to
//! callers as errors. Control operations that need a buffer treat
//! [`Error::NoBufferLoaded`] as a silent no-op; the renderer never
//! returns errors at all.

use thiserror::Error;

/// Main error type for wavedeck-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Operation needs a loaded buffer and none is installed yet
    #[error("No buffer loaded")]
    NoBufferLoaded,

    /// Buffer has a channel count other than 1 or 2
    #[error("Unsupported channel layout: {channels} channels (expected 1 or 2)")]
    UnsupportedChannelLayout { channels: usize },

    /// Channel data does not describe a valid buffer
    #[error("Invalid buffer: {0}")]
    InvalidBuffer(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Configuration or parameter errors from the shared crate
    #[error(transparent)]
    Config(#[from] wavedeck_common::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using wavedeck-ap Error
pub type Result<T> = std::result::Result<T, Error>;
