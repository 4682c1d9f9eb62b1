//! Audio decoding using symphonia
//!
//! Decodes a complete in-memory file into a [`SampleBuffer`]. Supports the
//! formats enabled in symphonia's feature set (WAV/PCM, FLAC, MP3, Vorbis,
//! AAC in MP4).

use crate::audio::buffer::SampleBuffer;
use crate::error::{Error, Result};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer as PcmBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Turns encoded bytes into a buffer
///
/// Runs on a blocking worker thread, never on the audio thread.
pub trait Decode: Send + Sync {
    fn decode(&self, bytes: Vec<u8>) -> Result<SampleBuffer>;
}

/// symphonia-backed decoder
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder {
    extension: Option<String>,
}

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that hints the container format by file extension
    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self { extension: Some(extension.into()) }
    }

    /// Decoder hinted by the extension of `path`, if it has one
    pub fn for_path(path: &Path) -> Self {
        Self {
            extension: path.extension().and_then(|e| e.to_str()).map(str::to_string),
        }
    }
}

impl Decode for SymphoniaDecoder {
    fn decode(&self, bytes: Vec<u8>) -> Result<SampleBuffer> {
        debug!("Decoding {} bytes", bytes.len());

        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = &self.extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let channel_count = codec_params
            .channels
            .map(|c| c.count())
            .ok_or_else(|| Error::Decode("Channel count not found".to_string()))?;

        if !(1..=2).contains(&channel_count) {
            return Err(Error::UnsupportedChannelLayout { channels: channel_count });
        }

        debug!("Audio format: sample_rate={}, channels={}", sample_rate, channel_count);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count];
        let mut pcm: Option<PcmBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    return Err(Error::Decode("Stream parameters changed mid-file".to_string()));
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping corrupt packet: {}", e);
                    continue;
                }
                Err(e) => return Err(Error::Decode(e.to_string())),
            };

            let frames = decoded.frames();
            if frames == 0 {
                continue;
            }

            let needs_alloc = pcm
                .as_ref()
                .map_or(true, |buf| buf.capacity() < decoded.capacity() * channel_count);
            if needs_alloc {
                pcm = Some(PcmBuffer::new(decoded.capacity() as u64, *decoded.spec()));
            }

            if let Some(buf) = pcm.as_mut() {
                // Planar copy: channel 0's frames, then channel 1's
                buf.copy_planar_ref(decoded);
                for (ch, plane) in buf.samples().chunks_exact(frames).take(channel_count).enumerate() {
                    channels[ch].extend_from_slice(plane);
                }
            }
        }

        debug!("Decoded {} frames", channels[0].len());

        SampleBuffer::new(sample_rate, channels)
    }
}

/// Read and decode a file from disk
pub fn decode_file(path: &Path) -> Result<SampleBuffer> {
    let bytes = std::fs::read(path)?;
    SymphoniaDecoder::for_path(path).decode(bytes)
}
