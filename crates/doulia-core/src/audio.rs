//! Decoding of the spoken replies returned by the model.
//!
//! The model answers with raw signed 16-bit little-endian PCM, base64
//! encoded. Playback devices want normalized float samples, one slice per
//! channel.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use std::time::Duration;

use crate::error::AudioDecodeError;

/// Sample rate of model speech output.
pub const REPLY_SAMPLE_RATE: u32 = 24_000;
/// Model speech output is mono.
pub const REPLY_CHANNELS: u16 = 1;

/// Decoded audio ready for an output device.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }

    /// Samples re-interleaved frame by frame, the layout most sinks expect.
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frame_count();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for i in 0..frames {
            for channel in &self.channels {
                out.push(channel[i]);
            }
        }
        out
    }
}

pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, AudioDecodeError> {
    Ok(B64.decode(encoded.trim())?)
}

/// Interpret `bytes` as interleaved i16 LE PCM and split it per channel,
/// scaling every sample into [-1, 1].
pub fn decode_pcm(
    bytes: &[u8],
    sample_rate: u32,
    channel_count: u16,
) -> Result<PcmBuffer, AudioDecodeError> {
    if channel_count == 0 {
        return Err(AudioDecodeError::NoChannels);
    }

    let frame_bytes = 2 * channel_count as usize;
    if bytes.len() % frame_bytes != 0 {
        return Err(AudioDecodeError::Format {
            len: bytes.len(),
            channels: channel_count,
        });
    }

    let frame_count = bytes.len() / frame_bytes;
    let mut channels = vec![Vec::with_capacity(frame_count); channel_count as usize];

    for (i, pair) in bytes.chunks_exact(2).enumerate() {
        let sample = i16::from_le_bytes([pair[0], pair[1]]);
        channels[i % channel_count as usize].push(sample as f32 / 32768.0);
    }

    Ok(PcmBuffer {
        sample_rate,
        channels,
    })
}

/// Base64 reply payload straight to a playable buffer at the model's output format.
pub fn decode_reply_audio(encoded: &str) -> Result<PcmBuffer, AudioDecodeError> {
    let bytes = decode_base64(encoded)?;
    decode_pcm(&bytes, REPLY_SAMPLE_RATE, REPLY_CHANNELS)
}
