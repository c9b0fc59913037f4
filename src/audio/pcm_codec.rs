//! Raw PCM stream decoding for speech playback.
//!
//! The speech service returns base64-encoded signed 16-bit little-endian PCM
//! at a fixed sample rate. This module turns that payload into per-channel
//! normalized f32 buffers ready for the playback thread.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

/// Errors raised by the local audio decoding pipeline.
///
/// Kept apart from [`GeneratorError`](crate::gemini::GeneratorError) so
/// callers can tell corrupted payload data from service failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("PCM byte stream length {0} is not a multiple of 2")]
    OddByteLength(usize),
    #[error("channel count must be non-zero")]
    InvalidChannelCount,
    #[error("sample rate must be non-zero")]
    InvalidSampleRate,
}

/// Decode a base64 audio payload into raw bytes.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(BASE64.decode(data)?)
}

// ======================== Audio buffer ========================

/// A decoded audio clip: per-channel normalized f32 samples in [-1.0, 1.0).
///
/// All channel vectors have the same length. Buffers live for a single
/// playback or export request and are never cached across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// De-interleaved samples, one vector per channel.
    pub channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Interleave per-channel samples back into frame order.
    pub fn interleave(&self) -> Vec<f32> {
        let frames = self.frame_count();
        let channel_count = self.channels.len();
        let mut out = Vec::with_capacity(frames * channel_count);
        for i in 0..frames {
            for ch in &self.channels {
                out.push(ch[i]);
            }
        }
        out
    }
}

// ======================== PCM decoder ========================

/// Decoder for interleaved signed 16-bit little-endian PCM.
pub struct PcmDecoder {
    sample_rate: u32,
    channel_count: u32,
}

impl PcmDecoder {
    /// Create a decoder for the given stream parameters.
    ///
    /// A zero sample rate or channel count is rejected rather than coerced.
    pub fn new(sample_rate: u32, channel_count: u32) -> Result<Self, DecodeError> {
        if sample_rate == 0 {
            return Err(DecodeError::InvalidSampleRate);
        }
        if channel_count == 0 {
            return Err(DecodeError::InvalidChannelCount);
        }
        Ok(Self {
            sample_rate,
            channel_count,
        })
    }

    /// Decode raw PCM bytes into per-channel normalized samples.
    ///
    /// The byte length must be even (two bytes per sample); an odd length is
    /// an error, never a silent truncation. A frame is `channel_count`
    /// consecutive samples; trailing samples that do not fill a whole frame
    /// are dropped.
    ///
    /// Normalization divides by 32768, so -32768 maps to exactly -1.0 and
    /// +32767 to just under +1.0. The asymmetry matches reference decoders
    /// bit-exactly and is intentional.
    pub fn decode(&self, data: &[u8]) -> Result<AudioBuffer, DecodeError> {
        if data.len() % 2 != 0 {
            return Err(DecodeError::OddByteLength(data.len()));
        }

        let raw: Vec<i16> = data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        let channel_count = self.channel_count as usize;
        let frame_count = raw.len() / channel_count;

        let mut channels: Vec<Vec<f32>> = (0..channel_count)
            .map(|_| Vec::with_capacity(frame_count))
            .collect();
        for (c, samples) in channels.iter_mut().enumerate() {
            for i in 0..frame_count {
                samples.push(raw[i * channel_count + c] as f32 / 32768.0);
            }
        }

        Ok(AudioBuffer {
            sample_rate: self.sample_rate,
            channels,
        })
    }
}

/// Reverse the normalization: scale to the signed 16-bit range, round, clamp.
pub fn quantize_sample(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16
}

// ======================== StreamDecoder impl ========================

use super::stream_decoder::StreamDecoder;

impl StreamDecoder for PcmDecoder {
    fn decode(&mut self, data: &[u8]) -> Result<AudioBuffer, DecodeError> {
        PcmDecoder::decode(self, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn decodes_known_samples_mono() {
        let data = bytes_of(&[0, 16384, -32768, 32767]);
        let decoder = PcmDecoder::new(24000, 1).unwrap();
        let buffer = decoder.decode(&data).unwrap();

        assert_eq!(buffer.channel_count(), 1);
        assert_eq!(buffer.frame_count(), 4);
        let expected = [0.0f32, 0.5, -1.0, 0.999969482421875];
        for (got, want) in buffer.channels[0].iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {} want {}", got, want);
        }
    }

    #[test]
    fn odd_byte_length_is_rejected() {
        let decoder = PcmDecoder::new(24000, 1).unwrap();
        let err = decoder.decode(&[0x00, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, DecodeError::OddByteLength(3)));
    }

    #[test]
    fn zero_parameters_are_rejected() {
        assert!(matches!(
            PcmDecoder::new(0, 1),
            Err(DecodeError::InvalidSampleRate)
        ));
        assert!(matches!(
            PcmDecoder::new(24000, 0),
            Err(DecodeError::InvalidChannelCount)
        ));
    }

    #[test]
    fn stereo_deinterleaves_into_equal_channels() {
        // [L0, R0, L1, R1, L2, R2]
        let data = bytes_of(&[100, -100, 200, -200, 300, -300]);
        let decoder = PcmDecoder::new(24000, 2).unwrap();
        let buffer = decoder.decode(&data).unwrap();

        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 3);
        assert_eq!(buffer.channels[0].len(), buffer.channels[1].len());
        for (i, &s) in [100i16, 200, 300].iter().enumerate() {
            assert!((buffer.channels[0][i] - s as f32 / 32768.0).abs() < 1e-9);
            assert!((buffer.channels[1][i] + s as f32 / 32768.0).abs() < 1e-9);
        }
    }

    #[test]
    fn trailing_partial_frame_is_dropped() {
        // 5 samples over 2 channels: only 2 complete frames
        let data = bytes_of(&[1, 2, 3, 4, 5]);
        let decoder = PcmDecoder::new(24000, 2).unwrap();
        let buffer = decoder.decode(&data).unwrap();
        assert_eq!(buffer.frame_count(), 2);
    }

    #[test]
    fn round_trip_reproduces_source_samples() {
        let source: Vec<i16> = vec![0, 1, -1, 1000, -1000, 12345, -12345, 32767, -32768];
        let decoder = PcmDecoder::new(24000, 1).unwrap();
        let buffer = decoder.decode(&bytes_of(&source)).unwrap();

        for (&original, &normalized) in source.iter().zip(buffer.channels[0].iter()) {
            let restored = quantize_sample(normalized);
            assert!(
                (restored as i32 - original as i32).abs() <= 1,
                "{} round-tripped to {}",
                original,
                restored
            );
        }
    }

    #[test]
    fn quantize_clamps_out_of_range() {
        assert_eq!(quantize_sample(1.5), 32767);
        assert_eq!(quantize_sample(-1.5), -32768);
        assert_eq!(quantize_sample(0.0), 0);
    }

    #[test]
    fn interleave_restores_frame_order() {
        let buffer = AudioBuffer {
            sample_rate: 24000,
            channels: vec![vec![0.1, 0.2], vec![-0.1, -0.2]],
        };
        assert_eq!(buffer.interleave(), vec![0.1, -0.1, 0.2, -0.2]);
    }

    #[test]
    fn decodes_base64_payload() {
        // [0x00, 0x01] base64-encoded
        let bytes = decode_base64("AAE=").unwrap();
        assert_eq!(bytes, vec![0x00, 0x01]);
        assert!(decode_base64("not base64!!!").is_err());
    }

    #[test]
    fn empty_payload_decodes_to_empty_buffer() {
        let decoder = PcmDecoder::new(24000, 1).unwrap();
        let buffer = decoder.decode(&[]).unwrap();
        assert_eq!(buffer.frame_count(), 0);
        assert_eq!(buffer.duration_secs(), 0.0);
    }
}
