//! Generic stream decoder trait for multi-format audio playback support.

use super::pcm_codec::{AudioBuffer, DecodeError};

/// A trait for audio stream decoders that convert a raw byte payload into
/// normalized per-channel f32 buffers ready for playback.
///
/// Implementations handle format-specific decoding internally.
pub trait StreamDecoder: Send {
    /// Decode audio bytes into a playable buffer.
    fn decode(&mut self, data: &[u8]) -> Result<AudioBuffer, DecodeError>;
}
