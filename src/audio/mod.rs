//! audio - PCM decoding, playback, and export library
//!
//! The speech service returns base64-encoded raw 16-bit PCM. This module
//! decodes it into normalized per-channel float buffers, plays them through
//! ALSA on a dedicated thread, and can export them as WAV files.

mod alsa_device;
mod audio_system;
pub mod pcm_codec;
mod play;
pub mod stream_decoder;
pub mod wav;

pub use audio_system::{create_decoder, AudioConfig, AudioSystem};
pub use pcm_codec::{decode_base64, AudioBuffer, DecodeError, PcmDecoder};
pub use play::PlaybackEvent;
pub use stream_decoder::StreamDecoder;
