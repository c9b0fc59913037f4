//! WAV export of decoded narration audio.

use std::path::Path;

use anyhow::{Context, Result};

use super::pcm_codec::{quantize_sample, AudioBuffer};

/// Write a decoded buffer to `path` as a 16-bit PCM WAV file.
///
/// Samples are re-quantized from the normalized floats (the inverse of the
/// decoder's /32768 normalization).
pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> Result<()> {
    let num_channels = buffer.channel_count() as u16;
    let sample_rate = buffer.sample_rate;
    let bits_per_sample: u16 = 16;

    let mut audio_data = Vec::with_capacity(buffer.frame_count() * num_channels as usize * 2);
    for sample in buffer.interleave() {
        audio_data.extend_from_slice(&quantize_sample(sample).to_le_bytes());
    }

    let data_size = audio_data.len() as u32;
    let mut wav_data = Vec::with_capacity(44 + audio_data.len());

    // RIFF header
    wav_data.extend_from_slice(b"RIFF");
    wav_data.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav_data.extend_from_slice(b"WAVE");

    // fmt chunk
    wav_data.extend_from_slice(b"fmt ");
    wav_data.extend_from_slice(&16u32.to_le_bytes()); // Chunk size
    wav_data.extend_from_slice(&1u16.to_le_bytes()); // Audio format (PCM)
    wav_data.extend_from_slice(&num_channels.to_le_bytes());
    wav_data.extend_from_slice(&sample_rate.to_le_bytes());
    let byte_rate = sample_rate * num_channels as u32 * bits_per_sample as u32 / 8;
    wav_data.extend_from_slice(&byte_rate.to_le_bytes());
    let block_align = num_channels * (bits_per_sample / 8);
    wav_data.extend_from_slice(&block_align.to_le_bytes());
    wav_data.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    wav_data.extend_from_slice(b"data");
    wav_data.extend_from_slice(&data_size.to_le_bytes());
    wav_data.extend_from_slice(&audio_data);

    std::fs::write(path, wav_data)
        .with_context(|| format!("Failed to write WAV file {}", path.display()))?;

    log::debug!(
        "Exported {} frames ({:.2}s) to {}",
        buffer.frame_count(),
        buffer.duration_secs(),
        path.display(),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_well_formed_wav() {
        let temp_dir = std::env::temp_dir();
        let path = temp_dir.join("test_export.wav");

        let buffer = AudioBuffer {
            sample_rate: 24000,
            channels: vec![vec![0.0, 0.5, -1.0, 0.999969482421875]],
        };
        write_wav(&path, &buffer).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WAVE");
        assert_eq!(&data[12..16], b"fmt ");
        assert_eq!(&data[36..40], b"data");
        // 4 mono samples, 2 bytes each
        assert_eq!(data.len(), 44 + 8);
        assert_eq!(u32::from_le_bytes(data[40..44].try_into().unwrap()), 8);
        // Sample rate field
        assert_eq!(u32::from_le_bytes(data[24..28].try_into().unwrap()), 24000);
        // First payload samples round-trip the quantization
        assert_eq!(i16::from_le_bytes(data[44..46].try_into().unwrap()), 0);
        assert_eq!(i16::from_le_bytes(data[46..48].try_into().unwrap()), 16384);
        assert_eq!(i16::from_le_bytes(data[48..50].try_into().unwrap()), -32768);
        assert_eq!(i16::from_le_bytes(data[50..52].try_into().unwrap()), 32767);

        std::fs::remove_file(&path).ok();
    }
}
