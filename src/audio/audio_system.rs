//! The AudioSystem that manages the playback thread.
//!
//! Uses std::thread (NOT a tokio task) for real-time audio I/O to avoid
//! contention with async network tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;

use anyhow::Result;

use super::pcm_codec::{AudioBuffer, PcmDecoder};
use super::play::{play_thread, PlaybackEvent};
use super::stream_decoder::StreamDecoder;

/// Audio playback configuration.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// ALSA playback device name (e.g. "default", "plughw:0,0")
    pub playback_device: String,
    /// Desired playback sample rate (may be negotiated by hardware)
    pub sample_rate: u32,
    /// Desired playback channel count
    pub channels: u32,
    /// Desired ALSA period size (0 = let ALSA decide)
    pub period_size: usize,
    /// 语音服务下发流的编码格式: "pcm16"
    pub stream_format: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            playback_device: "default".to_string(),
            sample_rate: 24000,
            channels: 1,
            period_size: 1024,
            stream_format: "pcm16".to_string(),
        }
    }
}

/// Factory function: create a decoder based on the configured payload format.
pub fn create_decoder(config: &AudioConfig) -> Result<Box<dyn StreamDecoder>> {
    match config.stream_format.as_str() {
        "pcm16" => {
            let decoder = PcmDecoder::new(config.sample_rate, config.channels)?;
            Ok(Box::new(decoder))
        }
        other => anyhow::bail!("Unsupported stream format: {}", other),
    }
}

/// The audio system owns the playback thread for the lifetime of the session.
///
/// Created lazily on the first playback request and reused afterwards;
/// decoded buffers flow in through a channel and completion notifications
/// flow back to the caller through `event_tx`.
pub struct AudioSystem {
    running: Arc<AtomicBool>,
    play_handle: Option<JoinHandle<()>>,
    buffer_tx: mpsc::Sender<AudioBuffer>,
}

impl AudioSystem {
    /// Start the audio system.
    ///
    /// * `config`   - Audio configuration
    /// * `event_tx` - Sender for playback lifecycle notifications
    pub fn start(config: AudioConfig, event_tx: mpsc::Sender<PlaybackEvent>) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let (buffer_tx, buffer_rx) = mpsc::channel::<AudioBuffer>(4);

        log::info!(
            "AudioSystem starting — playback: \"{}\", rate: {}Hz, ch: {}, format: {}",
            config.playback_device,
            config.sample_rate,
            config.channels,
            config.stream_format,
        );

        let play_handle = {
            let running = running.clone();
            let config = config.clone();
            thread::Builder::new()
                .name("audio-play".into())
                .spawn(move || {
                    if let Err(e) = play_thread(&config, buffer_rx, event_tx, &running) {
                        log::error!("Playback thread error: {}", e);
                    }
                })?
        };

        Ok(Self {
            running,
            play_handle: Some(play_handle),
            buffer_tx,
        })
    }

    /// Queue a decoded buffer for playback.
    pub async fn play(&self, buffer: AudioBuffer) -> Result<()> {
        self.buffer_tx
            .send(buffer)
            .await
            .map_err(|_| anyhow::anyhow!("Playback thread is gone"))
    }

    /// Signal the thread to stop.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Playback thread will exit when the buffer sender is dropped.
        // We detach it here to avoid blocking on an in-progress write.
        self.play_handle.take();
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_builds_pcm16_decoder() {
        let config = AudioConfig::default();
        let mut decoder = create_decoder(&config).unwrap();
        let buffer = decoder.decode(&[0, 0, 0, 64]).unwrap();
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.sample_rate, 24000);
    }

    #[test]
    fn factory_rejects_unknown_format() {
        let config = AudioConfig {
            stream_format: "opus".to_string(),
            ..Default::default()
        };
        assert!(create_decoder(&config).is_err());
    }
}
