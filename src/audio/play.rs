use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use anyhow::Result;

use super::alsa_device;
use super::audio_system::AudioConfig;
use super::pcm_codec::AudioBuffer;

/// Playback lifecycle notifications sent back to the controller.
///
/// Modeled as an explicit channel rather than a callback closure so that
/// early stop can be added later without restructuring the thread.
#[derive(Debug)]
pub enum PlaybackEvent {
    /// The most recent buffer finished playing naturally.
    Finished,
    /// Playback of the buffer failed.
    Failed(String),
}

/// Interleave per-channel samples into frame order for the device.
///
/// When the device negotiated more channels than the buffer carries, source
/// channels wrap (mono on a stereo device duplicates the single channel).
fn interleave_for_device(buffer: &AudioBuffer, device_channels: usize) -> Vec<f32> {
    let frames = buffer.frame_count();
    let src_channels = buffer.channel_count();
    let mut out = Vec::with_capacity(frames * device_channels);
    for i in 0..frames {
        for c in 0..device_channels {
            out.push(buffer.channels[c % src_channels][i]);
        }
    }
    out
}

pub fn play_thread(
    config: &AudioConfig,
    mut buffer_rx: mpsc::Receiver<AudioBuffer>,
    event_tx: mpsc::Sender<PlaybackEvent>,
    running: &AtomicBool,
) -> Result<()> {
    // 1. Open ALSA playback device with configurable sample rate, channels, and period size
    let period_size_opt = if config.period_size > 0 {
        Some(config.period_size)
    } else {
        None
    };
    let (pcm, params) = match alsa_device::open_playback(
        &config.playback_device,
        config.sample_rate,
        config.channels,
        period_size_opt,
    ) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = event_tx.blocking_send(PlaybackEvent::Failed(format!(
                "Failed to open playback device: {}",
                e
            )));
            return Err(e);
        }
    };

    let actual_rate = params.sample_rate;
    let actual_channels = params.channels;

    let io = pcm.io_f32()?;

    log::info!(
        "Playback started: rate={}, ch={}, period={}",
        actual_rate,
        actual_channels,
        params.period_size,
    );

    while running.load(Ordering::Relaxed) {
        // Block until we receive a decoded buffer (or the channel closes)
        match buffer_rx.blocking_recv() {
            Some(buffer) => {
                if buffer.frame_count() == 0 {
                    let _ = event_tx.blocking_send(PlaybackEvent::Finished);
                    continue;
                }
                if buffer.sample_rate != actual_rate {
                    // "default" routes through plug, which resamples; raw hw devices will pitch-shift
                    log::warn!(
                        "Buffer rate {} != device rate {}",
                        buffer.sample_rate,
                        actual_rate
                    );
                }

                let interleaved = interleave_for_device(&buffer, actual_channels as usize);
                let total_frames = buffer.frame_count();
                let mut frames_written = 0;
                let mut retry_count = 0u32;
                let mut failed = false;

                // Write to ALSA with retry loop to handle short writes and
                // XRUN recovery without losing frames.
                while frames_written < total_frames {
                    let offset = frames_written * actual_channels as usize;
                    match io.writei(&interleaved[offset..]) {
                        Ok(n) => {
                            frames_written += n;
                            retry_count = 0; // 成功写入，重置重试计数
                        }
                        Err(e) => {
                            log::warn!("ALSA XRUN or error: {}, recovering...", e);
                            retry_count += 1;

                            if let Err(e2) = pcm.prepare() {
                                log::error!("Failed to recover PCM playback: {}", e2);
                                failed = true;
                                break;
                            }

                            // 熔断器：底层持续跟不上写入速度时，丢弃剩余帧防止死循环
                            if retry_count >= 3 {
                                log::error!(
                                    "Max recovery retries ({}) reached. Dropping {} unwritten frames to break dead-loop.",
                                    retry_count,
                                    total_frames - frames_written
                                );
                                break;
                            }
                        }
                    }
                }

                if failed {
                    let _ = event_tx.blocking_send(PlaybackEvent::Failed(
                        "PCM device could not be recovered".to_string(),
                    ));
                    continue;
                }

                // Let the hardware finish the queued frames before signaling,
                // then re-arm the device (drain leaves it in SETUP state).
                if let Err(e) = pcm.drain() {
                    log::warn!("ALSA drain failed: {}", e);
                }
                let _ = pcm.prepare();

                if event_tx.blocking_send(PlaybackEvent::Finished).is_err() {
                    log::warn!("Playback event receiver dropped");
                    break;
                }
            }
            None => {
                // Channel closed, exit playback
                log::info!("Playback channel closed");
                break;
            }
        }
    }

    log::info!("Playback stopped");
    Ok(())
}
