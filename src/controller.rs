use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::audio::{self, AudioBuffer, AudioConfig, AudioSystem, PlaybackEvent, StreamDecoder};
use crate::config::Config;
use crate::content::{video_studio_url, GeneratedContent, SocialPost};
use crate::gen_link::{GenCommand, GenEvent};
use crate::state_machine::SystemState;

/// Where the synthesized audio should go once it arrives.
#[derive(Debug, Clone, PartialEq)]
enum SpeechTarget {
    Playback,
    Export(PathBuf),
}

pub struct CoreController {
    state: SystemState,
    config: Config,
    content: Option<GeneratedContent>,
    speech_target: Option<SpeechTarget>,
    gen_tx: mpsc::Sender<GenCommand>,
    play_event_tx: mpsc::Sender<PlaybackEvent>,
    audio_system: Option<AudioSystem>,
}

impl CoreController {
    pub fn new(
        config: Config,
        gen_tx: mpsc::Sender<GenCommand>,
        play_event_tx: mpsc::Sender<PlaybackEvent>,
    ) -> Self {
        Self {
            state: SystemState::Idle,
            config,
            content: None,
            speech_target: None,
            gen_tx,
            play_event_tx,
            audio_system: None,
        }
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    /// Handle one line of user input: a command, or a topic to generate for.
    pub async fn handle_input(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if self.state.is_busy() {
            // 正在处理上一个请求，不接受新的输入
            println!("Busy ({:?}), please wait for the current request to finish.", self.state);
            return;
        }

        match line {
            "help" => Self::print_help(),
            "play" => self.request_speech(SpeechTarget::Playback).await,
            "video" => self.print_video_studio_link(),
            "json" => self.print_raw_json(),
            _ if line == "export" || line.starts_with("export ") => {
                let path = line.strip_prefix("export").unwrap_or("").trim();
                if path.is_empty() {
                    println!("Usage: export <file.wav>");
                    return;
                }
                self.request_speech(SpeechTarget::Export(PathBuf::from(path))).await;
            }
            topic => self.request_content(topic).await,
        }
    }

    pub async fn handle_gen_event(&mut self, event: GenEvent) {
        match event {
            GenEvent::Content(content) => {
                self.present_content(&content);
                self.content = Some(*content);
                self.state = SystemState::Idle;
            }
            GenEvent::ContentFailed(err) => {
                // 生成失败，回到空闲状态
                eprintln!("Content generation failed: {}", err);
                self.state = SystemState::Idle;
            }
            GenEvent::Speech { audio_b64 } => {
                self.handle_speech_payload(audio_b64).await;
            }
            GenEvent::SpeechFailed(err) => {
                eprintln!("Speech synthesis failed: {}", err);
                self.speech_target = None;
                self.state = SystemState::Idle;
            }
        }
    }

    pub fn handle_playback_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Finished => {
                log::info!("Playback finished");
                self.state = SystemState::Idle;
            }
            PlaybackEvent::Failed(err) => {
                eprintln!("Playback failed: {}", err);
                self.state = SystemState::Idle;
            }
        }
    }

    async fn request_content(&mut self, topic: &str) {
        println!("Generating content package for: {}", topic);
        if let Err(e) = self
            .gen_tx
            .send(GenCommand::GenerateContent { topic: topic.to_string() })
            .await
        {
            eprintln!("Failed to send generate command: {}", e);
            return;
        }
        self.state = SystemState::Generating;
    }

    async fn request_speech(&mut self, target: SpeechTarget) {
        let Some(content) = &self.content else {
            println!("Nothing generated yet. Enter a topic first.");
            return;
        };

        let script = content.voice.full_script.clone();
        let voice_name = content.voice.suggested_voice_name.clone();
        if let Err(e) = self
            .gen_tx
            .send(GenCommand::GenerateSpeech { script, voice_name })
            .await
        {
            eprintln!("Failed to send speech command: {}", e);
            return;
        }
        self.speech_target = Some(target);
        self.state = SystemState::Synthesizing;
    }

    /// Route a synthesized base64 payload through the decoding pipeline and
    /// on to playback or export.
    async fn handle_speech_payload(&mut self, audio_b64: String) {
        let target = self.speech_target.take().unwrap_or(SpeechTarget::Playback);

        let buffer = match self.decode_payload(&audio_b64) {
            Ok(buffer) => buffer,
            Err(e) => {
                // Local data corruption, reported apart from synthesis failures
                eprintln!("Audio decode failed: {}", e);
                self.state = SystemState::Idle;
                return;
            }
        };

        log::info!(
            "Decoded {} frames ({:.2}s) at {}Hz",
            buffer.frame_count(),
            buffer.duration_secs(),
            buffer.sample_rate,
        );

        match target {
            SpeechTarget::Playback => self.start_playback(buffer).await,
            SpeechTarget::Export(path) => {
                match audio::wav::write_wav(&path, &buffer) {
                    Ok(()) => println!("Exported narration to {}", path.display()),
                    Err(e) => eprintln!("WAV export failed: {}", e),
                }
                self.state = SystemState::Idle;
            }
        }
    }

    fn decode_payload(&self, audio_b64: &str) -> anyhow::Result<AudioBuffer> {
        let bytes = audio::decode_base64(audio_b64)?;
        let mut decoder = audio::create_decoder(&self.audio_config())?;
        Ok(decoder.decode(&bytes)?)
    }

    async fn start_playback(&mut self, buffer: AudioBuffer) {
        // The ALSA handle is created once on first use and reused for the session
        if self.audio_system.is_none() {
            match AudioSystem::start(self.audio_config(), self.play_event_tx.clone()) {
                Ok(system) => self.audio_system = Some(system),
                Err(e) => {
                    eprintln!("Failed to start audio system: {}", e);
                    self.state = SystemState::Idle;
                    return;
                }
            }
        }

        if let Some(system) = &self.audio_system {
            if let Err(e) = system.play(buffer).await {
                eprintln!("Failed to queue audio: {}", e);
                self.state = SystemState::Idle;
                return;
            }
            println!("Playing narration preview...");
            self.state = SystemState::Speaking;
        }
    }

    fn audio_config(&self) -> AudioConfig {
        AudioConfig {
            playback_device: self.config.playback_device.clone(),
            sample_rate: self.config.playback_sample_rate,
            channels: self.config.playback_channels,
            period_size: self.config.playback_period_size,
            stream_format: self.config.stream_format.clone(),
        }
    }

    fn present_content(&self, content: &GeneratedContent) {
        println!();
        println!("======== VIDEO PRODUCTION ========");
        println!("Title: {}", content.video.title);
        println!("Hook:  \"{}\"", content.video.hook);
        if !content.video.music_mood.is_empty() {
            println!("Music: {}", content.video.music_mood);
        }
        for (i, scene) in content.video.scenes.iter().enumerate() {
            if scene.duration.is_empty() {
                println!("  Scene {}:", i + 1);
            } else {
                println!("  Scene {} ({}):", i + 1, scene.duration);
            }
            println!("    Visual:    {}", scene.visual_prompt);
            println!("    Narrative: {}", scene.narrative_text);
        }

        println!();
        println!("======== VOICE ENGINE ========");
        println!("Persona: {}", content.voice.persona);
        if !content.voice.tone.is_empty() {
            println!("Tone:    {}", content.voice.tone);
        }
        println!(
            "Voice:   {} (speed {:.1})",
            content.voice.suggested_voice_name,
            content.voice.speed.unwrap_or(1.0),
        );
        println!("Script:  \"{}\"", content.voice.full_script);

        println!();
        println!("======== SOCIAL MULTIPLIER ========");
        Self::print_social("YouTube", &content.social.youtube);
        Self::print_social("Instagram", &content.social.instagram);
        Self::print_social("TikTok", &content.social.tiktok);
        Self::print_social("Twitter", &content.social.twitter);
        Self::print_social("LinkedIn", &content.social.linkedin);
        if !content.social.seo_description.is_empty() {
            println!("[SEO] {}", content.social.seo_description);
        }
        if !content.social.global_tags.is_empty() {
            println!("[Global] #{}", content.social.global_tags.join(" #"));
        }

        println!();
        println!("Commands: play | export <file.wav> | video | json | quit");
    }

    fn print_social(label: &str, post: &Option<SocialPost>) {
        let Some(post) = post else { return };
        println!("[{}]", label);
        if let Some(title) = &post.title {
            println!("  Title:   {}", title);
        }
        if let Some(hook) = &post.hook {
            println!("  Hook:    \"{}\"", hook);
        }
        if !post.caption.is_empty() {
            println!("  Caption: {}", post.caption);
        }
        if !post.tags.is_empty() {
            println!("  Tags:    #{}", post.tags.join(" #"));
        }
    }

    fn print_video_studio_link(&self) {
        let Some(content) = &self.content else {
            println!("Nothing generated yet. Enter a topic first.");
            return;
        };
        match video_studio_url(self.config.video_studio_url, &content.video) {
            Ok(url) => println!("Open the video studio: {}", url),
            Err(e) => eprintln!("Failed to build video studio link: {}", e),
        }
    }

    fn print_raw_json(&self) {
        let Some(content) = &self.content else {
            println!("Nothing generated yet. Enter a topic first.");
            return;
        };
        match serde_json::to_string_pretty(content) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize content: {}", e),
        }
    }

    fn print_help() {
        println!("Commands:");
        println!("  <topic>            generate a content package");
        println!("  play               synthesize and play the narration");
        println!("  export <file.wav>  synthesize and export the narration");
        println!("  video              print the external video studio link");
        println!("  json               print the raw content bundle");
        println!("  quit               exit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_controller() -> (
        CoreController,
        mpsc::Receiver<GenCommand>,
        mpsc::Receiver<PlaybackEvent>,
    ) {
        let (gen_tx, gen_rx) = mpsc::channel(4);
        let (play_tx, play_rx) = mpsc::channel(4);
        let controller = CoreController::new(Config::default(), gen_tx, play_tx);
        (controller, gen_rx, play_rx)
    }

    #[tokio::test]
    async fn topic_input_starts_generation() {
        let (mut controller, mut gen_rx, _play_rx) = test_controller();

        controller.handle_input("rust for beginners").await;
        assert_eq!(controller.state(), SystemState::Generating);

        match gen_rx.recv().await.unwrap() {
            GenCommand::GenerateContent { topic } => assert_eq!(topic, "rust for beginners"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn busy_session_rejects_new_requests() {
        let (mut controller, mut gen_rx, _play_rx) = test_controller();

        controller.handle_input("first topic").await;
        controller.handle_input("second topic").await;

        // Only the first request reached the link
        gen_rx.recv().await.unwrap();
        assert!(gen_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn play_without_content_stays_idle() {
        let (mut controller, mut gen_rx, _play_rx) = test_controller();

        controller.handle_input("play").await;
        assert_eq!(controller.state(), SystemState::Idle);
        assert!(gen_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn generation_failure_returns_to_idle() {
        let (mut controller, _gen_rx, _play_rx) = test_controller();

        controller.handle_input("some topic").await;
        assert_eq!(controller.state(), SystemState::Generating);

        controller
            .handle_gen_event(GenEvent::ContentFailed("boom".to_string()))
            .await;
        assert_eq!(controller.state(), SystemState::Idle);
    }

    #[tokio::test]
    async fn corrupt_speech_payload_returns_to_idle() {
        let (mut controller, _gen_rx, _play_rx) = test_controller();

        // Odd-length payload: one byte, base64 "AA=="
        controller
            .handle_gen_event(GenEvent::Speech { audio_b64: "AA==".to_string() })
            .await;
        assert_eq!(controller.state(), SystemState::Idle);
    }
}
