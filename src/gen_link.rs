//! Long-lived task linking the session to the generation backend.
//!
//! Mirrors the command/event channel pattern used elsewhere in the app:
//! the controller pushes [`GenCommand`]s, the link resolves them against the
//! backend one at a time and pushes [`GenEvent`]s back. The controller's
//! busy state guarantees at most one request is outstanding.

use tokio::sync::mpsc;

use crate::content::GeneratedContent;
use crate::gemini::ContentBackend;

#[derive(Debug)]
pub enum GenCommand {
    GenerateContent { topic: String },
    GenerateSpeech { script: String, voice_name: String },
}

#[derive(Debug)]
pub enum GenEvent {
    Content(Box<GeneratedContent>),
    ContentFailed(String),
    Speech { audio_b64: String },
    SpeechFailed(String),
}

pub struct GenLink {
    backend: Box<dyn ContentBackend>,
    tx: mpsc::Sender<GenEvent>,
    rx_cmd: mpsc::Receiver<GenCommand>,
}

impl GenLink {
    pub fn new(
        backend: Box<dyn ContentBackend>,
        tx: mpsc::Sender<GenEvent>,
        rx_cmd: mpsc::Receiver<GenCommand>,
    ) -> Self {
        Self { backend, tx, rx_cmd }
    }

    /// Drive the link until the command channel closes.
    pub async fn run(mut self) {
        while let Some(cmd) = self.rx_cmd.recv().await {
            let event = match cmd {
                GenCommand::GenerateContent { topic } => {
                    log::info!("Generating content for topic: {}", topic);
                    match self.backend.generate_content(&topic).await {
                        Ok(content) => GenEvent::Content(Box::new(content)),
                        Err(e) => GenEvent::ContentFailed(e.to_string()),
                    }
                }
                GenCommand::GenerateSpeech { script, voice_name } => {
                    log::info!("Synthesizing speech, suggested voice: {}", voice_name);
                    match self.backend.generate_speech(&script, &voice_name).await {
                        Ok(audio_b64) => GenEvent::Speech { audio_b64 },
                        Err(e) => GenEvent::SpeechFailed(e.to_string()),
                    }
                }
            };

            if self.tx.send(event).await.is_err() {
                // 接收端已关闭，退出任务
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::GeneratorError;
    use async_trait::async_trait;

    struct MockBackend;

    #[async_trait]
    impl ContentBackend for MockBackend {
        async fn generate_content(
            &self,
            topic: &str,
        ) -> Result<GeneratedContent, GeneratorError> {
            let json = format!(
                r#"{{
                    "video": {{"title": "{}", "hook": "h", "scenes": []}},
                    "voice": {{"persona": "p", "fullScript": "s", "suggestedVoiceName": "puck"}},
                    "social": {{}}
                }}"#,
                topic
            );
            serde_json::from_str(&json).map_err(|e| GeneratorError::InvalidResponse(e.to_string()))
        }

        async fn generate_speech(
            &self,
            _text: &str,
            _voice_name: &str,
        ) -> Result<String, GeneratorError> {
            Err(GeneratorError::NoAudio)
        }
    }

    #[tokio::test]
    async fn content_command_produces_content_event() {
        let (tx_event, mut rx_event) = mpsc::channel(4);
        let (tx_cmd, rx_cmd) = mpsc::channel(4);
        tokio::spawn(GenLink::new(Box::new(MockBackend), tx_event, rx_cmd).run());

        tx_cmd
            .send(GenCommand::GenerateContent { topic: "rust".to_string() })
            .await
            .unwrap();

        match rx_event.recv().await.unwrap() {
            GenEvent::Content(content) => assert_eq!(content.video.title, "rust"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_synthesis_becomes_speech_failed_event() {
        let (tx_event, mut rx_event) = mpsc::channel(4);
        let (tx_cmd, rx_cmd) = mpsc::channel(4);
        tokio::spawn(GenLink::new(Box::new(MockBackend), tx_event, rx_cmd).run());

        tx_cmd
            .send(GenCommand::GenerateSpeech {
                script: "s".to_string(),
                voice_name: "puck".to_string(),
            })
            .await
            .unwrap();

        match rx_event.recv().await.unwrap() {
            GenEvent::SpeechFailed(msg) => assert!(msg.contains("no audio")),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
