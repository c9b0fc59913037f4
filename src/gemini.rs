//! Gemini REST backend for content generation and speech synthesis.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::Config;
use crate::content::GeneratedContent;
use crate::voice;

/// Failures talking to the generation service.
///
/// Kept apart from [`DecodeError`](crate::audio::DecodeError) so the caller
/// can tell a service failure from locally corrupted audio data.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Transport-level failure (DNS, TLS, connection reset).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The response arrived but does not match the content contract.
    #[error("invalid generation response: {0}")]
    InvalidResponse(String),
    /// The synthesizer returned no audio payload.
    #[error("no audio data generated")]
    NoAudio,
}

/// Boundary to the external generative service.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Generate the full content bundle for a topic.
    async fn generate_content(&self, topic: &str) -> Result<GeneratedContent, GeneratorError>;

    /// Synthesize narration audio for a script; returns the base64 payload.
    async fn generate_speech(&self, text: &str, voice_name: &str)
        -> Result<String, GeneratorError>;
}

pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    content_model: String,
    tts_model: String,
}

impl GeminiBackend {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.to_string(),
            api_key: config.api_key.clone(),
            content_model: config.content_model.to_string(),
            tts_model: config.tts_model.to_string(),
        }
    }

    async fn post_generate(&self, model: &str, body: &Value) -> Result<Value, GeneratorError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api { status, body });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl ContentBackend for GeminiBackend {
    async fn generate_content(&self, topic: &str) -> Result<GeneratedContent, GeneratorError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": content_prompt(topic) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": content_response_schema(),
            }
        });

        let response = self.post_generate(&self.content_model, &body).await?;

        let text = extract_text(&response)
            .ok_or_else(|| GeneratorError::InvalidResponse("no text part in response".to_string()))?;

        serde_json::from_str(text).map_err(|e| GeneratorError::InvalidResponse(e.to_string()))
    }

    async fn generate_speech(
        &self,
        text: &str,
        voice_name: &str,
    ) -> Result<String, GeneratorError> {
        // Defensive check: if the model still hallucinated, fall back to a safe default
        let voice = voice::sanitize_voice_name(voice_name);

        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": voice }
                    }
                }
            }
        });

        let response = self.post_generate(&self.tts_model, &body).await?;

        extract_inline_audio(&response)
            .map(str::to_string)
            .ok_or(GeneratorError::NoAudio)
    }
}

fn content_prompt(topic: &str) -> String {
    format!(
        "Generate a viral content package for the topic: \"{}\".\n\
         Create a complete production blueprint including:\n\
         1. A professional video script with 3-5 visual scenes.\n\
         2. A voice persona with a full script for narration.\n\
            CRITICAL: You MUST choose a voice name ONLY from this list: {}.\n\
            Do not invent new voice names.\n\
         3. Specialized distribution metadata for YouTube, Instagram, TikTok, Twitter, and LinkedIn.\n\
         Use high-impact language and viral hook strategies.",
        topic,
        voice::SUPPORTED_VOICES.join(", "),
    )
}

/// The structured-output schema the generator must conform to.
fn content_response_schema() -> Value {
    let tagged_post = |with_title: bool, with_hook: bool| {
        let mut properties = serde_json::Map::new();
        if with_title {
            properties.insert("title".to_string(), json!({ "type": "STRING" }));
        }
        if with_hook {
            properties.insert("hook".to_string(), json!({ "type": "STRING" }));
        }
        properties.insert("caption".to_string(), json!({ "type": "STRING" }));
        properties.insert(
            "tags".to_string(),
            json!({ "type": "ARRAY", "items": { "type": "STRING" } }),
        );
        json!({ "type": "OBJECT", "properties": properties })
    };

    json!({
        "type": "OBJECT",
        "properties": {
            "video": {
                "type": "OBJECT",
                "properties": {
                    "title": { "type": "STRING" },
                    "hook": { "type": "STRING" },
                    "script": { "type": "STRING" },
                    "scenes": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "visualPrompt": { "type": "STRING" },
                                "narrativeText": { "type": "STRING" },
                                "duration": { "type": "STRING" }
                            },
                            "required": ["visualPrompt", "narrativeText"]
                        }
                    },
                    "musicMood": { "type": "STRING" },
                    "colorPalette": { "type": "STRING" }
                },
                "required": ["title", "hook", "scenes"]
            },
            "voice": {
                "type": "OBJECT",
                "properties": {
                    "persona": { "type": "STRING" },
                    "tone": { "type": "STRING" },
                    "fullScript": { "type": "STRING" },
                    "suggestedVoiceName": {
                        "type": "STRING",
                        "description": format!("MUST be exactly one of: {}", voice::SUPPORTED_VOICES.join(", ")),
                    },
                    "speed": { "type": "NUMBER" }
                },
                "required": ["persona", "fullScript", "suggestedVoiceName"]
            },
            "social": {
                "type": "OBJECT",
                "properties": {
                    "youtube": tagged_post(true, false),
                    "instagram": tagged_post(false, true),
                    "tiktok": tagged_post(false, true),
                    "twitter": tagged_post(false, false),
                    "linkedin": tagged_post(true, false),
                    "globalTags": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "seoDescription": { "type": "STRING" }
                }
            }
        },
        "required": ["video", "voice", "social"]
    })
}

/// Pull the generated text out of a `generateContent` response.
fn extract_text(response: &Value) -> Option<&str> {
    response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

/// Pull the base64 audio payload out of a TTS response.
fn extract_inline_audio(response: &Value) -> Option<&str> {
    response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("inlineData")?
        .get("data")?
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_from_candidate() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"ok\":true}" }] }
            }]
        });
        assert_eq!(extract_text(&response), Some("{\"ok\":true}"));
    }

    #[test]
    fn missing_candidates_yields_none() {
        assert_eq!(extract_text(&json!({})), None);
        assert_eq!(extract_text(&json!({ "candidates": [] })), None);
    }

    #[test]
    fn extracts_inline_audio_payload() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "mimeType": "audio/pcm", "data": "AAAA" } }] }
            }]
        });
        assert_eq!(extract_inline_audio(&response), Some("AAAA"));
    }

    #[test]
    fn text_part_is_not_an_audio_payload() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "hello" }] } }]
        });
        assert_eq!(extract_inline_audio(&response), None);
    }

    #[test]
    fn schema_requires_all_three_sections() {
        let schema = content_response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, ["video", "voice", "social"]);
    }

    #[test]
    fn prompt_lists_the_voice_catalog() {
        let prompt = content_prompt("rust memes");
        assert!(prompt.contains("rust memes"));
        for name in voice::SUPPORTED_VOICES {
            assert!(prompt.contains(name));
        }
    }
}
