//! Data model of the generated content bundle.
//!
//! The generator is asked for a strict JSON shape; these types mirror it.
//! The three top-level sections are required, but every nested field the
//! response schema leaves optional is modeled as `Option` or defaulted so a
//! partially-filled response still renders instead of failing.

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub video: VideoPlan,
    pub voice: VoicePlan,
    pub social: SocialKit,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VideoPlan {
    pub title: String,
    pub hook: String,
    #[serde(default)]
    pub script: String,
    pub scenes: Vec<VideoScene>,
    #[serde(default)]
    pub music_mood: String,
    #[serde(default)]
    pub color_palette: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VideoScene {
    pub visual_prompt: String,
    pub narrative_text: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VoicePlan {
    pub persona: String,
    #[serde(default)]
    pub tone: String,
    pub full_script: String,
    pub suggested_voice_name: String,
    #[serde(default)]
    pub speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialKit {
    pub youtube: Option<SocialPost>,
    pub instagram: Option<SocialPost>,
    pub tiktok: Option<SocialPost>,
    pub twitter: Option<SocialPost>,
    pub linkedin: Option<SocialPost>,
    pub global_tags: Vec<String>,
    pub seo_description: String,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialPost {
    pub title: Option<String>,
    pub hook: Option<String>,
    pub caption: String,
    pub tags: Vec<String>,
}

/// Build the hand-off link to the external video studio, carrying the
/// production parameters as query parameters.
pub fn video_studio_url(base: &str, video: &VideoPlan) -> anyhow::Result<Url> {
    let mut url = Url::parse(base)?;
    let scenes_json = serde_json::to_string(&video.scenes)?;
    url.query_pairs_mut()
        .append_pair("title", &video.title)
        .append_pair("script", &video.script)
        .append_pair("scenes", &scenes_json)
        .append_pair("mood", &video.music_mood);
    Ok(url)
}
