use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    api: Api,
    video_studio: VideoStudio,
    audio: Audio,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Api {
    base_url: String,
    api_key: String,
    content_model: String,
    tts_model: String,
}

#[derive(Deserialize)]
struct VideoStudio {
    base_url: String,
}

#[derive(Deserialize)]
struct Audio {
    playback_device: String,
    sample_rate: u32,
    channels: u32,
    period_size: usize,
    stream_format: String,
}

// 在编译时读取 config.toml 并设置环境变量
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    // 应用信息
    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);

    // Gemini API 配置
    println!("cargo:rustc-env=API_BASE_URL={}", config.api.base_url);
    println!("cargo:rustc-env=API_KEY={}", config.api.api_key);
    println!("cargo:rustc-env=CONTENT_MODEL={}", config.api.content_model);
    println!("cargo:rustc-env=TTS_MODEL={}", config.api.tts_model);

    // 外部视频工作室
    println!("cargo:rustc-env=VIDEO_STUDIO_URL={}", config.video_studio.base_url);

    // 音频播放配置
    println!("cargo:rustc-env=PLAYBACK_DEVICE={}", config.audio.playback_device);
    println!("cargo:rustc-env=PLAYBACK_SAMPLE_RATE={}", config.audio.sample_rate);
    println!("cargo:rustc-env=PLAYBACK_CHANNELS={}", config.audio.channels);
    println!("cargo:rustc-env=PLAYBACK_PERIOD_SIZE={}", config.audio.period_size);
    println!("cargo:rustc-env=STREAM_FORMAT={}", config.audio.stream_format);
}
