#[derive(Debug, Clone)]
pub struct Config {
    // 应用信息
    pub app_name: &'static str,
    pub app_version: &'static str,

    // Gemini API（静态部分）
    pub api_base_url: &'static str,
    pub content_model: &'static str,
    pub tts_model: &'static str,

    // API key（动态部分，可在运行时由环境变量覆盖）
    pub api_key: String,

    // 外部视频工作室
    pub video_studio_url: &'static str,

    // 音频播放配置
    pub playback_device: String,
    pub playback_sample_rate: u32,
    pub playback_channels: u32,
    pub playback_period_size: usize,
    pub stream_format: String,
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            // 应用信息
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),

            // Gemini API 配置
            api_base_url: env!("API_BASE_URL"),
            content_model: env!("CONTENT_MODEL"),
            tts_model: env!("TTS_MODEL"),

            // API key 初始化为 config.toml 中的值
            api_key: env!("API_KEY").to_string(),

            // 外部视频工作室
            video_studio_url: env!("VIDEO_STUDIO_URL"),

            // 音频播放配置
            playback_device: env!("PLAYBACK_DEVICE").to_string(),
            playback_sample_rate: env!("PLAYBACK_SAMPLE_RATE").parse()
                .map_err(|_| "Failed to parse PLAYBACK_SAMPLE_RATE")?,
            playback_channels: env!("PLAYBACK_CHANNELS").parse()
                .map_err(|_| "Failed to parse PLAYBACK_CHANNELS")?,
            playback_period_size: env!("PLAYBACK_PERIOD_SIZE").parse()
                .map_err(|_| "Failed to parse PLAYBACK_PERIOD_SIZE")?,
            stream_format: env!("STREAM_FORMAT").to_string(),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new().expect("Failed to create default Config from build-time environment variables")
    }
}
