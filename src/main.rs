mod audio;
mod config;
mod content;
mod controller;
mod gemini;
mod gen_link;
mod state_machine;
mod voice;

use audio::PlaybackEvent;
use config::Config;
use controller::CoreController;
use gemini::GeminiBackend;
use gen_link::{GenCommand, GenEvent, GenLink};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    // 加载配置
    let mut config = Config::new().unwrap_or_default();

    // API key：config.toml 为空时回退到环境变量
    if config.api_key.is_empty() {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.api_key = key;
        }
    }
    if config.api_key.is_empty() {
        eprintln!("No API key configured. Set api.api_key in config.toml or GEMINI_API_KEY.");
    }

    // 创建通道，用于组件间通信
    // 生成事件通道
    let (tx_gen_event, mut rx_gen_event) = mpsc::channel::<GenEvent>(16);

    // 生成命令通道
    let (tx_gen_cmd, rx_gen_cmd) = mpsc::channel::<GenCommand>(16);

    // 播放事件通道
    let (tx_play_event, mut rx_play_event) = mpsc::channel::<PlaybackEvent>(16);

    // 启动生成链路，与 Gemini 服务通信
    let backend = GeminiBackend::new(&config);
    let gen_link = GenLink::new(Box::new(backend), tx_gen_event, rx_gen_cmd);
    tokio::spawn(async move {
        gen_link.run().await;
    });

    let mut controller = CoreController::new(config.clone(), tx_gen_cmd, tx_play_event);

    println!("{} v{} started.", config.app_name, config.app_version);
    println!("Enter a topic to generate a content package (or 'help').");

    // 主事件循环，处理用户输入和各组件事件
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            // 监听 Ctrl+C 信号
            _ = signal::ctrl_c() => {
                println!("Received Ctrl+C, shutting down...");
                break;
            }

            // 监听用户输入
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed == "quit" || trimmed == "exit" {
                            break;
                        }
                        controller.handle_input(trimmed).await;
                    }
                    Ok(None) => {
                        // stdin closed
                        break;
                    }
                    Err(e) => {
                        eprintln!("Failed to read input: {}", e);
                        break;
                    }
                }
            }

            // 监听来自生成链路的事件
            Some(event) = rx_gen_event.recv() => {
                controller.handle_gen_event(event).await;
            }

            // 监听来自播放线程的事件
            Some(event) = rx_play_event.recv() => {
                controller.handle_playback_event(event);
            }
        }
    }

    Ok(())
}
