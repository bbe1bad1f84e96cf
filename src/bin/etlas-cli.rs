//! Etlas CLI 客户端（测试版）
//!
//! 非交互式 CLI，用于测试和展示会话列表同步功能
//! 启动时通过命令行参数指定用户，自动连接，只展示接收到的信息

use anyhow::Result;
use clap::Parser;
use etlas_sdk_core::etlas::chat::listener::ChatListListener;
use etlas_sdk_core::etlas::chat::types::ChatSummary;
use etlas_sdk_core::etlas::realtime::NullRealtimeChannel;
use etlas_sdk_core::{ClientConfig, EtlasClient, StaticSession};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Etlas CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "etlas-cli")]
#[command(about = "Etlas CLI 客户端 - 用于测试和展示会话同步功能", long_about = None)]
struct Args {
    /// 用户 ID
    #[arg(short, long)]
    user_id: String,

    /// HTTP API 基础地址（默认: http://localhost:8000）
    #[arg(long, default_value = "http://localhost:8000")]
    api_url: String,

    /// 运行时长（秒），0 表示持续运行
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// 日志级别（默认: info,etlas_sdk_core=debug）
    #[arg(long, default_value = "info,etlas_sdk_core=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 创建日志文件（追加模式）
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("无法创建日志文件 debug.log");

    // 输出到 stdout（控制台），保留 ANSI 颜色代码用于终端显示
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 输出到文件，禁用 ANSI 颜色代码（文件不需要颜色）
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
}

/// 会话列表监听器（输出所有接收到的信息）
struct CliChatListListener;

#[async_trait::async_trait]
impl ChatListListener for CliChatListListener {
    async fn on_chat_list_changed(&self, chats: Vec<ChatSummary>) {
        info!("[CLI/Chat] 🔄 会话列表变更（共 {} 个）:", chats.len());
        for chat in chats.iter().take(5) {
            info!(
                "[CLI/Chat]   - {} | {} | {}",
                chat.id,
                chat.name_chat.as_deref().unwrap_or("(未命名)"),
                chat.created_at
            );
        }
    }

    async fn on_recoverable_error(&self, reason: String) {
        error!("[CLI/Chat] ⚠️ 可恢复错误: {}", reason);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    init_logger(&args.log_level);

    info!("[CLI] 🚀 Etlas CLI 客户端（测试模式）");
    info!("[CLI] 👤 用户ID: {}", args.user_id);
    info!("[CLI] 🌐 API 地址: {}", args.api_url);
    info!("[CLI] ⏱️  运行时长: {} 秒（0=持续运行）", args.duration);

    // 创建客户端（CLI 场景无实时推送，列表只靠全量拉取）
    let config = ClientConfig {
        api_base_url: args.api_url.clone(),
    };
    let mut client = EtlasClient::new(
        config,
        Arc::new(StaticSession::new(args.user_id.clone())),
        Arc::new(NullRealtimeChannel),
    )?;

    // 设置监听器
    client.set_chat_list_listener(Arc::new(CliChatListListener));

    // 连接
    info!("[CLI] 🔗 正在连接...");
    client
        .connect()
        .await
        .map_err(|e| anyhow::anyhow!("连接失败: {}", e))?;
    info!("[CLI] ✅ 连接成功！");

    // 显示初始信息
    let chats = client.chats().await;
    info!("[CLI] 📋 会话列表（共 {} 个）:", chats.len());
    for chat in chats.iter().take(5) {
        info!(
            "[CLI]   - {} | {}",
            chat.name_chat.as_deref().unwrap_or("(未命名)"),
            chat.created_at
        );
    }

    if let Ok(schemes) = client.list_schemes(5, 0).await {
        info!("[CLI] 📄 Scheme 列表（共 {} 个）", schemes.len());
        for scheme in &schemes {
            info!("[CLI]   - {} | {}", scheme.id, scheme.title);
        }
    }

    info!("[CLI] 📥 开始监听会话变更...");
    if args.duration > 0 {
        info!("[CLI] ⏰ {} 秒后自动退出", args.duration);
        sleep(Duration::from_secs(args.duration)).await;
        client.shutdown().await;
        info!("[CLI] 👋 程序退出");
    } else {
        info!("[CLI] ⏰ 持续运行中，按 Ctrl+C 退出");
        // 持续运行直到被中断
        loop {
            sleep(Duration::from_secs(3600)).await;
        }
    }

    Ok(())
}
