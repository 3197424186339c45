//! Link Vitals 主程序入口
//!
//! 周期性HTTP可达性探测工具

use anyhow::{Context, Result};
use clap::Parser;
use link_vitals::cli::{execute_command, Args, Commands};
use link_vitals::config::{resolve_config, Config};
use link_vitals::logging::{LogConfig, LoggingSystem};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // init 命令不读取现有配置，避免无效文件阻止重新生成
    let (config, config_path) = match args.command {
        Some(Commands::Init { .. }) => (Config::default(), None),
        _ => resolve_config(args.config.as_deref())
            .await
            .context("加载配置失败")?,
    };

    // 初始化日志系统，命令行参数优先于配置文件
    let level = match args.log_level {
        Some(level) => level.into(),
        None => LogConfig::from_level_str(&config.log_level).level,
    };
    let log_config = LogConfig {
        level,
        json_format: args.log_json,
        ..Default::default()
    };
    let logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!(
        "{} v{} 启动，日志级别: {}",
        link_vitals::APP_NAME,
        link_vitals::VERSION,
        logging_system.config().level
    );
    match config_path {
        Some(path) => info!("使用配置文件: {}", path.display()),
        None => info!("未使用配置文件，采用内置默认配置"),
    }

    // 执行命令
    if let Err(e) = execute_command(&args, &config).await {
        error!("命令执行失败: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
