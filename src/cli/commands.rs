//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, StartArgs};
use crate::config::loader::LOCAL_CONFIG_FILE;
use crate::config::{validate_config, Config};
use crate::error::{ConfigError, Result};
use crate::health::{check_once, stdout_sink, Dispatcher, HttpProber};
use crate::signal::setup_signal_handlers;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    ///
    /// # 参数
    /// * `config` - 已解析的配置
    async fn execute(&self, config: &Config) -> Result<()>;
}

/// 根据子命令创建对应的处理器并执行
pub async fn execute_command(args: &Args, config: &Config) -> Result<()> {
    match args.command_or_default() {
        Commands::Start(start) => StartCommand { overrides: start }.execute(config).await,
        Commands::Check { targets, timeout } => {
            CheckCommand { targets, timeout }.execute(config).await
        }
        Commands::Init { config_path, force } => {
            InitCommand {
                config_path: config_path.unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE)),
                force,
            }
            .execute(config)
            .await
        }
    }
}

/// 把命令行覆盖项合并到配置中并重新验证
fn apply_overrides(
    config: &Config,
    targets: &[String],
    interval: Option<u64>,
    timeout: Option<u64>,
) -> Result<Config> {
    let mut merged = config.clone();
    if !targets.is_empty() {
        merged.targets = targets.to_vec();
    }
    if let Some(interval) = interval {
        merged.check_interval_seconds = interval;
    }
    if timeout.is_some() {
        merged.request_timeout_seconds = timeout;
    }

    validate_config(&merged).map_err(ConfigError::ValidationError)?;
    Ok(merged)
}

/// 持续探测命令
pub struct StartCommand {
    /// 命令行覆盖项
    pub overrides: StartArgs,
}

#[async_trait]
impl Command for StartCommand {
    async fn execute(&self, config: &Config) -> Result<()> {
        let config = apply_overrides(
            config,
            &self.overrides.targets,
            self.overrides.interval,
            self.overrides.timeout,
        )?;
        let dispatcher_config = config.dispatcher_config();
        let prober = HttpProber::new(dispatcher_config.timeout)?;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        setup_signal_handlers(shutdown_tx.clone()).await?;

        let summary = Dispatcher::new(Arc::new(prober), dispatcher_config)
            .run(shutdown_rx)
            .await;
        drop(shutdown_tx);

        for (url, count) in &summary.completed_checks {
            info!("{} 共完成 {} 次探测", url, count);
        }
        Ok(())
    }
}

/// 单轮探测命令
pub struct CheckCommand {
    /// 覆盖配置的目标列表
    pub targets: Vec<String>,
    /// 请求超时时间（秒）
    pub timeout: Option<u64>,
}

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, config: &Config) -> Result<()> {
        let config = apply_overrides(config, &self.targets, None, self.timeout)?;
        let dispatcher_config = config.dispatcher_config();
        let prober = HttpProber::new(dispatcher_config.timeout)?;

        let reachable =
            check_once(Arc::new(prober), &dispatcher_config.targets, stdout_sink()).await;

        let total = dispatcher_config.targets.len();
        if reachable < total {
            warn!("{}/{} 个目标可能不可达", total - reachable, total);
        } else {
            info!("全部 {} 个目标可达", total);
        }
        Ok(())
    }
}

/// 初始化配置文件命令
pub struct InitCommand {
    /// 配置文件路径
    pub config_path: PathBuf,
    /// 覆盖已存在的文件
    pub force: bool,
}

#[async_trait]
impl Command for InitCommand {
    async fn execute(&self, _config: &Config) -> Result<()> {
        self.create_config_file(&self.config_path).await
    }
}

impl InitCommand {
    /// 创建配置文件
    async fn create_config_file(&self, config_path: &Path) -> Result<()> {
        if config_path.exists() && !self.force {
            return Err(ConfigError::AlreadyExists {
                path: config_path.to_string_lossy().to_string(),
            }
            .into());
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(config_path, Self::render_default_config()?).await?;

        println!("配置文件已创建: {}", config_path.display());
        Ok(())
    }

    /// 生成默认配置内容
    fn render_default_config() -> Result<String> {
        let body = toml::to_string_pretty(&Config::default()).map_err(ConfigError::from)?;
        Ok(format!(
            "# {} 配置文件\n# request_timeout_seconds = 10\n\n{}",
            crate::APP_NAME,
            body
        ))
    }
}
