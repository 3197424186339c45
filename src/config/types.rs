//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use crate::health::DispatcherConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// 检测间隔（秒）
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    /// 请求超时时间（秒），不设置时使用HTTP库的默认行为
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_seconds: Option<u64>,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 目标URL列表
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check_interval_seconds: default_check_interval(),
            request_timeout_seconds: None,
            log_level: default_log_level(),
            targets: default_targets(),
        }
    }
}

impl Config {
    /// 转换为调度器运行参数
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            targets: self.targets.clone(),
            interval: Duration::from_secs(self.check_interval_seconds),
            timeout: self.request_timeout_seconds.map(Duration::from_secs),
        }
    }
}

// 默认值函数
fn default_check_interval() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}

/// 未提供配置时使用的内置目标列表
pub fn default_targets() -> Vec<String> {
    [
        "http://google.com",
        "http://facebook.com",
        "http://stackoverflow.com",
        "http://golang.com",
        "http://amazon.com",
    ]
    .iter()
    .map(|url| url.to_string())
    .collect()
}

/// 配置验证函数
///
/// URL本身不做校验，格式错误的URL会在探测时被归类为不可达。
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.check_interval_seconds == 0 {
        return Err("检测间隔不能为0".to_string());
    }

    if config.request_timeout_seconds == Some(0) {
        return Err("请求超时时间不能为0".to_string());
    }

    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.log_level, valid_log_levels
        ));
    }

    if config.targets.is_empty() {
        return Err("至少需要配置一个目标".to_string());
    }

    Ok(())
}
