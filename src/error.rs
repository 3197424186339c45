//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// Link Vitals 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum LinkVitalsError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 探测相关错误
    #[error("探测错误: {0}")]
    Probe(#[from] ProbeError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 配置文件已存在
    #[error("配置文件已存在: {path}，使用 --force 覆盖")]
    AlreadyExists { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },

    /// 配置序列化错误
    #[error("配置序列化失败: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// 探测器构建错误类型
///
/// 单次探测的失败不会走到这里，而是被归类为
/// [`crate::health::UnreachableReason`]。
#[derive(Error, Debug)]
pub enum ProbeError {
    /// HTTP客户端构建失败
    #[error("HTTP客户端构建失败: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, LinkVitalsError>;
