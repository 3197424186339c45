//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Link Vitals - 周期性HTTP可达性探测工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "link-vitals",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "LINK_VITALS_CONFIG",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// 日志级别，不指定时使用配置文件中的值
    #[arg(
        short,
        long,
        value_enum,
        help = "日志级别",
        env = "LINK_VITALS_LOG_LEVEL",
        global = true
    )]
    pub log_level: Option<LogLevel>,

    /// 以JSON格式输出日志
    #[arg(long, help = "以JSON格式输出日志", global = true)]
    pub log_json: bool,

    /// 子命令，不指定时等同于 start
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    /// 跟踪级别
    Trace,
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// 持续探测所有目标，直到收到停止信号
    Start(StartArgs),

    /// 对所有目标执行一轮探测后退出
    Check {
        /// 覆盖配置中的目标列表
        #[arg(short = 't', long = "target", value_name = "URL", help = "探测目标，可重复")]
        targets: Vec<String>,

        /// 请求超时时间（秒）
        #[arg(long, value_name = "SECONDS", help = "请求超时时间（秒）")]
        timeout: Option<u64>,
    },

    /// 生成默认配置文件
    Init {
        /// 配置文件路径
        #[arg(value_name = "PATH", help = "配置文件路径")]
        config_path: Option<PathBuf>,

        /// 覆盖已存在的文件
        #[arg(short, long, help = "覆盖已存在的文件")]
        force: bool,
    },
}

/// start 子命令参数
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct StartArgs {
    /// 检测间隔（秒）
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        help = "检测间隔（秒）",
        env = "LINK_VITALS_INTERVAL"
    )]
    pub interval: Option<u64>,

    /// 请求超时时间（秒）
    #[arg(long, value_name = "SECONDS", help = "请求超时时间（秒）")]
    pub timeout: Option<u64>,

    /// 覆盖配置中的目标列表
    #[arg(short = 't', long = "target", value_name = "URL", help = "探测目标，可重复")]
    pub targets: Vec<String>,
}

impl Args {
    /// 获取要执行的子命令，未指定时为 start
    pub fn command_or_default(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Start(StartArgs::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_start() {
        let args = Args::try_parse_from(["link-vitals"]).unwrap();
        assert_eq!(args.command_or_default(), Commands::Start(StartArgs::default()));
        assert!(args.log_level.is_none());
    }

    #[test]
    fn test_start_overrides() {
        let args = Args::try_parse_from([
            "link-vitals",
            "start",
            "--interval",
            "10",
            "--timeout",
            "3",
            "-t",
            "http://a.test",
            "--target",
            "http://b.test",
        ])
        .unwrap();

        match args.command_or_default() {
            Commands::Start(start) => {
                assert_eq!(start.interval, Some(10));
                assert_eq!(start.timeout, Some(3));
                assert_eq!(start.targets, vec!["http://a.test", "http://b.test"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["link-vitals", "check", "--log-level", "debug", "--log-json"])
                .unwrap();
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert!(args.log_json);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(log::LevelFilter::from(LogLevel::Warn), log::LevelFilter::Warn);
        assert_eq!(LogLevel::Trace.to_string(), "trace");
    }
}
