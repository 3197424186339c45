//! Link Vitals - 周期性HTTP可达性探测工具
//!
//! 对一组固定的URL周期性发起GET请求，并把每个目标报告为可达或可能不可达：
//! - 每个目标同一时刻只有一次探测在进行
//! - 目标列表、检测间隔和请求超时均可配置
//! - 收到 SIGINT/SIGTERM 后取消所有任务并正常退出

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod signal;

// 重新导出主要类型
pub use config::Config;
pub use error::LinkVitalsError;
pub use health::{Dispatcher, DispatcherConfig, HealthChecker, HttpProber, ProbeOutcome};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
