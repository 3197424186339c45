//! 配置管理模块
//!
//! 提供配置文件解析、验证和默认值

pub mod loader;
pub mod types;

// 重新导出主要类型
pub use loader::{get_default_config_path, resolve_config, ConfigLoader, TomlConfigLoader};
pub use types::{default_targets, validate_config, Config};
