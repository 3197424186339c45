//! HTTP可达性探测器实现
//!
//! 对目标发起一次GET请求，并把结果归类为可达或不可达

use crate::error::{ProbeError, Result};
use crate::health::result::{ProbeOutcome, UnreachableReason};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// 探测器trait，定义单次探测接口
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// 执行一次探测
    ///
    /// # 参数
    /// * `url` - 目标URL，不做任何校验
    ///
    /// # 返回
    /// * `ProbeOutcome` - 分类结果，探测本身永不失败
    async fn check(&self, url: &str) -> ProbeOutcome;
}

/// 基于 reqwest 的HTTP探测器
#[derive(Debug, Clone)]
pub struct HttpProber {
    /// HTTP客户端
    client: Client,
    /// 单次请求超时，`None` 表示使用库的默认行为
    timeout: Option<Duration>,
}

impl HttpProber {
    /// 创建新的HTTP探测器
    ///
    /// # 参数
    /// * `timeout` - 单次请求超时时间（可选）
    ///
    /// # 返回
    /// * `Result<Self>` - 探测器实例
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ProbeError::ClientBuild)?;

        Ok(Self { client, timeout })
    }

    /// 获取配置的超时时间
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl HealthChecker for HttpProber {
    async fn check(&self, url: &str) -> ProbeOutcome {
        match self.client.get(url).send().await {
            Ok(response) => ProbeOutcome::Reachable {
                status_code: response.status().as_u16(),
            },
            Err(e) => {
                let reason = UnreachableReason::from_request_error(&e);
                tracing::debug!("请求失败 {}: {} ({})", url, reason, e);
                ProbeOutcome::Unreachable(reason)
            }
        }
    }
}
