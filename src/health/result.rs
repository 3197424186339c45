//! 探测结果数据结构
//!
//! 定义单次可达性探测的分类结果，以及在共享通道上传递的完成消息

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// 不可达原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnreachableReason {
    /// 请求超时
    Timeout,
    /// 连接失败（拒绝连接、网络不可达等）
    Connect,
    /// DNS解析失败
    Dns,
    /// TLS握手或证书错误
    Tls,
    /// URL无法构造成请求
    InvalidUrl,
    /// 其他传输层错误
    Other(String),
}

impl fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnreachableReason::Timeout => write!(f, "请求超时"),
            UnreachableReason::Connect => write!(f, "连接失败"),
            UnreachableReason::Dns => write!(f, "DNS解析失败"),
            UnreachableReason::Tls => write!(f, "TLS错误"),
            UnreachableReason::InvalidUrl => write!(f, "无效的URL"),
            UnreachableReason::Other(detail) => write!(f, "请求失败: {detail}"),
        }
    }
}

impl UnreachableReason {
    /// 根据 reqwest 错误归类不可达原因
    pub fn from_request_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return UnreachableReason::Timeout;
        }
        if error.is_builder() {
            return UnreachableReason::InvalidUrl;
        }

        // reqwest 不单独暴露 DNS/TLS 错误，只能从底层错误链的描述中区分。
        // 顶层描述包含请求URL，不参与匹配
        let chain = source_chain_text(error);
        if chain.contains("dns") || chain.contains("resolve") {
            UnreachableReason::Dns
        } else if chain.contains("certificate") || chain.contains("tls") || chain.contains("ssl") {
            UnreachableReason::Tls
        } else if error.is_connect() {
            UnreachableReason::Connect
        } else {
            UnreachableReason::Other(error.to_string())
        }
    }
}

/// 拼接错误来源链的小写描述，不含顶层错误本身
fn source_chain_text(error: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = Vec::new();
    let mut source = error.source();
    while let Some(inner) = source {
        parts.push(inner.to_string().to_lowercase());
        source = inner.source();
    }
    parts.join(" ")
}

/// 单次探测的分类结果
///
/// 任何收到的HTTP响应都算可达，状态码不参与判断。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 收到了响应
    Reachable { status_code: u16 },
    /// 传输层失败
    Unreachable(UnreachableReason),
}

impl ProbeOutcome {
    /// 判断是否可达
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable { .. })
    }

    /// 生成输出到标准输出的报告行
    pub fn report_line(&self, url: &str) -> String {
        match self {
            ProbeOutcome::Reachable { .. } => format!("{url} is up!"),
            ProbeOutcome::Unreachable(_) => format!("{url} might be down!"),
        }
    }
}

/// 一次探测的完整记录，仅用于日志
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// 目标URL
    pub url: String,
    /// 分类结果
    pub outcome: ProbeOutcome,
    /// 探测开始时间
    pub checked_at: DateTime<Utc>,
    /// 耗时
    pub elapsed: Duration,
}

impl ProbeReport {
    /// 创建新的探测记录
    pub fn new(url: String, outcome: ProbeOutcome, elapsed: Duration) -> Self {
        let elapsed_delta =
            chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero());

        Self {
            url,
            outcome,
            checked_at: Utc::now() - elapsed_delta,
            elapsed,
        }
    }

    /// 获取耗时（毫秒）
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// 目标在配置列表中的位置
///
/// 重复的URL是相互独立的目标，因此用位置而不是URL来标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub usize);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 共享通道上的完成消息
///
/// 只携带目标身份，不携带分类结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckCompleted {
    /// 目标编号
    pub target: TargetId,
    /// 目标URL
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_line_reachable() {
        let outcome = ProbeOutcome::Reachable { status_code: 200 };
        assert_eq!(outcome.report_line("http://a.test"), "http://a.test is up!");
        assert!(outcome.is_reachable());
    }

    #[test]
    fn test_report_line_ignores_status_code() {
        for code in [201, 301, 404, 500, 503] {
            let outcome = ProbeOutcome::Reachable { status_code: code };
            assert_eq!(outcome.report_line("http://a.test"), "http://a.test is up!");
        }
    }

    #[test]
    fn test_report_line_unreachable() {
        let reasons = vec![
            UnreachableReason::Timeout,
            UnreachableReason::Connect,
            UnreachableReason::Dns,
            UnreachableReason::Tls,
            UnreachableReason::InvalidUrl,
            UnreachableReason::Other("boom".to_string()),
        ];
        for reason in reasons {
            let outcome = ProbeOutcome::Unreachable(reason);
            assert!(!outcome.is_reachable());
            assert_eq!(
                outcome.report_line("http://b.test"),
                "http://b.test might be down!"
            );
        }
    }

    #[test]
    fn test_unreachable_reason_display() {
        assert_eq!(UnreachableReason::Timeout.to_string(), "请求超时");
        assert_eq!(UnreachableReason::Dns.to_string(), "DNS解析失败");
        assert_eq!(
            UnreachableReason::Other("x".to_string()).to_string(),
            "请求失败: x"
        );
    }

    #[test]
    fn test_probe_report_elapsed() {
        let report = ProbeReport::new(
            "http://a.test".to_string(),
            ProbeOutcome::Reachable { status_code: 200 },
            Duration::from_millis(1500),
        );
        assert_eq!(report.elapsed_ms(), 1500);
        assert!(report.checked_at <= Utc::now());
    }

    #[test]
    fn test_probe_report_elapsed_saturates() {
        let report = ProbeReport::new(
            "http://a.test".to_string(),
            ProbeOutcome::Unreachable(UnreachableReason::Timeout),
            Duration::MAX,
        );
        assert_eq!(report.elapsed_ms(), u64::MAX);
    }

    #[test]
    fn test_target_id_display() {
        assert_eq!(TargetId(3).to_string(), "#3");
    }
}
