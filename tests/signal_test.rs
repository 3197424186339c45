//! 信号处理测试
//!
//! 单独的测试进程，向自身发送 SIGTERM 验证调度器能正常停止

#![cfg(unix)]

use async_trait::async_trait;
use link_vitals::health::{Dispatcher, DispatcherConfig, HealthChecker, ProbeOutcome};
use link_vitals::signal::setup_signal_handlers;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

struct AlwaysUp;

#[async_trait]
impl HealthChecker for AlwaysUp {
    async fn check(&self, _url: &str) -> ProbeOutcome {
        ProbeOutcome::Reachable { status_code: 200 }
    }
}

#[tokio::test]
async fn test_sigterm_stops_dispatcher() {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    setup_signal_handlers(shutdown_tx.clone()).await.unwrap();

    let config = DispatcherConfig {
        targets: vec!["http://a.test".to_string()],
        interval: Duration::from_millis(50),
        timeout: None,
    };
    let sink: link_vitals::health::ReportSink = Arc::new(|_line: &str| {});
    let dispatcher = Dispatcher::new(Arc::new(AlwaysUp), config).with_sink(sink);
    let handle = tokio::spawn(dispatcher.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(200)).await;
    signal_hook::low_level::raise(signal_hook::consts::SIGTERM).unwrap();

    let summary = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("dispatcher did not stop after SIGTERM")
        .unwrap();
    assert!(summary.total_checks() >= 1);
}
