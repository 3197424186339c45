//! 探测调度器模块
//!
//! 为每个目标启动一次探测，通过共享通道收集完成消息，
//! 每收到一条消息就在固定延迟后为同一目标启动下一次探测，直到收到关闭信号。

use crate::health::checker::HealthChecker;
use crate::health::result::{CheckCompleted, ProbeOutcome, ProbeReport, TargetId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{Id, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// 报告行输出回调类型
pub type ReportSink = Arc<dyn Fn(&str) + Send + Sync>;

/// 默认的报告输出：每行写到标准输出
pub fn stdout_sink() -> ReportSink {
    Arc::new(|line: &str| println!("{line}"))
}

/// 默认的检测间隔
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// 调度器运行参数
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherConfig {
    /// 目标URL列表，按配置顺序
    pub targets: Vec<String>,
    /// 两次探测之间的固定延迟
    pub interval: Duration,
    /// 单次请求超时（可选）
    pub timeout: Option<Duration>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            targets: crate::config::types::default_targets(),
            interval: DEFAULT_INTERVAL,
            timeout: None,
        }
    }
}

/// 单个目标的调度状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// 尚未开始
    Idle,
    /// 探测进行中
    Checking,
    /// 等待下一次探测
    Waiting,
}

impl TargetState {
    /// 判断是否允许转换到 `next`
    ///
    /// 合法的周期为 `Idle -> Checking -> Waiting -> Checking -> ...`
    pub fn can_transition_to(self, next: TargetState) -> bool {
        matches!(
            (self, next),
            (TargetState::Idle, TargetState::Checking)
                | (TargetState::Checking, TargetState::Waiting)
                | (TargetState::Waiting, TargetState::Checking)
        )
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetState::Idle => write!(f, "空闲"),
            TargetState::Checking => write!(f, "探测中"),
            TargetState::Waiting => write!(f, "等待中"),
        }
    }
}

/// 单个目标的运行记录
#[derive(Debug, Clone)]
struct TargetSlot {
    url: String,
    state: TargetState,
    completed_checks: u64,
}

/// 调度器退出时的汇总信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// 每个目标完成的探测次数，按配置顺序
    pub completed_checks: Vec<(String, u64)>,
    /// 每个目标停止时所处的状态，按配置顺序
    pub final_states: Vec<TargetState>,
}

impl DispatchSummary {
    /// 所有目标完成的探测总次数
    pub fn total_checks(&self) -> u64 {
        self.completed_checks.iter().map(|(_, count)| count).sum()
    }

    /// 按URL累加完成次数（重复URL会合并）
    pub fn checks_for(&self, url: &str) -> u64 {
        self.completed_checks
            .iter()
            .filter(|(target, _)| target == url)
            .map(|(_, count)| count)
            .sum()
    }
}

/// 探测任务使用的通道发送端
struct TaskChannels {
    /// 完成消息
    completed: mpsc::UnboundedSender<CheckCompleted>,
    /// 开始探测通知
    started: mpsc::UnboundedSender<TargetId>,
}

/// 探测调度器
pub struct Dispatcher {
    /// 探测器
    checker: Arc<dyn HealthChecker>,
    /// 运行参数
    config: DispatcherConfig,
    /// 报告输出
    sink: ReportSink,
}

impl Dispatcher {
    /// 创建新的调度器
    ///
    /// # 参数
    /// * `checker` - 探测器
    /// * `config` - 运行参数
    ///
    /// # 返回
    /// * `Self` - 调度器实例
    pub fn new(checker: Arc<dyn HealthChecker>, config: DispatcherConfig) -> Self {
        Self {
            checker,
            config,
            sink: stdout_sink(),
        }
    }

    /// 替换报告输出
    pub fn with_sink(mut self, sink: ReportSink) -> Self {
        self.sink = sink;
        self
    }

    /// 获取运行参数
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// 运行调度循环，直到收到关闭信号
    ///
    /// 关闭信号的发送端被丢弃同样视为关闭。返回前会取消并回收所有未完成的任务。
    ///
    /// # 参数
    /// * `shutdown_rx` - 关闭信号接收器
    ///
    /// # 返回
    /// * `DispatchSummary` - 每个目标完成的探测次数
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> DispatchSummary {
        info!(
            "启动探测调度器，目标数量: {}, 检测间隔: {:?}",
            self.config.targets.len(),
            self.config.interval
        );

        let mut slots: Vec<TargetSlot> = self
            .config
            .targets
            .iter()
            .map(|url| TargetSlot {
                url: url.clone(),
                state: TargetState::Idle,
                completed_checks: 0,
            })
            .collect();

        // 每个目标同一时刻最多有一条消息在途，通道容量不会超过目标数量
        let (tx, mut rx) = mpsc::unbounded_channel::<CheckCompleted>();
        // 任务真正开始探测时的通知，与完成消息分开
        let (started_tx, mut started_rx) = mpsc::unbounded_channel::<TargetId>();
        let channels = TaskChannels {
            completed: tx,
            started: started_tx,
        };
        let mut tasks: JoinSet<()> = JoinSet::new();
        let mut owners: HashMap<Id, TargetId> = HashMap::new();

        for (index, slot) in slots.iter().enumerate() {
            let target = TargetId(index);
            let id = self.spawn_check(
                &mut tasks,
                target,
                slot.url.clone(),
                Duration::ZERO,
                &channels,
                &shutdown_rx,
            );
            owners.insert(id, target);
        }

        loop {
            // 同一任务先发开始通知再发完成消息，按顺序轮询保证先处理开始通知
            tokio::select! {
                biased;

                signal = shutdown_rx.recv() => {
                    match signal {
                        Ok(()) => info!("收到关闭信号，停止探测调度器"),
                        Err(e) => warn!("关闭信号通道异常，停止探测调度器: {}", e),
                    }
                    break;
                }
                Some(target) = started_rx.recv() => {
                    if let Some(slot) = slots.get_mut(target.0) {
                        Self::transition(target, slot, TargetState::Checking);
                    }
                }
                Some(completed) = rx.recv() => {
                    let target = completed.target;
                    let Some(slot) = slots.get_mut(target.0) else {
                        warn!("收到未知目标的完成消息: {}", target);
                        continue;
                    };

                    slot.completed_checks += 1;
                    debug!(
                        "目标 {} ({}) 完成第 {} 次探测",
                        target, completed.url, slot.completed_checks
                    );

                    Self::transition(target, slot, TargetState::Waiting);
                    let id = self.spawn_check(
                        &mut tasks,
                        target,
                        completed.url,
                        self.config.interval,
                        &channels,
                        &shutdown_rx,
                    );
                    owners.insert(id, target);
                }
                Some(joined) = tasks.join_next_with_id() => {
                    match joined {
                        Ok((id, ())) => {
                            owners.remove(&id);
                        }
                        Err(e) => {
                            let Some(target) = owners.remove(&e.id()) else {
                                continue;
                            };
                            if e.is_panic() {
                                // 任务崩溃时不会发出完成消息，需要在这里重新调度
                                error!("目标 {} 的探测任务崩溃，重新调度", target);
                                let url = slots[target.0].url.clone();
                                let id = self.spawn_check(
                                    &mut tasks,
                                    target,
                                    url,
                                    self.config.interval,
                                    &channels,
                                    &shutdown_rx,
                                );
                                owners.insert(id, target);
                                Self::transition(
                                    target,
                                    &mut slots[target.0],
                                    TargetState::Waiting,
                                );
                            }
                        }
                    }
                }
            }
        }

        tasks.shutdown().await;

        let final_states = slots.iter().map(|slot| slot.state).collect();
        let summary = DispatchSummary {
            completed_checks: slots
                .into_iter()
                .map(|slot| (slot.url, slot.completed_checks))
                .collect(),
            final_states,
        };
        info!("探测调度器已停止，共完成 {} 次探测", summary.total_checks());
        summary
    }

    /// 启动一个探测任务：先等待 `delay`，再探测一次并上报
    fn spawn_check(
        &self,
        tasks: &mut JoinSet<()>,
        target: TargetId,
        url: String,
        delay: Duration,
        channels: &TaskChannels,
        shutdown_rx: &broadcast::Receiver<()>,
    ) -> Id {
        let checker = Arc::clone(&self.checker);
        let sink = Arc::clone(&self.sink);
        let tx = channels.completed.clone();
        let started_tx = channels.started.clone();
        let mut shutdown_rx = shutdown_rx.resubscribe();

        let handle = tasks.spawn(async move {
            let work = async {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                // 调度器停止后发送失败，忽略即可
                let _ = started_tx.send(target);
                probe_and_report(checker.as_ref(), target, &url, &sink, &tx).await;
            };

            tokio::select! {
                _ = work => {}
                _ = shutdown_rx.recv() => {
                    debug!("取消目标 {} 的探测任务", target);
                }
            }
        });

        handle.id()
    }

    fn transition(target: TargetId, slot: &mut TargetSlot, next: TargetState) {
        if !slot.state.can_transition_to(next) {
            warn!("目标 {} 的非法状态转换: {} -> {}", target, slot.state, next);
            return;
        }
        debug!("目标 {} 状态: {} -> {}", target, slot.state, next);
        slot.state = next;
    }
}

/// 对一个目标执行一次探测，输出报告行并发送完成消息
///
/// 探测错误在这里被完全吸收，不会向调用方传播。
pub async fn probe_and_report(
    checker: &dyn HealthChecker,
    target: TargetId,
    url: &str,
    sink: &ReportSink,
    tx: &mpsc::UnboundedSender<CheckCompleted>,
) -> ProbeOutcome {
    let started = Instant::now();
    let outcome = checker.check(url).await;
    let report = ProbeReport::new(url.to_string(), outcome, started.elapsed());

    debug!(
        "探测完成: {} {:?} 耗时 {}ms 开始于 {}",
        report.url,
        report.outcome,
        report.elapsed_ms(),
        report.checked_at.to_rfc3339()
    );

    sink(&report.outcome.report_line(url));

    if tx
        .send(CheckCompleted {
            target,
            url: url.to_string(),
        })
        .is_err()
    {
        debug!("调度器已停止，丢弃目标 {} 的完成消息", target);
    }

    report.outcome
}

/// 对所有目标并发执行一轮探测，按完成顺序输出
///
/// # 参数
/// * `checker` - 探测器
/// * `targets` - 目标URL列表
/// * `sink` - 报告输出
///
/// # 返回
/// * `usize` - 可达的目标数量
pub async fn check_once(
    checker: Arc<dyn HealthChecker>,
    targets: &[String],
    sink: ReportSink,
) -> usize {
    let (tx, mut rx) = mpsc::unbounded_channel::<CheckCompleted>();
    let mut tasks = JoinSet::new();

    for (index, url) in targets.iter().enumerate() {
        let checker = Arc::clone(&checker);
        let sink = Arc::clone(&sink);
        let tx = tx.clone();
        let url = url.clone();
        tasks.spawn(async move {
            probe_and_report(checker.as_ref(), TargetId(index), &url, &sink, &tx)
                .await
                .is_reachable()
        });
    }
    drop(tx);

    let mut reachable = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(true) => reachable += 1,
            Ok(false) => {}
            Err(e) => error!("探测任务异常退出: {}", e),
        }
    }

    let mut completed = 0;
    while rx.recv().await.is_some() {
        completed += 1;
    }
    debug!("单轮探测完成: {}/{} 个目标可达", reachable, completed);

    reachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StaticChecker;

    #[async_trait]
    impl HealthChecker for StaticChecker {
        async fn check(&self, url: &str) -> ProbeOutcome {
            if url.contains("down") {
                ProbeOutcome::Unreachable(crate::health::UnreachableReason::Connect)
            } else {
                ProbeOutcome::Reachable { status_code: 200 }
            }
        }
    }

    fn collecting_sink() -> (ReportSink, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&lines);
        let sink: ReportSink = Arc::new(move |line: &str| {
            captured.lock().unwrap().push(line.to_string());
        });
        (sink, lines)
    }

    #[tokio::test]
    async fn test_probe_and_report_sends_target_identity() {
        let (sink, lines) = collecting_sink();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome =
            probe_and_report(&StaticChecker, TargetId(4), "http://down.test", &sink, &tx).await;

        assert!(!outcome.is_reachable());
        assert_eq!(
            lines.lock().unwrap().as_slice(),
            ["http://down.test might be down!"]
        );
        let completed = rx.recv().await.unwrap();
        assert_eq!(completed.target, TargetId(4));
        assert_eq!(completed.url, "http://down.test");
    }

    #[tokio::test]
    async fn test_probe_and_report_survives_closed_channel() {
        let (sink, lines) = collecting_sink();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        probe_and_report(&StaticChecker, TargetId(0), "http://a.test", &sink, &tx).await;

        assert_eq!(lines.lock().unwrap().as_slice(), ["http://a.test is up!"]);
    }

    #[tokio::test]
    async fn test_check_once() {
        let (sink, lines) = collecting_sink();
        let targets = vec![
            "http://a.test".to_string(),
            "http://down.test".to_string(),
            "http://a.test".to_string(),
        ];

        let reachable = check_once(Arc::new(StaticChecker), &targets, sink).await;

        assert_eq!(reachable, 2);
        let mut lines = lines.lock().unwrap().clone();
        lines.sort();
        assert_eq!(
            lines,
            vec![
                "http://a.test is up!",
                "http://a.test is up!",
                "http://down.test might be down!",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_target_list_idles_until_shutdown() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let config = DispatcherConfig {
            targets: Vec::new(),
            interval: Duration::from_secs(5),
            timeout: None,
        };
        let dispatcher = Dispatcher::new(Arc::new(StaticChecker), config);
        let handle = tokio::spawn(dispatcher.run(shutdown_rx));

        tokio::time::sleep(Duration::from_secs(60)).await;
        shutdown_tx.send(()).unwrap();

        let summary = handle.await.unwrap();
        assert_eq!(summary.total_checks(), 0);
        assert!(summary.completed_checks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_shutdown_sender_stops_dispatcher() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let config = DispatcherConfig {
            targets: vec!["http://a.test".to_string()],
            interval: Duration::from_secs(5),
            timeout: None,
        };
        let (sink, _lines) = collecting_sink();
        let dispatcher = Dispatcher::new(Arc::new(StaticChecker), config).with_sink(sink);
        let handle = tokio::spawn(dispatcher.run(shutdown_rx));

        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(shutdown_tx);

        let summary = handle.await.unwrap();
        assert_eq!(summary.checks_for("http://a.test"), 1);
    }

    #[test]
    fn test_dispatcher_config_default() {
        let config = DispatcherConfig::default();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(config.timeout.is_none());
        assert_eq!(config.targets.len(), 5);
    }

    #[test]
    fn test_target_state_transitions() {
        use TargetState::*;

        assert!(Idle.can_transition_to(Checking));
        assert!(Checking.can_transition_to(Waiting));
        assert!(Waiting.can_transition_to(Checking));

        assert!(!Idle.can_transition_to(Waiting));
        assert!(!Checking.can_transition_to(Checking));
        assert!(!Waiting.can_transition_to(Waiting));
        assert!(!Waiting.can_transition_to(Idle));
    }

    #[test]
    fn test_target_state_display() {
        assert_eq!(TargetState::Idle.to_string(), "空闲");
        assert_eq!(TargetState::Checking.to_string(), "探测中");
        assert_eq!(TargetState::Waiting.to_string(), "等待中");
    }
}
