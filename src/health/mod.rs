//! 可达性探测模块
//!
//! 提供HTTP探测、结果分类和调度功能

pub mod checker;
pub mod result;
pub mod scheduler;

// 重新导出主要类型
pub use checker::{HealthChecker, HttpProber};
pub use result::{CheckCompleted, ProbeOutcome, ProbeReport, TargetId, UnreachableReason};
pub use scheduler::{
    check_once, probe_and_report, stdout_sink, DispatchSummary, Dispatcher, DispatcherConfig,
    ReportSink, TargetState,
};
