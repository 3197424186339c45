//! 探测结果处理基准测试
//!
//! 测试报告行生成和配置解析的开销

use criterion::{criterion_group, criterion_main, Criterion};
use link_vitals::config::Config;
use link_vitals::health::{ProbeOutcome, ProbeReport, UnreachableReason};
use std::hint::black_box;
use std::time::Duration;

/// 报告行生成基准测试
fn report_line_benchmark(c: &mut Criterion) {
    let up = ProbeOutcome::Reachable { status_code: 200 };
    let down = ProbeOutcome::Unreachable(UnreachableReason::Connect);

    c.bench_function("report_line_up", |b| {
        b.iter(|| black_box(up.report_line(black_box("http://stackoverflow.com"))));
    });

    c.bench_function("report_line_down", |b| {
        b.iter(|| black_box(down.report_line(black_box("http://stackoverflow.com"))));
    });

    c.bench_function("probe_report_creation", |b| {
        b.iter(|| {
            let report = ProbeReport::new(
                "http://golang.com".to_string(),
                up.clone(),
                Duration::from_millis(150),
            );
            black_box(report)
        });
    });
}

/// 配置解析基准测试
fn config_parsing_benchmark(c: &mut Criterion) {
    let content = toml::to_string(&Config::default()).unwrap();

    c.bench_function("config_parse_default", |b| {
        b.iter(|| {
            let config: Config = toml::from_str(black_box(&content)).unwrap();
            black_box(config.dispatcher_config())
        });
    });
}

criterion_group!(benches, report_line_benchmark, config_parsing_benchmark);
criterion_main!(benches);
