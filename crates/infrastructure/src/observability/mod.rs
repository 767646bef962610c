//! Observability module
//!
//! - Dispatcher statistics aggregation and `metrics` counters
//! - Prometheus exporter setup
//! - Structured logging helpers

pub mod metrics_collector;
pub mod structured_logger;

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

pub use metrics_collector::{DispatcherMetrics, PriorityStats, StatisticsReport, WorkerStats};
pub use structured_logger::StructuredLogger;

/// 安装全局Prometheus recorder，返回用于渲染 `/metrics` 的句柄
pub fn init_metrics_exporter() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    info!("Prometheus metrics recorder installed");
    Ok(handle)
}
