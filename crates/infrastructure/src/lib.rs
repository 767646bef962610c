//! 基础设施层
//!
//! - [`rpc`]：基于HTTP/JSON的Dispatcher与Worker客户端
//! - [`observability`]：指标统计、Prometheus导出和结构化日志

pub mod observability;
pub mod rpc;

pub use observability::{init_metrics_exporter, DispatcherMetrics, StructuredLogger};
pub use rpc::{DispatcherClient, HttpWorkerClient, HttpWorkerConnector};
