//! # Queuing API
//!
//! HTTP/JSON服务端，基于Axum构建：
//! - Dispatcher：事件提交、Worker注册、健康检查、Prometheus指标
//! - Worker：接收Dispatcher派发的事件
//!
//! 所有RPC接口都返回 [`queuing_core::RpcResponse`]。领域错误（驱逐、拒绝、
//! 远程失败）以 `200 {"success": false}` 返回，只有请求格式错误或服务内部
//! 故障才使用非2xx状态码。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::{create_dispatcher_routes, create_worker_routes, DispatcherState, WorkerState};
