use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use queuing_core::{IncidentProcessor, IncidentSubmitter, WorkerRegistrar};
use queuing_infrastructure::rpc::paths;

use crate::handlers::{
    health::health_check,
    incidents::{process_incident, submit_incident},
    metrics::render_metrics,
    workers::register_worker,
};
use crate::middleware::{request_logging, trace_layer};

/// Dispatcher服务状态
#[derive(Clone)]
pub struct DispatcherState {
    pub submitter: Arc<dyn IncidentSubmitter>,
    pub registrar: Arc<dyn WorkerRegistrar>,
    pub metrics_handle: Option<PrometheusHandle>,
}

/// Worker服务状态
#[derive(Clone)]
pub struct WorkerState {
    pub processor: Arc<dyn IncidentProcessor>,
}

/// 创建Dispatcher路由
pub fn create_dispatcher_routes(state: DispatcherState) -> Router {
    Router::new()
        .route(paths::HEALTH, get(health_check))
        .route(paths::METRICS, get(render_metrics))
        .route(paths::INCIDENTS, post(submit_incident))
        .route(paths::REGISTER_WORKER, post(register_worker))
        .layer(middleware::from_fn(request_logging))
        .layer(trace_layer())
        .with_state(state)
}

/// 创建Worker路由
pub fn create_worker_routes(state: WorkerState) -> Router {
    Router::new()
        .route(paths::HEALTH, get(health_check))
        .route(paths::INCIDENTS, post(process_incident))
        .layer(middleware::from_fn(request_logging))
        .layer(trace_layer())
        .with_state(state)
}
