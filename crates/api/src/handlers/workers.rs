use axum::{extract::State, Json};
use queuing_core::{RegisterWorkerRequest, RpcResponse, WorkerInfo};
use tracing::debug;

use crate::{error::ApiResult, routes::DispatcherState};

/// 注册Worker
pub async fn register_worker(
    State(state): State<DispatcherState>,
    Json(request): Json<RegisterWorkerRequest>,
) -> ApiResult<Json<RpcResponse>> {
    debug!("收到Worker注册请求: id={}, address={}", request.id, request.address);

    let worker = WorkerInfo {
        id: request.id,
        address: request.address,
    };
    state.registrar.register(worker).await?;
    Ok(Json(RpcResponse::ok()))
}
