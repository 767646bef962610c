use axum::{extract::State, Json};
use queuing_core::{Incident, InvokeIncidentRequest, RpcResponse, SubmitIncidentRequest};
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    routes::{DispatcherState, WorkerState},
};

/// 提交事件，阻塞直到事件被处理、驱逐或拒绝
///
/// 提交在独立任务中执行，客户端断开连接不会中断已开始的准入流程。
pub async fn submit_incident(
    State(state): State<DispatcherState>,
    Json(request): Json<SubmitIncidentRequest>,
) -> ApiResult<Json<RpcResponse>> {
    let incident = Incident::from(request);
    debug!("收到事件提交: {}", incident);

    let submitter = state.submitter.clone();
    tokio::spawn(async move { submitter.submit(incident).await })
        .await
        .map_err(|e| ApiError::Internal(format!("事件提交任务异常退出: {e}")))??;

    Ok(Json(RpcResponse::ok()))
}

/// Worker接收Dispatcher派发的事件
pub async fn process_incident(
    State(state): State<WorkerState>,
    Json(request): Json<InvokeIncidentRequest>,
) -> ApiResult<Json<RpcResponse>> {
    let incident = Incident::from(request);

    let processor = state.processor.clone();
    tokio::spawn(async move { processor.process(incident).await })
        .await
        .map_err(|e| ApiError::Internal(format!("事件处理任务异常退出: {e}")))??;

    Ok(Json(RpcResponse::ok()))
}
