use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::routes::DispatcherState;

/// Prometheus文本格式的指标，未安装导出器时返回404
pub async fn render_metrics(State(state): State<DispatcherState>) -> impl IntoResponse {
    match state.metrics_handle {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics exporter not installed".to_string()),
    }
}
