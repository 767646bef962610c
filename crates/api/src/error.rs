use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use queuing_core::{QueueError, RpcResponse};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Queue(err) => (StatusCode::OK, Json(RpcResponse::failed(err.to_string())))
                .into_response(),
            ApiError::Internal(msg) => {
                error!("API内部错误: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(RpcResponse::failed(msg)),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let domain = ApiError::from(QueueError::BufferFull).into_response();
        assert_eq!(domain.status(), StatusCode::OK);

        let internal = ApiError::Internal("task panicked".to_string()).into_response();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
