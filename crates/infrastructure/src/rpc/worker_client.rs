use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use queuing_core::{
    Incident, IncidentInvoker, InvokeIncidentRequest, QueueResult, WorkerConnector, WorkerInfo,
};

use super::{base_url, build_http_client, paths, post_rpc, DEFAULT_REQUEST_TIMEOUT};

/// Dispatcher调用单个Worker的客户端
#[derive(Debug, Clone)]
pub struct HttpWorkerClient {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpWorkerClient {
    pub fn new(address: &str, http_client: reqwest::Client) -> Self {
        Self {
            endpoint: format!("{}{}", base_url(address), paths::INCIDENTS),
            http_client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IncidentInvoker for HttpWorkerClient {
    async fn invoke(&self, incident: &Incident) -> QueueResult<()> {
        let request = InvokeIncidentRequest::from(incident);
        post_rpc(&self.http_client, &self.endpoint, &request).await
    }
}

/// 为注册的Worker创建HTTP客户端，所有Worker共享同一个连接池
#[derive(Debug, Clone)]
pub struct HttpWorkerConnector {
    http_client: reqwest::Client,
}

impl HttpWorkerConnector {
    pub fn new() -> QueueResult<Self> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> QueueResult<Self> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl WorkerConnector for HttpWorkerConnector {
    async fn connect(&self, worker: &WorkerInfo) -> QueueResult<Arc<dyn IncidentInvoker>> {
        Ok(Arc::new(HttpWorkerClient::new(
            &worker.address,
            self.http_client.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use axum::{routing::post, Json, Router};
    use chrono::Utc;

    use super::*;
    use crate::rpc::test_server;
    use queuing_core::{QueueError, RpcResponse};

    async fn echo_priority(Json(req): Json<InvokeIncidentRequest>) -> Json<RpcResponse> {
        if req.priority >= 10 {
            Json(RpcResponse::failed(format!("priority {} not supported", req.priority)))
        } else {
            Json(RpcResponse::ok())
        }
    }

    async fn worker_at(address: String) -> Arc<dyn IncidentInvoker> {
        let connector = HttpWorkerConnector::new().unwrap();
        connector
            .connect(&WorkerInfo { id: 1, address })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_invoke_success_and_explicit_failure() {
        let router = Router::new().route(paths::INCIDENTS, post(echo_priority));
        let addr = test_server::spawn(router).await;
        let worker = worker_at(addr.to_string()).await;

        let ok = Incident::new(1, Utc::now(), 3);
        assert!(worker.invoke(&ok).await.is_ok());

        let rejected = Incident::new(2, Utc::now(), 10);
        assert_eq!(
            worker.invoke(&rejected).await,
            Err(QueueError::remote("priority 10 not supported"))
        );
    }

    #[tokio::test]
    async fn test_invoke_http_error_is_remote_failure() {
        let router = Router::new().route(
            paths::INCIDENTS,
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let addr = test_server::spawn(router).await;
        let worker = worker_at(addr.to_string()).await;

        let result = worker.invoke(&Incident::new(1, Utc::now(), 1)).await;
        assert!(matches!(result, Err(QueueError::RemoteInvocation(msg)) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_invoke_unreachable_worker_is_network_error() {
        let addr = test_server::closed_port().await;
        let worker = worker_at(addr.to_string()).await;

        let result = worker.invoke(&Incident::new(1, Utc::now(), 1)).await;
        assert!(matches!(result, Err(QueueError::Network(_))));
    }

    #[test]
    fn test_endpoint_from_address() {
        let client = HttpWorkerClient::new("127.0.0.1:9001", reqwest::Client::new());
        assert_eq!(client.endpoint(), "http://127.0.0.1:9001/api/v1/incidents");
    }
}
