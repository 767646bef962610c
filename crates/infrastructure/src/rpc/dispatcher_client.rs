use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use queuing_core::{
    ClientConfig, Incident, IncidentSubmitter, QueueResult, RegisterWorkerRequest,
    SubmitIncidentRequest, WorkerInfo, WorkerRegistrar,
};

use super::{base_url, build_http_client, paths, post_rpc, DEFAULT_REQUEST_TIMEOUT};

/// Producer与Worker访问Dispatcher的客户端
#[derive(Debug, Clone)]
pub struct DispatcherClient {
    dispatcher_url: String,
    http_client: reqwest::Client,
}

impl DispatcherClient {
    pub fn new(config: &ClientConfig) -> QueueResult<Self> {
        Self::with_timeout(config, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(config: &ClientConfig, timeout: Duration) -> QueueResult<Self> {
        Ok(Self {
            dispatcher_url: base_url(&config.host),
            http_client: build_http_client(timeout)?,
        })
    }

    pub fn dispatcher_url(&self) -> &str {
        &self.dispatcher_url
    }

    pub async fn send_incident(&self, incident: &Incident) -> QueueResult<()> {
        let url = format!("{}{}", self.dispatcher_url, paths::INCIDENTS);
        debug!("发送事件 {} 到 {}", incident, url);
        post_rpc(&self.http_client, &url, &SubmitIncidentRequest::from(incident)).await
    }

    pub async fn register_worker(&self, worker: &WorkerInfo) -> QueueResult<()> {
        let url = format!("{}{}", self.dispatcher_url, paths::REGISTER_WORKER);
        let request = RegisterWorkerRequest {
            id: worker.id,
            address: worker.address.clone(),
        };
        post_rpc(&self.http_client, &url, &request).await
    }
}

#[async_trait]
impl IncidentSubmitter for DispatcherClient {
    async fn submit(&self, incident: Incident) -> QueueResult<()> {
        self.send_incident(&incident).await
    }
}

#[async_trait]
impl WorkerRegistrar for DispatcherClient {
    async fn register(&self, worker: WorkerInfo) -> QueueResult<()> {
        self.register_worker(&worker).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, routing::post, Json, Router};
    use chrono::Utc;

    use super::*;
    use crate::rpc::test_server;
    use queuing_core::{QueueError, RpcResponse};

    #[derive(Clone, Default)]
    struct Recorded {
        incidents: Arc<Mutex<Vec<SubmitIncidentRequest>>>,
        workers: Arc<Mutex<Vec<RegisterWorkerRequest>>>,
    }

    async fn submit_handler(
        State(recorded): State<Recorded>,
        Json(req): Json<SubmitIncidentRequest>,
    ) -> Json<RpcResponse> {
        let evicted = req.priority == 0;
        recorded.incidents.lock().unwrap().push(req);
        if evicted {
            Json(RpcResponse::failed("事件被其他事件驱逐"))
        } else {
            Json(RpcResponse::ok())
        }
    }

    async fn register_handler(
        State(recorded): State<Recorded>,
        Json(req): Json<RegisterWorkerRequest>,
    ) -> Json<RpcResponse> {
        recorded.workers.lock().unwrap().push(req);
        Json(RpcResponse::ok())
    }

    async fn dispatcher() -> (DispatcherClient, Recorded) {
        let recorded = Recorded::default();
        let router = Router::new()
            .route(paths::INCIDENTS, post(submit_handler))
            .route(paths::REGISTER_WORKER, post(register_handler))
            .with_state(recorded.clone());
        let addr = test_server::spawn(router).await;

        let config = ClientConfig {
            host: addr.to_string(),
        };
        (DispatcherClient::new(&config).unwrap(), recorded)
    }

    #[tokio::test]
    async fn test_submit_incident() {
        let (client, recorded) = dispatcher().await;
        let incident = Incident::new(11, Utc::now(), 4);

        client.submit(incident.clone()).await.unwrap();

        let sent = recorded.incidents.lock().unwrap().clone();
        assert_eq!(sent, vec![SubmitIncidentRequest::from(&incident)]);
    }

    #[tokio::test]
    async fn test_submit_failure_carries_message() {
        let (client, _) = dispatcher().await;
        let result = client.submit(Incident::new(1, Utc::now(), 0)).await;
        assert_eq!(result, Err(QueueError::remote("事件被其他事件驱逐")));
    }

    #[tokio::test]
    async fn test_register_worker() {
        let (client, recorded) = dispatcher().await;
        let worker = WorkerInfo {
            id: 2,
            address: "127.0.0.1:9002".to_string(),
        };

        client.register(worker).await.unwrap();

        let workers = recorded.workers.lock().unwrap().clone();
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].id, 2);
        assert_eq!(workers[0].address, "127.0.0.1:9002");
    }

    #[tokio::test]
    async fn test_unreachable_dispatcher() {
        let addr = test_server::closed_port().await;
        let client = DispatcherClient::new(&ClientConfig {
            host: addr.to_string(),
        })
        .unwrap();

        let result = client.submit(Incident::new(1, Utc::now(), 1)).await;
        assert!(matches!(result, Err(QueueError::Network(_))));
    }
}
