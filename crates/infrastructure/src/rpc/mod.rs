//! HTTP/JSON RPC clients
//!
//! Every endpoint answers with [`RpcResponse`]; `success=false` and non-2xx
//! statuses are mapped to [`QueueError::RemoteInvocation`], transport
//! failures to [`QueueError::Network`].

pub mod dispatcher_client;
pub mod worker_client;

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use queuing_core::{QueueError, QueueResult, RpcResponse};

pub use dispatcher_client::DispatcherClient;
pub use worker_client::{HttpWorkerClient, HttpWorkerConnector};

/// API paths shared by the servers in `queuing-api` and the clients here
pub mod paths {
    pub const INCIDENTS: &str = "/api/v1/incidents";
    pub const REGISTER_WORKER: &str = "/api/v1/workers/register";
    pub const HEALTH: &str = "/health";
    pub const METRICS: &str = "/metrics";
}

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// `host:port` 或完整URL转换为不带结尾斜杠的base URL
pub fn base_url(address: &str) -> String {
    if address.contains("://") {
        address.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", address.trim_end_matches('/'))
    }
}

pub(crate) fn build_http_client(timeout: Duration) -> QueueResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| QueueError::Network(format!("创建HTTP客户端失败: {e}")))
}

pub(crate) async fn post_rpc<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    body: &T,
) -> QueueResult<()> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| QueueError::Network(format!("请求 {url} 失败: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!("RPC {} 返回 HTTP {}: {}", url, status, body);
        return Err(QueueError::remote(format!("HTTP {status} - {body}")));
    }

    let reply: RpcResponse = response
        .json()
        .await
        .map_err(|e| QueueError::Serialization(format!("无法解析 {url} 的响应: {e}")))?;

    if reply.success {
        Ok(())
    } else {
        Err(QueueError::remote(reply.message))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("localhost:8080"), "http://localhost:8080");
        assert_eq!(base_url("http://10.0.0.2:9000/"), "http://10.0.0.2:9000");
        assert_eq!(base_url("https://dispatcher:443"), "https://dispatcher:443");
    }
}
