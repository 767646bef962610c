use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use queuing_core::config::ValidationUtils;
use queuing_core::{MetricsSink, QueueResult, WorkerConnector, WorkerInfo, WorkerRegistrar};

use crate::worker_directory::{WorkerDirectory, WorkerHandle};

/// Worker注册服务
///
/// 为新Worker建立调用能力后加入目录，目录会唤醒Worker供给循环。
pub struct RegistrationService {
    directory: Arc<WorkerDirectory>,
    connector: Arc<dyn WorkerConnector>,
    metrics: Arc<dyn MetricsSink>,
}

impl RegistrationService {
    pub fn new(
        directory: Arc<WorkerDirectory>,
        connector: Arc<dyn WorkerConnector>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            directory,
            connector,
            metrics,
        }
    }
}

#[async_trait]
impl WorkerRegistrar for RegistrationService {
    async fn register(&self, worker: WorkerInfo) -> QueueResult<()> {
        ValidationUtils::validate_host_port(&worker.address, "address")?;

        let invoker = self.connector.connect(&worker).await?;
        if let Err(e) = self
            .directory
            .add(WorkerHandle::new(worker.clone(), invoker))
            .await
        {
            warn!("Worker注册失败 {}: {}", worker, e);
            return Err(e);
        }

        self.metrics.worker_registered(&worker).await;
        info!("新Worker已注册: {}", worker);
        Ok(())
    }
}
